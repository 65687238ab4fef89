//! Exported audit log type and chain constants.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use attest_contracts::audit::AuditEvent;

/// The sentinel `prev_hash` used for the first event in every chain.
///
/// 64 hex zeros, a value no real SHA-256 output is expected to take.
pub const GENESIS_HASH: &str = "0000000000000000000000000000000000000000000000000000000000000000";

/// A point-in-time export of the whole trail in chain order.
///
/// `terminal_hash` is the `this_hash` of the last event and commits to every
/// event before it.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuditLog {
    /// All events in append order (sequence 0 first).
    pub events: Vec<AuditEvent>,

    pub exported_at: DateTime<Utc>,

    /// Empty string if the log is empty.
    pub terminal_hash: String,
}
