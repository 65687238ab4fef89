//! Seam traits for the ATTEST pipeline.
//!
//! Trusted components the core owns an interface for:
//!
//! - `AuditTrail`      : append-only sink for every state-changing operation
//! - `IntegrityChecker`: deterministic content digests for evidence bytes
//! - `CausalVerifier`  : frame delta and pass/fail decision
//!
//! External collaborators the core consumes but never implements:
//!
//! - `CaptureSource`: returns the exact frame on screen at call time
//! - `InputDriver`  : performs one OS input event, acknowledgement only
//! - `ObjectStore`  : stores evidence bytes behind an opaque location

use attest_contracts::{
    audit::{AuditEvent, NewAuditEvent},
    error::AttestResult,
    evidence::ActionParameters,
    frame::Frame,
    verify::Decision,
};

/// The immutable record of every mutation in the system.
///
/// Append-only: no update or delete method exists.
pub trait AuditTrail: Send + Sync {
    /// Append one event. Fails only with `TransportFailure` when the
    /// underlying store is unavailable.
    fn record(&self, event: NewAuditEvent) -> AttestResult<AuditEvent>;

    /// All events, most recent first. No filtering.
    fn list(&self) -> AttestResult<Vec<AuditEvent>>;
}

/// Computes the checksum stored with every observation and artifact.
///
/// Identical input bytes must produce identical output across calls and
/// process restarts.
pub trait IntegrityChecker: Send + Sync {
    fn hash(&self, bytes: &[u8]) -> String;
}

/// Decides whether two frames prove a causal effect.
pub trait CausalVerifier: Send + Sync {
    /// Number of changed pixels between `before` and `after`.
    ///
    /// Returns `DimensionMismatch`, never a count, when the frames are not
    /// comparable.
    fn compute_delta(&self, before: &Frame, after: &Frame) -> AttestResult<u64>;

    fn decide(&self, delta_count: u64) -> Decision;
}

/// Screen-capture collaborator.
pub trait CaptureSource: Send + Sync {
    fn capture_frame(&self) -> AttestResult<Frame>;
}

/// OS-input collaborator. The core never retries a performed action.
pub trait InputDriver: Send + Sync {
    fn perform(&self, action: &ActionParameters) -> AttestResult<()>;
}

/// Object-storage collaborator. Locations are opaque to the core.
pub trait ObjectStore: Send + Sync {
    /// Store `bytes` under a caller-chosen `key` and return its location.
    fn put(&self, key: &str, bytes: &[u8]) -> AttestResult<String>;

    /// Fetch the bytes previously stored at `storage_uri`.
    fn get(&self, storage_uri: &str) -> AttestResult<Vec<u8>>;
}
