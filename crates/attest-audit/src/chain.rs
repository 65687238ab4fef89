//! Hash-chain primitives: hashing and chain integrity verification.
//!
//! Every field that contributes to an event's hash is listed explicitly so
//! nothing is accidentally omitted.
//!
//! Hash input layout (bytes, in order):
//!   1. sequence as 8-byte little-endian
//!   2. prev_hash as UTF-8 bytes (64 ASCII hex chars)
//!   3. canonical JSON of the event body (every field except the two hashes)

use chrono::{DateTime, Utc};
use serde::Serialize;
use sha2::{Digest, Sha256};

use attest_contracts::{
    audit::{ActorType, AuditEvent, AuditEventId, AuditMetadata, TargetType},
    error::{AttestError, AttestResult},
};

use crate::event::GENESIS_HASH;

/// The hashed portion of an `AuditEvent`.
#[derive(Serialize)]
struct EventBody<'a> {
    id: &'a AuditEventId,
    actor_type: &'a ActorType,
    actor_id: &'a Option<String>,
    action: &'a str,
    target_type: &'a TargetType,
    target_id: &'a str,
    metadata: &'a Option<AuditMetadata>,
    occurred_at: &'a DateTime<Utc>,
}

impl<'a> From<&'a AuditEvent> for EventBody<'a> {
    fn from(event: &'a AuditEvent) -> Self {
        Self {
            id: &event.id,
            actor_type: &event.actor_type,
            actor_id: &event.actor_id,
            action: &event.action,
            target_type: &event.target_type,
            target_id: &event.target_id,
            metadata: &event.metadata,
            occurred_at: &event.occurred_at,
        }
    }
}

/// Compute the SHA-256 hash for a single audit event.
///
/// Commits to the event's position (`sequence`), its link to the previous
/// event (`prev_hash`), and its full body. The event's own `prev_hash` and
/// `this_hash` fields are ignored; `prev_hash` is passed explicitly.
///
/// Returns a lowercase 64-character hex string.
pub fn hash_event(event: &AuditEvent, prev_hash: &str) -> AttestResult<String> {
    let body_json = serde_json::to_vec(&EventBody::from(event)).map_err(|e| {
        AttestError::IntegrityViolation {
            reason: format!("audit event {} body not serializable: {e}", event.id),
        }
    })?;

    let mut hasher = Sha256::new();
    hasher.update(event.sequence.to_le_bytes());
    hasher.update(prev_hash.as_bytes());
    hasher.update(&body_json);

    Ok(hex::encode(hasher.finalize()))
}

/// Verify the integrity of a hash chain given in append order.
///
/// Valid when every event:
///
/// 1. sits at `sequence == position`,
/// 2. has `prev_hash` equal to the previous `this_hash` (or `GENESIS_HASH`),
/// 3. has `this_hash` equal to the hash recomputed from its fields.
///
/// An empty chain is valid. An event whose body cannot be hashed makes the
/// chain invalid.
pub fn verify_chain(events: &[AuditEvent]) -> bool {
    let mut expected_prev = GENESIS_HASH.to_string();

    for (position, event) in events.iter().enumerate() {
        if event.sequence != position as u64 || event.prev_hash != expected_prev {
            return false;
        }
        match hash_event(event, &event.prev_hash) {
            Ok(recomputed) if recomputed == event.this_hash => {}
            _ => return false,
        }
        expected_prev = event.this_hash.clone();
    }

    true
}
