//! In-memory implementation of `AuditTrail`.
//!
//! `InMemoryAuditTrail` keeps all events in a `Vec` behind a `Mutex`, so the
//! ledger and evidence store can share one trail across threads. Events are
//! hash-chained on append; `verify_integrity()` recomputes the chain.

use std::sync::Mutex;

use chrono::Utc;
use tracing::{debug, info};

use attest_contracts::{
    audit::{AuditEvent, AuditEventId, NewAuditEvent},
    error::{AttestError, AttestResult},
};
use attest_core::traits::AuditTrail;

use crate::{
    chain::{hash_event, verify_chain},
    event::{AuditLog, GENESIS_HASH},
};

// ── Internal mutable state ────────────────────────────────────────────────────

pub(crate) struct InMemoryState {
    /// All events written so far, in append order.
    pub(crate) events: Vec<AuditEvent>,

    /// The `this_hash` of the last event, or `GENESIS_HASH` before any write.
    pub(crate) last_hash: String,
}

// ── Public trail ──────────────────────────────────────────────────────────────

/// An in-memory, append-only audit trail backed by a SHA-256 hash chain.
pub struct InMemoryAuditTrail {
    pub(crate) state: Mutex<InMemoryState>,
}

fn unavailable(e: impl std::fmt::Display) -> AttestError {
    AttestError::TransportFailure {
        step: "audit".to_string(),
        reason: format!("audit state lock poisoned: {}", e),
    }
}

impl InMemoryAuditTrail {
    pub fn new() -> Self {
        Self {
            state: Mutex::new(InMemoryState {
                events: Vec::new(),
                last_hash: GENESIS_HASH.to_string(),
            }),
        }
    }

    /// Number of events appended so far.
    pub fn len(&self) -> AttestResult<usize> {
        Ok(self.state.lock().map_err(unavailable)?.events.len())
    }

    pub fn is_empty(&self) -> AttestResult<bool> {
        Ok(self.len()? == 0)
    }

    /// Export every event in chain order with the current terminal hash.
    pub fn export_log(&self) -> AttestResult<AuditLog> {
        let state = self.state.lock().map_err(unavailable)?;
        let terminal_hash = state
            .events
            .last()
            .map(|e| e.this_hash.clone())
            .unwrap_or_default();

        Ok(AuditLog {
            events: state.events.clone(),
            exported_at: Utc::now(),
            terminal_hash,
        })
    }

    /// Verify that the in-memory chain has not been tampered with.
    pub fn verify_integrity(&self) -> AttestResult<bool> {
        let state = self.state.lock().map_err(unavailable)?;
        let valid = verify_chain(&state.events);
        info!(
            event_count = state.events.len(),
            terminal_hash = %state.last_hash,
            valid,
            "audit chain verified"
        );
        Ok(valid)
    }
}

impl Default for InMemoryAuditTrail {
    fn default() -> Self {
        Self::new()
    }
}

// ── AuditTrail impl ───────────────────────────────────────────────────────────

impl AuditTrail for InMemoryAuditTrail {
    /// Append one event to the hash chain.
    ///
    /// Assigns id, sequence, and timestamp, links the event to the previous
    /// `this_hash`, and advances the chain head.
    fn record(&self, event: NewAuditEvent) -> AttestResult<AuditEvent> {
        let mut state = self.state.lock().map_err(unavailable)?;

        let prev_hash = state.last_hash.clone();
        let mut stored = AuditEvent {
            id: AuditEventId::new(),
            sequence: state.events.len() as u64,
            actor_type: event.actor.actor_type,
            actor_id: event.actor.actor_id,
            action: event.action,
            target_type: event.target_type,
            target_id: event.target_id,
            metadata: event.metadata,
            occurred_at: Utc::now(),
            prev_hash,
            this_hash: String::new(),
        };
        stored.this_hash = hash_event(&stored, &stored.prev_hash)?;

        debug!(
            sequence = stored.sequence,
            action = %stored.action,
            target_type = %stored.target_type,
            target_id = %stored.target_id,
            "audit event appended"
        );

        state.last_hash = stored.this_hash.clone();
        state.events.push(stored.clone());
        Ok(stored)
    }

    /// All events, most recent first; ties on `occurred_at` break by
    /// descending sequence.
    fn list(&self) -> AttestResult<Vec<AuditEvent>> {
        let state = self.state.lock().map_err(unavailable)?;
        let mut events = state.events.clone();
        events.sort_by(|a, b| {
            b.occurred_at
                .cmp(&a.occurred_at)
                .then(b.sequence.cmp(&a.sequence))
        });
        Ok(events)
    }
}
