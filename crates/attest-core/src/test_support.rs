//! Mocks shared by the unit tests of this crate.

use std::sync::{
    atomic::{AtomicBool, Ordering},
    Arc, Mutex,
};

use chrono::Utc;

use attest_contracts::{
    audit::{AuditEvent, AuditEventId, NewAuditEvent},
    error::{AttestError, AttestResult},
};

use crate::{
    evidence::EvidenceStore, ledger::ExecutionLedger, registry::ExecutionRegistry,
    traits::{AuditTrail, IntegrityChecker},
};

/// An audit trail that keeps events in a `Vec` and can be switched offline.
#[derive(Default)]
pub struct RecordingAudit {
    pub events: Arc<Mutex<Vec<AuditEvent>>>,
    pub offline: AtomicBool,
}

impl RecordingAudit {
    pub fn actions(&self) -> Vec<String> {
        self.events.lock().unwrap().iter().map(|e| e.action.clone()).collect()
    }

    pub fn go_offline(&self) {
        self.offline.store(true, Ordering::SeqCst);
    }
}

impl AuditTrail for RecordingAudit {
    fn record(&self, event: NewAuditEvent) -> AttestResult<AuditEvent> {
        if self.offline.load(Ordering::SeqCst) {
            return Err(AttestError::TransportFailure {
                step: "audit".to_string(),
                reason: "sink offline".to_string(),
            });
        }
        let mut events = self.events.lock().unwrap();
        let stored = AuditEvent {
            id: AuditEventId::new(),
            sequence: events.len() as u64,
            actor_type: event.actor.actor_type,
            actor_id: event.actor.actor_id,
            action: event.action,
            target_type: event.target_type,
            target_id: event.target_id,
            metadata: event.metadata,
            occurred_at: Utc::now(),
            prev_hash: String::new(),
            this_hash: String::new(),
        };
        events.push(stored.clone());
        Ok(stored)
    }

    fn list(&self) -> AttestResult<Vec<AuditEvent>> {
        let mut events = self.events.lock().unwrap().clone();
        events.reverse();
        Ok(events)
    }
}

/// Deterministic, well-formed 64-hex digest that is not cryptographic.
pub struct StubChecker;

impl IntegrityChecker for StubChecker {
    fn hash(&self, bytes: &[u8]) -> String {
        let folded = bytes
            .iter()
            .fold(0xcbf2_9ce4_8422_2325_u64, |acc, b| {
                (acc ^ u64::from(*b)).wrapping_mul(0x0100_0000_01b3)
            });
        format!("{:064x}", (u128::from(folded) << 8) | (bytes.len() as u128 & 0xff))
    }
}

pub fn digest(seed: u8) -> String {
    StubChecker.hash(&[seed])
}

pub struct Harness {
    pub audit: Arc<RecordingAudit>,
    pub ledger: Arc<ExecutionLedger>,
    pub evidence: Arc<EvidenceStore>,
}

pub fn harness() -> Harness {
    let registry = Arc::new(ExecutionRegistry::new());
    let audit = Arc::new(RecordingAudit::default());
    let ledger = Arc::new(ExecutionLedger::new(registry.clone(), audit.clone()));
    let evidence = Arc::new(EvidenceStore::new(registry, audit.clone()));
    Harness {
        audit,
        ledger,
        evidence,
    }
}
