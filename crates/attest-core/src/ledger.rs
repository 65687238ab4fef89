//! The execution ledger: owner of the execution state machine.
//!
//! ```text
//!   Started ──complete(true)──▶ Completed
//!      │
//!      └────complete(false)───▶ Failed
//! ```
//!
//! Both terminal states have no outgoing transitions. Every seal is a
//! compare-and-set performed under the execution's own lock, and the audit
//! entry for a transition is written inside that same critical section,
//! before the new state becomes visible. If the audit write fails, the
//! transition does not happen.

use std::sync::Arc;

use chrono::{DateTime, Duration, Utc};
use tracing::{debug, info, warn};

use attest_contracts::{
    audit::{actions, Actor, AuditMetadata, NewAuditEvent, TargetType},
    error::{AttestError, AttestResult},
    execution::{Execution, ExecutionId, ExecutionStatus},
};

use crate::{
    registry::{ExecutionEntry, ExecutionRegistry},
    traits::AuditTrail,
};

pub struct ExecutionLedger {
    registry: Arc<ExecutionRegistry>,
    audit: Arc<dyn AuditTrail>,
}

impl ExecutionLedger {
    pub fn new(registry: Arc<ExecutionRegistry>, audit: Arc<dyn AuditTrail>) -> Self {
        Self { registry, audit }
    }

    /// Open a new execution in `Started`.
    ///
    /// Fails only if the audit trail is unavailable, in which case nothing is
    /// persisted.
    pub fn start(&self, actor: &Actor, environment: Option<String>) -> AttestResult<Execution> {
        let execution = Execution::started(environment, Utc::now());

        self.audit.record(
            NewAuditEvent::new(
                actor,
                actions::EXECUTION_STARTED,
                TargetType::Execution,
                execution.id,
            )
            .with_metadata(AuditMetadata::ExecutionStarted {
                environment: execution.environment.clone(),
            }),
        )?;
        self.registry.insert(ExecutionEntry::new(execution.clone()))?;

        info!(
            execution_id = %execution.id,
            environment = ?execution.environment,
            "execution started"
        );
        Ok(execution)
    }

    /// Seal an execution as `Completed` (`success`) or `Failed`.
    ///
    /// Returns `NotFound` for an unknown id and `InvalidStateTransition` if
    /// the execution is already terminal; in the latter case the stored
    /// record is left exactly as it was.
    pub fn complete(
        &self,
        actor: &Actor,
        id: ExecutionId,
        success: bool,
    ) -> AttestResult<Execution> {
        let (target, tag) = if success {
            (ExecutionStatus::Completed, actions::EXECUTION_COMPLETED)
        } else {
            (ExecutionStatus::Failed, actions::EXECUTION_FAILED)
        };

        self.registry.with_entry(id, |entry| {
            self.seal(entry, actor, target, tag, AuditMetadata::ExecutionSealed { status: target })
        })
    }

    /// Read one execution.
    pub fn get(&self, id: ExecutionId) -> AttestResult<Execution> {
        self.registry
            .read(id, |entry| entry.execution.clone())?
            .ok_or_else(|| AttestError::execution_not_found(id))
    }

    /// All executions, oldest first.
    pub fn list(&self) -> AttestResult<Vec<Execution>> {
        let mut executions = Vec::new();
        for id in self.registry.ids()? {
            if let Some(execution) = self.registry.read(id, |entry| entry.execution.clone())? {
                executions.push(execution);
            }
        }
        executions.sort_by_key(|e| e.started_at);
        Ok(executions)
    }

    /// Seal as `Failed` every execution still `Started` after `max_age`.
    ///
    /// Uses the same compare-and-set as `complete`, so an execution sealed
    /// concurrently by its owner is simply skipped. Returns the executions
    /// this sweep sealed.
    pub fn sweep_stale(&self, max_age: Duration) -> AttestResult<Vec<Execution>> {
        let now = Utc::now();
        let actor = Actor::system();
        let mut swept = Vec::new();

        for id in self.registry.ids()? {
            let result = self.registry.with_entry(id, |entry| {
                let age = now - entry.execution.started_at;
                if entry.execution.status.is_terminal() || age <= max_age {
                    return Ok(None);
                }
                self.seal(
                    entry,
                    &actor,
                    ExecutionStatus::Failed,
                    actions::EXECUTION_SWEPT,
                    AuditMetadata::StaleSwept {
                        age_secs: age.num_seconds(),
                    },
                )
                .map(Some)
            });

            match result {
                Ok(Some(execution)) => swept.push(execution),
                Ok(None) => {}
                Err(err @ AttestError::TransportFailure { .. }) => return Err(err),
                Err(err) => warn!(execution_id = %id, error = %err, "stale sweep skipped execution"),
            }
        }

        if !swept.is_empty() {
            info!(count = swept.len(), "stale executions sealed as failed");
        }
        Ok(swept)
    }

    /// Compare-and-set `Started → target`, audited in the same unit of work.
    fn seal(
        &self,
        entry: &mut ExecutionEntry,
        actor: &Actor,
        target: ExecutionStatus,
        tag: &str,
        metadata: AuditMetadata,
    ) -> AttestResult<Execution> {
        let current = entry.execution.status;
        if current != ExecutionStatus::Started {
            warn!(
                execution_id = %entry.execution.id,
                from = %current,
                to = %target,
                "rejected transition out of terminal state"
            );
            return Err(AttestError::InvalidStateTransition {
                execution_id: entry.execution.id.to_string(),
                from: current.to_string(),
                to: target.to_string(),
            });
        }

        self.audit.record(
            NewAuditEvent::new(actor, tag, TargetType::Execution, entry.execution.id)
                .with_metadata(metadata),
        )?;

        entry.execution.status = target;
        entry.execution.finished_at = Some(finished_at(entry.execution.started_at));

        debug!(execution_id = %entry.execution.id, status = %target, "execution sealed");
        Ok(entry.execution.clone())
    }
}

/// `now`, clamped so a skewed clock can never finish before the start.
fn finished_at(started_at: DateTime<Utc>) -> DateTime<Utc> {
    Utc::now().max(started_at)
}

// ── Tests ────────────────────────────────────────────────────────────────────
