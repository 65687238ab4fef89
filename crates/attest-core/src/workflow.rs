//! The one-shot causal verification workflow.
//!
//! The workflow drives exactly one execution through a strictly ordered
//! pipeline on a single worker:
//!
//!   Start → Capture(before) → Act → Settle → Capture(after) → Delta → Decide → Evidence → Seal
//!
//! Every collaborator call runs under its own timeout. Capture and storage
//! steps are retried with bounded linear backoff; the OS action is performed
//! at most once. A `Decision::Fail` is a normal `Ok` outcome and seals the
//! execution `Failed`; any step error after start also seals it `Failed`
//! and is returned as `Err`, so the two can never be confused.

use std::sync::{mpsc, Arc};
use std::thread;

use serde::Serialize;
use tracing::{debug, info, warn};

use attest_contracts::{
    audit::Actor,
    error::{AttestError, AttestResult},
    evidence::{Action, ActionParameters, Artifact, ArtifactType, Observation},
    execution::{Execution, ExecutionId},
    frame::Frame,
    verify::Decision,
};

use crate::{
    config::WorkflowConfig,
    evidence::{paired_checksum, EvidenceStore},
    ledger::ExecutionLedger,
    traits::{CaptureSource, CausalVerifier, InputDriver, IntegrityChecker, ObjectStore},
};

/// The external collaborators and trusted checkers a workflow needs.
#[derive(Clone)]
pub struct Collaborators {
    pub capture: Arc<dyn CaptureSource>,
    pub input: Arc<dyn InputDriver>,
    pub storage: Arc<dyn ObjectStore>,
    pub integrity: Arc<dyn IntegrityChecker>,
    pub verifier: Arc<dyn CausalVerifier>,
}

/// Everything one run produced, whichever way the decision went.
#[derive(Debug, Clone, Serialize)]
pub struct WorkflowOutcome {
    /// The sealed execution.
    pub execution: Execution,
    pub decision: Decision,
    pub delta_count: u64,
    pub before: Observation,
    pub after: Observation,
    pub action: Action,
    /// Present only when `decision` is `Pass`.
    pub pixel_delta: Option<Artifact>,
}

impl WorkflowOutcome {
    /// Process exit code: 0 when the effect was proven, 1 when it was not.
    pub fn exit_code(&self) -> i32 {
        match self.decision {
            Decision::Pass => 0,
            Decision::Fail => 1,
        }
    }
}

/// A captured frame together with the observation that records it.
struct CapturedEvidence {
    frame: Frame,
    observation: Observation,
}

pub struct VerificationWorkflow {
    config: WorkflowConfig,
    ledger: Arc<ExecutionLedger>,
    evidence: Arc<EvidenceStore>,
    collaborators: Collaborators,
    actor: Actor,
}

impl VerificationWorkflow {
    pub fn new(
        config: WorkflowConfig,
        ledger: Arc<ExecutionLedger>,
        evidence: Arc<EvidenceStore>,
        collaborators: Collaborators,
    ) -> AttestResult<Self> {
        config.validate()?;
        let actor = Actor::executor(config.actor_id.clone());
        Ok(Self {
            config,
            ledger,
            evidence,
            collaborators,
            actor,
        })
    }

    pub fn config(&self) -> &WorkflowConfig {
        &self.config
    }

    /// Run the full pipeline for one action.
    ///
    /// # Errors
    ///
    /// Returns `Err` for step failures (transport, dimension mismatch,
    /// integrity, ledger). A negative verification is NOT an error; it is an
    /// `Ok` outcome with `Decision::Fail`.
    pub fn run(&self, action: ActionParameters) -> AttestResult<WorkflowOutcome> {
        let execution = self
            .ledger
            .start(&self.actor, self.config.environment.clone())?;

        match self.drive(execution.id, action) {
            Ok(outcome) => Ok(outcome),
            Err(err) => {
                warn!(execution_id = %execution.id, error = %err, "workflow step failed, sealing execution as failed");
                match self.ledger.complete(&self.actor, execution.id, false) {
                    Ok(_) | Err(AttestError::InvalidStateTransition { .. }) => {}
                    Err(seal_err) => warn!(
                        execution_id = %execution.id,
                        error = %seal_err,
                        "could not seal execution after step failure"
                    ),
                }
                Err(err)
            }
        }
    }

    fn drive(&self, id: ExecutionId, action: ActionParameters) -> AttestResult<WorkflowOutcome> {
        // ── Before ───────────────────────────────────────────────────────────
        let before = self.capture_evidence(id, "before")?;

        // ── Act (exactly once) ───────────────────────────────────────────────
        let input = Arc::clone(&self.collaborators.input);
        let performed = action.clone();
        self.timed("perform_action", move || input.perform(&performed))?;
        let action = self.evidence.record_action(&self.actor, id, action, None)?;
        debug!(execution_id = %id, action_type = %action.action_type, "action performed");

        let settle = self.config.settle_delay();
        if !settle.is_zero() {
            thread::sleep(settle);
        }

        // ── After ────────────────────────────────────────────────────────────
        let after = self.capture_evidence(id, "after")?;

        // ── Verify ───────────────────────────────────────────────────────────
        let verifier = &self.collaborators.verifier;
        let delta_count = verifier.compute_delta(&before.frame, &after.frame)?;
        let decision = verifier.decide(delta_count);

        // ── Evidence + seal ──────────────────────────────────────────────────
        let (pixel_delta, execution) = match decision {
            Decision::Pass => {
                let artifact = self.evidence.record_artifact(
                    &self.actor,
                    id,
                    ArtifactType::PixelDelta,
                    format!(
                        "{}->{}",
                        before.observation.storage_uri, after.observation.storage_uri
                    ),
                    paired_checksum(&before.observation.checksum, &after.observation.checksum),
                )?;
                let execution = self.ledger.complete(&self.actor, id, true)?;
                (Some(artifact), execution)
            }
            Decision::Fail => (None, self.ledger.complete(&self.actor, id, false)?),
        };

        info!(
            execution_id = %id,
            %decision,
            delta_count,
            status = %execution.status,
            "causal verification finished"
        );

        Ok(WorkflowOutcome {
            execution,
            decision,
            delta_count,
            before: before.observation,
            after: after.observation,
            action,
            pixel_delta,
        })
    }

    /// Capture a frame, store its bytes, hash them, and record the observation.
    fn capture_evidence(&self, id: ExecutionId, label: &str) -> AttestResult<CapturedEvidence> {
        let frame = self.retrying(&format!("capture_{label}"), || {
            let capture = Arc::clone(&self.collaborators.capture);
            self.timed(&format!("capture_{label}"), move || capture.capture_frame())
        })?;

        let bytes = Arc::new(frame.raw_bytes());
        let key = format!("{id}/{label}.raw");
        let storage_uri = self.retrying(&format!("store_{label}"), || {
            let storage = Arc::clone(&self.collaborators.storage);
            let bytes = Arc::clone(&bytes);
            let key = key.clone();
            self.timed(&format!("store_{label}"), move || storage.put(&key, &bytes))
        })?;

        let checksum = self.collaborators.integrity.hash(&bytes);
        let observation =
            self.evidence
                .record_observation(&self.actor, id, storage_uri, checksum, None)?;

        debug!(
            execution_id = %id,
            label,
            shape = %frame.shape(),
            checksum = %observation.checksum,
            "frame captured"
        );
        Ok(CapturedEvidence { frame, observation })
    }

    /// Run `call` on a helper thread and give up after `step_timeout`.
    ///
    /// A timed-out call is abandoned, not cancelled; its late result is
    /// discarded.
    fn timed<T, F>(&self, step: &str, call: F) -> AttestResult<T>
    where
        T: Send + 'static,
        F: FnOnce() -> AttestResult<T> + Send + 'static,
    {
        let (tx, rx) = mpsc::channel();
        thread::Builder::new()
            .name(format!("attest-{step}"))
            .spawn(move || {
                let _ = tx.send(call());
            })
            .map_err(|e| AttestError::TransportFailure {
                step: step.to_string(),
                reason: format!("could not spawn worker: {e}"),
            })?;

        let timeout = self.config.step_timeout();
        match rx.recv_timeout(timeout) {
            Ok(result) => result,
            Err(mpsc::RecvTimeoutError::Timeout) => Err(AttestError::TransportFailure {
                step: step.to_string(),
                reason: format!("timed out after {} ms", timeout.as_millis()),
            }),
            Err(mpsc::RecvTimeoutError::Disconnected) => Err(AttestError::TransportFailure {
                step: step.to_string(),
                reason: "collaborator exited without a result".to_string(),
            }),
        }
    }

    /// Retry transient failures up to `max_attempts` with linear backoff.
    fn retrying<T>(&self, step: &str, mut attempt: impl FnMut() -> AttestResult<T>) -> AttestResult<T> {
        let max = self.config.max_attempts;
        let mut n = 1;
        loop {
            match attempt() {
                Ok(value) => return Ok(value),
                Err(err) if err.is_transient() && n < max => {
                    warn!(step, attempt = n, max_attempts = max, error = %err, "transient failure, retrying");
                    thread::sleep(self.config.retry_backoff() * n);
                    n += 1;
                }
                Err(err) => return Err(err),
            }
        }
    }
}

// ── Tests ────────────────────────────────────────────────────────────────────
