//! Reference scenarios.
//!
//! Each scenario wires real ATTEST components (ledger, evidence store,
//! hash-chained audit trail, pixel verifier) to the simulated desktop and
//! an in-memory object store, then prints what happened.

pub mod change;
pub mod no_change;
pub mod unknown_execution;

use std::sync::Arc;

use attest_audit::InMemoryAuditTrail;
use attest_contracts::{
    error::AttestResult,
    evidence::{ActionParameters, MouseButton},
};
use attest_core::{
    Collaborators, EvidenceStore, ExecutionLedger, ExecutionRegistry, VerificationWorkflow,
    WorkflowConfig,
};
use attest_verify::{PixelDeltaVerifier, Sha256Checker};

use crate::{desktop::SimulatedDesktop, store::MemoryObjectStore};

/// Environment descriptor stored on every scenario execution.
pub const SCENARIO_ENVIRONMENT: &str = "local-os-demo";

/// The click every scenario performs.
pub fn demo_click() -> ActionParameters {
    ActionParameters::MouseClick {
        x: 400,
        y: 400,
        button: MouseButton::Left,
    }
}

/// One fully wired in-process runtime.
pub struct SimRuntime {
    pub audit: Arc<InMemoryAuditTrail>,
    pub ledger: Arc<ExecutionLedger>,
    pub evidence: Arc<EvidenceStore>,
    pub desktop: SimulatedDesktop,
    pub storage: Arc<MemoryObjectStore>,
    pub workflow: VerificationWorkflow,
}

impl SimRuntime {
    /// Build a runtime around a fresh desktop. Scenarios skip the settle
    /// delay since the simulated screen updates synchronously.
    pub fn new(responsive: bool) -> AttestResult<Self> {
        let config = WorkflowConfig {
            environment: Some(SCENARIO_ENVIRONMENT.to_string()),
            actor_id: "scenario-runner".to_string(),
            settle_delay_ms: 0,
            step_timeout_ms: 2_000,
            retry_backoff_ms: 10,
            ..WorkflowConfig::default()
        };

        let audit = Arc::new(InMemoryAuditTrail::new());
        let registry = Arc::new(ExecutionRegistry::new());
        let ledger = Arc::new(ExecutionLedger::new(registry.clone(), audit.clone()));
        let evidence = Arc::new(EvidenceStore::new(registry, audit.clone()));
        let desktop = SimulatedDesktop::new(responsive)?;
        let storage = Arc::new(MemoryObjectStore::new());

        let collaborators = Collaborators {
            capture: Arc::new(desktop.clone()),
            input: Arc::new(desktop.clone()),
            storage: storage.clone(),
            integrity: Arc::new(Sha256Checker::new()),
            verifier: Arc::new(PixelDeltaVerifier::new()),
        };
        let workflow =
            VerificationWorkflow::new(config, ledger.clone(), evidence.clone(), collaborators)?;

        Ok(Self {
            audit,
            ledger,
            evidence,
            desktop,
            storage,
            workflow,
        })
    }
}

/// Run every scenario in order, stopping at the first error.
pub fn run_all() -> AttestResult<()> {
    no_change::run_scenario()?;
    change::run_scenario()?;
    unknown_execution::run_scenario()?;
    Ok(())
}
