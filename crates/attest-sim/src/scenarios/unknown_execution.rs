//! Scenario C: evidence for an execution that does not exist.
//!
//! Recording an observation against a random execution id is rejected with
//! `NotFound`, nothing is persisted, and no audit event is written.

use attest_contracts::{
    audit::Actor,
    error::{AttestError, AttestResult},
    execution::ExecutionId,
};
use attest_verify::Sha256Checker;
use attest_core::traits::IntegrityChecker;

use super::SimRuntime;

/// Returns the rejection the evidence store produced.
pub fn run_scenario() -> AttestResult<AttestError> {
    println!("=== Scenario C: Unknown Execution ===");
    println!();

    let runtime = SimRuntime::new(true)?;
    let ghost = ExecutionId::new();
    let checksum = Sha256Checker::new().hash(b"orphaned frame");

    println!("  Execution:  {ghost} (never started)");
    println!("  Operation:  record observation");
    println!();

    let rejection = match runtime.evidence.record_observation(
        &Actor::user("operator"),
        ghost,
        "mem://orphan/before.raw".to_string(),
        checksum,
        None,
    ) {
        Ok(observation) => {
            return Err(AttestError::IntegrityViolation {
                reason: format!(
                    "observation {} accepted for unknown execution {ghost}",
                    observation.id
                ),
            })
        }
        Err(err @ AttestError::NotFound { .. }) => err,
        Err(other) => return Err(other),
    };

    println!("  REJECTED: {rejection}");
    println!("  Observations stored: {}", runtime.evidence.list_observations(ghost)?.len());
    println!("  Audit events:        {}", runtime.audit.len()?);
    println!();
    println!("  Scenario C complete.");
    println!();

    Ok(rejection)
}
