//! Scenario A: the action has no visible effect.
//!
//! The desktop acknowledges the click but never repaints, so the before and
//! after frames are byte-identical. The verifier reports a zero delta, the
//! decision is `Fail`, no pixel-delta artifact is written, and the execution
//! is sealed `failed`.

use attest_contracts::error::AttestResult;
use attest_core::WorkflowOutcome;

use super::{demo_click, SimRuntime};

pub fn run_scenario() -> AttestResult<WorkflowOutcome> {
    println!("=== Scenario A: No Observable Change ===");
    println!();

    let runtime = SimRuntime::new(false)?;
    println!("  Environment: {}", super::SCENARIO_ENVIRONMENT);
    println!("  Action:      mouse_click at (400, 400)");
    println!("  Desktop:     unresponsive");
    println!();

    let outcome = runtime.workflow.run(demo_click())?;

    println!("  Execution:        {}", outcome.execution.id);
    println!("  Before checksum:  {}", outcome.before.checksum);
    println!("  After checksum:   {}", outcome.after.checksum);
    println!("  Pixel delta:      {}", outcome.delta_count);
    println!("  Decision:         {}", outcome.decision);
    println!("  Final status:     {}", outcome.execution.status);
    println!();

    let chain_ok = runtime.audit.verify_integrity()?;
    println!(
        "  Audit chain: {} events, integrity {}",
        runtime.audit.len()?,
        if chain_ok { "VERIFIED" } else { "BROKEN" }
    );
    println!();
    println!("  Scenario A complete.");
    println!();

    Ok(outcome)
}

#[cfg(test)]
mod tests {
    use attest_contracts::{audit::actions, execution::ExecutionStatus, verify::Decision};
    use attest_core::traits::AuditTrail;

    use super::super::{demo_click, SimRuntime};

    #[test]
    fn test_no_change_fails_and_seals_failed() {
        let outcome = super::run_scenario().unwrap();

        assert_eq!(outcome.delta_count, 0);
        assert_eq!(outcome.decision, Decision::Fail);
        assert_eq!(outcome.execution.status, ExecutionStatus::Failed);
        assert_eq!(outcome.execution.status.to_string(), "failed");
        assert_eq!(outcome.before.checksum, outcome.after.checksum);
        assert!(outcome.pixel_delta.is_none());
        assert_eq!(outcome.exit_code(), 1);
    }

    #[test]
    fn test_no_change_records_no_artifact() {
        let runtime = SimRuntime::new(false).unwrap();
        let outcome = runtime.workflow.run(demo_click()).unwrap();
        let id = outcome.execution.id;

        assert!(runtime.evidence.list_artifacts(id).unwrap().is_empty());
        assert_eq!(runtime.evidence.list_observations(id).unwrap().len(), 2);
        assert_eq!(runtime.ledger.get(id).unwrap().status, ExecutionStatus::Failed);
        assert!(runtime.audit.list().unwrap().iter().all(|e| e.action != actions::ARTIFACT_RECORDED));
        assert!(runtime.audit.verify_integrity().unwrap());
    }
}
