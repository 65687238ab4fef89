//! ATTEST one-shot executor.
//!
//! Starts an execution, captures the screen, performs one input action,
//! captures again, and decides whether the action caused a visible change.
//! Evidence bytes go to the output directory; the verdict, the JSON outcome,
//! and the audit trail are printed.
//!
//! Exit codes: `0` effect proven, `1` no change observed, `2` any error.
//!
//! Usage:
//!   cargo run -p attest-executor -- run-once --action mouse_click:400,400
//!   cargo run -p attest-executor -- run-once --config attest.toml --unresponsive
//!   cargo run -p attest-executor -- scenario all

use std::path::PathBuf;
use std::process;
use std::sync::Arc;
use std::time::Duration;

use clap::{Parser, Subcommand, ValueEnum};
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use attest_audit::InMemoryAuditTrail;
use attest_contracts::{
    error::{AttestError, AttestResult},
    evidence::ActionParameters,
};
use attest_core::{
    traits::AuditTrail, Collaborators, EvidenceStore, ExecutionLedger, ExecutionRegistry,
    VerificationWorkflow, Watchdog, WorkflowConfig, WorkflowOutcome,
};
use attest_sim::{
    scenarios::{self, change, no_change, unknown_execution},
    FsObjectStore, SimulatedDesktop,
};
use attest_verify::{PixelDeltaVerifier, Sha256Checker};

const EXIT_ERROR: i32 = 2;
const DEFAULT_ENVIRONMENT: &str = "local-os-demo";

// ── CLI definition ────────────────────────────────────────────────────────────

/// ATTEST: prove that one input action caused an observable screen change.
#[derive(Parser)]
#[command(
    name = "attest-executor",
    about = "ATTEST one-shot causal verification executor",
    long_about = "Performs one input action between two screen captures, records the\n\
                  evidence in a hash-chained ledger, and reports whether the action\n\
                  changed the screen. Exit codes: 0 pass, 1 fail, 2 error."
)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Run one verification against the simulated desktop.
    RunOnce(RunOnceArgs),
    /// Run the reference scenarios in memory.
    Scenario {
        #[arg(value_enum, default_value_t = ScenarioName::All)]
        which: ScenarioName,
    },
}

#[derive(clap::Args)]
struct RunOnceArgs {
    /// TOML workflow configuration. Defaults apply when omitted.
    #[arg(long)]
    config: Option<PathBuf>,

    /// Action to perform, e.g. `mouse_click:400,400`, `mouse_move:10,20`,
    /// `key_press:Enter`.
    #[arg(long, default_value = "mouse_click:400,400")]
    action: String,

    /// Override the environment descriptor stored on the execution.
    #[arg(long)]
    environment: Option<String>,

    /// Override the directory evidence blobs are written to.
    #[arg(long)]
    output_dir: Option<PathBuf>,

    /// Override the pause between the action and the after-capture.
    #[arg(long)]
    settle_ms: Option<u64>,

    /// Simulate a desktop that ignores input.
    #[arg(long)]
    unresponsive: bool,
}

#[derive(Clone, Copy, ValueEnum)]
enum ScenarioName {
    All,
    NoChange,
    Change,
    UnknownExecution,
}

// ── Entry point ───────────────────────────────────────────────────────────────

fn main() {
    // Set RUST_LOG=debug for per-step output.
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .with_target(false)
        .compact()
        .init();

    let cli = Cli::parse();

    let result = match cli.command {
        Command::RunOnce(args) => run_once(args),
        Command::Scenario { which } => run_scenarios(which).map(|()| 0),
    };

    match result {
        Ok(code) => process::exit(code),
        Err(e) => {
            eprintln!("attest-executor error: {}", e);
            process::exit(EXIT_ERROR);
        }
    }
}

// ── run-once ──────────────────────────────────────────────────────────────────

fn load_config(args: &RunOnceArgs) -> AttestResult<WorkflowConfig> {
    let mut config = match &args.config {
        Some(path) => WorkflowConfig::from_file(path)?,
        None => WorkflowConfig::default(),
    };
    if let Some(environment) = &args.environment {
        config.environment = Some(environment.clone());
    }
    if config.environment.is_none() {
        config.environment = Some(DEFAULT_ENVIRONMENT.to_string());
    }
    if let Some(dir) = &args.output_dir {
        config.output_dir = dir.clone();
    }
    if let Some(ms) = args.settle_ms {
        config.settle_delay_ms = ms;
    }
    config.validate()?;
    Ok(config)
}

fn run_once(args: RunOnceArgs) -> AttestResult<i32> {
    let config = load_config(&args)?;
    let action = ActionParameters::parse(&args.action)?;

    let audit = Arc::new(InMemoryAuditTrail::new());
    let registry = Arc::new(ExecutionRegistry::new());
    let ledger = Arc::new(ExecutionLedger::new(registry.clone(), audit.clone()));
    let evidence = Arc::new(EvidenceStore::new(registry, audit.clone()));

    let desktop = SimulatedDesktop::new(!args.unresponsive)?;
    let collaborators = Collaborators {
        capture: Arc::new(desktop.clone()),
        input: Arc::new(desktop),
        storage: Arc::new(FsObjectStore::new(config.output_dir.clone())),
        integrity: Arc::new(Sha256Checker::new()),
        verifier: Arc::new(PixelDeltaVerifier::new()),
    };

    info!(
        environment = ?config.environment,
        output_dir = %config.output_dir.display(),
        action = %args.action,
        "starting one-shot verification"
    );

    let watchdog = Watchdog::spawn(ledger.clone(), watchdog_interval(&config), config.stale_after());
    let workflow = VerificationWorkflow::new(config, ledger, evidence, collaborators)?;
    let result = workflow.run(action);
    watchdog.stop();

    let outcome = with_audit_listing(result, || print_audit(&audit))?;
    print_outcome(&outcome)?;

    Ok(outcome.exit_code())
}

/// Print the audit listing whichever way the run went. A listing failure is
/// logged and never replaces the run's own result.
fn with_audit_listing<T>(
    result: AttestResult<T>,
    print: impl FnOnce() -> AttestResult<()>,
) -> AttestResult<T> {
    if let Err(err) = print() {
        warn!(error = %err, "could not print audit trail");
    }
    result
}

/// Sweep often enough to catch a stale execution well before it doubles its
/// allowed age.
fn watchdog_interval(config: &WorkflowConfig) -> Duration {
    Duration::from_secs((config.stale_after_secs / 2).clamp(1, 60))
}

fn print_outcome(outcome: &WorkflowOutcome) -> AttestResult<()> {
    println!();
    if outcome.decision.is_pass() {
        println!(
            "VERIFIED: action changed {} pixel(s); execution {} {}",
            outcome.delta_count, outcome.execution.id, outcome.execution.status
        );
    } else {
        println!(
            "NOT VERIFIED: no pixel changed; execution {} {}",
            outcome.execution.id, outcome.execution.status
        );
    }
    println!();

    let json = serde_json::to_string_pretty(outcome).map_err(|e| AttestError::IntegrityViolation {
        reason: format!("outcome is not serializable: {e}"),
    })?;
    println!("{json}");
    Ok(())
}

fn print_audit(audit: &InMemoryAuditTrail) -> AttestResult<()> {
    let events = audit.list()?;
    println!("Audit trail ({} events, most recent first):", events.len());
    for event in &events {
        println!(
            "  #{:<3} {}  {:<22} {} {}",
            event.sequence,
            event.occurred_at.format("%H:%M:%S%.3f"),
            event.action,
            event.target_type,
            event.target_id
        );
    }
    let valid = audit.verify_integrity()?;
    println!(
        "  Chain integrity: {}",
        if valid { "VERIFIED" } else { "BROKEN" }
    );
    Ok(())
}

// ── scenario ──────────────────────────────────────────────────────────────────

fn run_scenarios(which: ScenarioName) -> AttestResult<()> {
    match which {
        ScenarioName::All => scenarios::run_all()?,
        ScenarioName::NoChange => {
            no_change::run_scenario()?;
        }
        ScenarioName::Change => {
            change::run_scenario()?;
        }
        ScenarioName::UnknownExecution => {
            unknown_execution::run_scenario()?;
        }
    }
    println!("All selected scenarios completed successfully.");
    Ok(())
}
