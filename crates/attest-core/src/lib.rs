//! # attest-core
//!
//! The execution integrity ledger and causal verification workflow.
//!
//! This crate provides:
//! - The seam traits (`AuditTrail`, `IntegrityChecker`, `CausalVerifier`) and
//!   the external collaborator traits (`CaptureSource`, `InputDriver`,
//!   `ObjectStore`)
//! - `ExecutionLedger`, which owns the execution state machine
//! - `EvidenceStore`, which records immutable observations, artifacts, and actions
//! - `Watchdog`, which seals executions stuck in `Started`
//! - `VerificationWorkflow`, which wires everything together in order
//!
//! ## Usage
//!
//! ```rust,ignore
//! use std::sync::Arc;
//! use attest_core::{ExecutionLedger, EvidenceStore, ExecutionRegistry};
//!
//! let registry = Arc::new(ExecutionRegistry::new());
//! let ledger = ExecutionLedger::new(registry.clone(), audit.clone());
//! let evidence = EvidenceStore::new(registry, audit);
//! ```

pub mod config;
pub mod evidence;
pub mod ledger;
pub mod registry;
pub mod traits;
pub mod watchdog;
pub mod workflow;

#[cfg(test)]
mod test_support;

pub use config::WorkflowConfig;
pub use evidence::EvidenceStore;
pub use ledger::ExecutionLedger;
pub use registry::ExecutionRegistry;
pub use watchdog::Watchdog;
pub use workflow::{Collaborators, VerificationWorkflow, WorkflowOutcome};
