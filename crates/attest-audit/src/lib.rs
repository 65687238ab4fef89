//! # attest-audit
//!
//! Immutable, append-only, SHA-256 hash-chained audit trail for ATTEST.
//!
//! ## Overview
//!
//! Every mutation the ledger and evidence store perform is recorded as an
//! `AuditEvent` that links to the previous event via its SHA-256 hash.
//! Tampering with any event, even a single byte, breaks the chain and is
//! detected by `verify_chain`.
//!
//! ## Usage
//!
//! ```rust,ignore
//! use std::sync::Arc;
//! use attest_audit::InMemoryAuditTrail;
//! use attest_core::{ExecutionLedger, ExecutionRegistry};
//!
//! let audit = Arc::new(InMemoryAuditTrail::new());
//! let ledger = ExecutionLedger::new(Arc::new(ExecutionRegistry::new()), audit.clone());
//! ledger.start(&actor, None)?;
//!
//! assert!(audit.verify_integrity()?);
//! ```

pub mod chain;
pub mod event;
pub mod memory;

pub use chain::{hash_event, verify_chain};
pub use event::{AuditLog, GENESIS_HASH};
pub use memory::InMemoryAuditTrail;

// ── Tests ─────────────────────────────────────────────────────────────────────
