//! Error taxonomy for the ATTEST ledger and verification pipeline.
//!
//! All fallible operations return `AttestResult<T>`. Variants carry enough
//! context to name the missing or invalid entity in user-facing output.
//!
//! A negative causal verification is NOT an error: it is reported as
//! `Decision::Fail` so it can never be confused with a `TransportFailure`.

use thiserror::Error;

/// The unified error type for the ATTEST runtime.
#[derive(Debug, Error)]
pub enum AttestError {
    /// A referenced record does not exist. Terminal; retrying cannot help.
    #[error("{entity} '{id}' not found")]
    NotFound { entity: &'static str, id: String },

    /// Two frames cannot be compared because their geometry or sample depth
    /// differ. Terminal for that verification attempt.
    #[error("frame dimensions differ: {left} vs {right}")]
    DimensionMismatch { left: String, right: String },

    /// An execution was asked to leave a terminal state.
    #[error("execution '{execution_id}' cannot transition from {from} to {to}")]
    InvalidStateTransition {
        execution_id: String,
        from: String,
        to: String,
    },

    /// Evidence was offered for an execution that has already been sealed.
    #[error("execution '{execution_id}' is sealed ({status}); evidence rejected")]
    ExecutionSealed { execution_id: String, status: String },

    /// A checksum or storage reference is missing, malformed, or does not
    /// match the stored content.
    #[error("integrity violation: {reason}")]
    IntegrityViolation { reason: String },

    /// A collaborator (capture, input, object store, audit sink) failed.
    ///
    /// Recoverable by the orchestrating workflow, never retried by the core.
    #[error("transport failure during {step}: {reason}")]
    TransportFailure { step: String, reason: String },

    /// A raster buffer does not match its declared geometry.
    #[error("malformed frame: {reason}")]
    MalformedFrame { reason: String },

    /// A string did not name any member of a fixed enumerated set.
    #[error("unrecognized {kind} '{value}'")]
    UnrecognizedVariant { kind: &'static str, value: String },

    /// A required configuration value is missing or invalid.
    #[error("configuration error: {reason}")]
    ConfigError { reason: String },
}

impl AttestError {
    /// Shorthand for a `NotFound` naming an execution.
    pub fn execution_not_found(id: impl ToString) -> Self {
        Self::NotFound {
            entity: "execution",
            id: id.to_string(),
        }
    }

    /// True for failures the orchestrating workflow may retry.
    pub fn is_transient(&self) -> bool {
        matches!(self, Self::TransportFailure { .. })
    }
}

/// Convenience alias used throughout the ATTEST crates.
pub type AttestResult<T> = Result<T, AttestError>;
