//! Execution identity and lifecycle types.
//!
//! An `Execution` is one bounded run from start to seal. Its status moves
//! exactly once, from `Started` to either `Completed` or `Failed`.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::AttestError;

/// Unique identifier for a single execution.
///
/// Appears on every observation, action, artifact, and audit record that
/// belongs to the run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ExecutionId(pub uuid::Uuid);

impl ExecutionId {
    /// Create a new, unique execution ID.
    pub fn new() -> Self {
        Self(uuid::Uuid::new_v4())
    }
}

impl Default for ExecutionId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for ExecutionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

impl FromStr for ExecutionId {
    type Err = AttestError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        uuid::Uuid::parse_str(s)
            .map(Self)
            .map_err(|_| AttestError::execution_not_found(s))
    }
}

/// Lifecycle state of an execution.
///
/// `Completed` and `Failed` are terminal: no transition leaves them.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ExecutionStatus {
    Started,
    Completed,
    Failed,
}

impl ExecutionStatus {
    pub fn is_terminal(self) -> bool {
        !matches!(self, Self::Started)
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Started => "started",
            Self::Completed => "completed",
            Self::Failed => "failed",
        }
    }
}

impl fmt::Display for ExecutionStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One bounded execution run.
///
/// `finished_at` is `Some` if and only if `status` is terminal. Records are
/// created by `ExecutionLedger::start`, sealed once, and never deleted.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Execution {
    pub id: ExecutionId,
    pub status: ExecutionStatus,
    /// Opaque description of the environment (OS, display, constraints).
    pub environment: Option<String>,
    pub started_at: DateTime<Utc>,
    pub finished_at: Option<DateTime<Utc>>,
}

impl Execution {
    /// A freshly started execution.
    pub fn started(environment: Option<String>, now: DateTime<Utc>) -> Self {
        Self {
            id: ExecutionId::new(),
            status: ExecutionStatus::Started,
            environment,
            started_at: now,
            finished_at: None,
        }
    }

    pub fn is_sealed(&self) -> bool {
        self.status.is_terminal()
    }
}
