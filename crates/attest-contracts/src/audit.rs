//! Audit record types.
//!
//! The audit trail is append-only: there is no update or delete operation
//! anywhere in the system. Each `AuditEvent` names its target by type and id
//! as a weak back-reference; no integrity constraint ties it to the target.

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::execution::ExecutionStatus;

record_id!(
    /// Identifier of an audit event.
    AuditEventId
);

/// Who performed an audited operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ActorType {
    User,
    Executor,
    System,
}

/// Kind of record an audit event points at.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TargetType {
    Execution,
    Observation,
    Action,
    Artifact,
}

impl fmt::Display for TargetType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Execution => "execution",
            Self::Observation => "observation",
            Self::Action => "action",
            Self::Artifact => "artifact",
        })
    }
}

/// The principal on whose behalf a mutation is performed.
///
/// Carried through ledger and evidence calls so every audit entry names its
/// actor.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Actor {
    pub actor_type: ActorType,
    pub actor_id: Option<String>,
}

impl Actor {
    pub fn executor(id: impl Into<String>) -> Self {
        Self {
            actor_type: ActorType::Executor,
            actor_id: Some(id.into()),
        }
    }

    pub fn user(id: impl Into<String>) -> Self {
        Self {
            actor_type: ActorType::User,
            actor_id: Some(id.into()),
        }
    }

    pub fn system() -> Self {
        Self {
            actor_type: ActorType::System,
            actor_id: None,
        }
    }
}

/// Known metadata shapes attached to audit events.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum AuditMetadata {
    ExecutionStarted { environment: Option<String> },
    ExecutionSealed { status: ExecutionStatus },
    EvidenceRecorded { checksum: String, storage_uri: String },
    ActionRecorded { action_type: String },
    StaleSwept { age_secs: i64 },
    Note { text: String },
}

/// Tags written to `AuditEvent::action` by the ledger and evidence store.
pub mod actions {
    pub const EXECUTION_STARTED: &str = "execution_started";
    pub const EXECUTION_COMPLETED: &str = "execution_completed";
    pub const EXECUTION_FAILED: &str = "execution_failed";
    pub const EXECUTION_SWEPT: &str = "execution_swept";
    pub const OBSERVATION_RECORDED: &str = "observation_recorded";
    pub const ARTIFACT_RECORDED: &str = "artifact_recorded";
    pub const ACTION_RECORDED: &str = "action_recorded";
}

/// An audit entry before the trail has assigned id, sequence, and hashes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewAuditEvent {
    pub actor: Actor,
    pub action: String,
    pub target_type: TargetType,
    pub target_id: String,
    pub metadata: Option<AuditMetadata>,
}

impl NewAuditEvent {
    pub fn new(
        actor: &Actor,
        action: impl Into<String>,
        target_type: TargetType,
        target_id: impl ToString,
    ) -> Self {
        Self {
            actor: actor.clone(),
            action: action.into(),
            target_type,
            target_id: target_id.to_string(),
            metadata: None,
        }
    }

    pub fn with_metadata(mut self, metadata: AuditMetadata) -> Self {
        self.metadata = Some(metadata);
        self
    }
}

/// An immutable audit entry as stored by the trail.
///
/// `prev_hash` / `this_hash` link the entry into a tamper-evident chain;
/// trails that do not chain leave them empty.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AuditEvent {
    pub id: AuditEventId,
    /// Position in append order, starting at 0.
    pub sequence: u64,
    pub actor_type: ActorType,
    pub actor_id: Option<String>,
    pub action: String,
    pub target_type: TargetType,
    pub target_id: String,
    pub metadata: Option<AuditMetadata>,
    pub occurred_at: DateTime<Utc>,
    pub prev_hash: String,
    pub this_hash: String,
}
