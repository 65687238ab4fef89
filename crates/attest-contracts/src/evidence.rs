//! Evidence records: observations, artifacts, and actions.
//!
//! All three are immutable once created and each references exactly one
//! execution. Observations are raw screen state, artifacts are derived or
//! packaged evidence, and actions record what input was performed (never why).

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::{error::AttestError, execution::ExecutionId};

record_id!(
    /// Identifier of a recorded observation.
    ObservationId
);
record_id!(
    /// Identifier of a recorded artifact.
    ArtifactId
);
record_id!(
    /// Identifier of a recorded action.
    ActionId
);

// ── Observation ───────────────────────────────────────────────────────────────

/// A raw, uninterpreted capture of on-screen state at a point in time.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Observation {
    pub id: ObservationId,
    pub execution_id: ExecutionId,
    /// Opaque location reference returned by the object store.
    pub storage_uri: String,
    /// Content digest of the frame bytes at `storage_uri`.
    pub checksum: String,
    pub captured_at: DateTime<Utc>,
}

// ── Artifact ──────────────────────────────────────────────────────────────────

/// Kind of derived or packaged evidence.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ArtifactType {
    Before,
    After,
    Delta,
    PixelDelta,
    Video,
    Log,
}

impl ArtifactType {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Before => "before",
            Self::After => "after",
            Self::Delta => "delta",
            Self::PixelDelta => "pixel_delta",
            Self::Video => "video",
            Self::Log => "log",
        }
    }

    /// True when the checksum is a `"<before>:<after>"` digest pair rather
    /// than the digest of a single blob.
    pub fn has_paired_checksum(self) -> bool {
        matches!(self, Self::Delta | Self::PixelDelta)
    }
}

impl fmt::Display for ArtifactType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ArtifactType {
    type Err = AttestError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "before" => Ok(Self::Before),
            "after" => Ok(Self::After),
            "delta" => Ok(Self::Delta),
            "pixel_delta" => Ok(Self::PixelDelta),
            "video" => Ok(Self::Video),
            "log" => Ok(Self::Log),
            other => Err(AttestError::UnrecognizedVariant {
                kind: "artifact type",
                value: other.to_string(),
            }),
        }
    }
}

/// Immutable derived or packaged evidence tied to an execution.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Artifact {
    pub id: ArtifactId,
    pub execution_id: ExecutionId,
    pub artifact_type: ArtifactType,
    pub storage_uri: String,
    pub checksum: String,
    pub created_at: DateTime<Utc>,
}

// ── Action ────────────────────────────────────────────────────────────────────

/// The fixed set of OS-level input events the ledger recognizes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ActionType {
    MouseMove,
    MouseClick,
    KeyPress,
    KeyRelease,
}

impl ActionType {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::MouseMove => "mouse_move",
            Self::MouseClick => "mouse_click",
            Self::KeyPress => "key_press",
            Self::KeyRelease => "key_release",
        }
    }
}

impl fmt::Display for ActionType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ActionType {
    type Err = AttestError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "mouse_move" => Ok(Self::MouseMove),
            "mouse_click" => Ok(Self::MouseClick),
            "key_press" => Ok(Self::KeyPress),
            "key_release" => Ok(Self::KeyRelease),
            other => Err(AttestError::UnrecognizedVariant {
                kind: "action type",
                value: other.to_string(),
            }),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MouseButton {
    Left,
    Right,
    Middle,
}

impl FromStr for MouseButton {
    type Err = AttestError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "left" => Ok(Self::Left),
            "right" => Ok(Self::Right),
            "middle" => Ok(Self::Middle),
            other => Err(AttestError::UnrecognizedVariant {
                kind: "mouse button",
                value: other.to_string(),
            }),
        }
    }
}

/// Typed payload of an action. The action type is derived from the variant,
/// so the recorded type and parameters can never disagree.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "action_type", rename_all = "snake_case")]
pub enum ActionParameters {
    MouseMove { x: i32, y: i32 },
    MouseClick { x: i32, y: i32, button: MouseButton },
    KeyPress { key: String },
    KeyRelease { key: String },
}

impl ActionParameters {
    pub fn action_type(&self) -> ActionType {
        match self {
            Self::MouseMove { .. } => ActionType::MouseMove,
            Self::MouseClick { .. } => ActionType::MouseClick,
            Self::KeyPress { .. } => ActionType::KeyPress,
            Self::KeyRelease { .. } => ActionType::KeyRelease,
        }
    }

    /// Parse the compact `kind:args` form used on the command line.
    ///
    /// ```text
    /// mouse_move:400,400
    /// mouse_click:400,400          (left button)
    /// mouse_click:400,400,right
    /// key_press:Enter
    /// key_release:Enter
    /// ```
    pub fn parse(input: &str) -> Result<Self, AttestError> {
        let (kind, args) = input.split_once(':').unwrap_or((input, ""));
        let malformed = || AttestError::UnrecognizedVariant {
            kind: "action",
            value: input.to_string(),
        };

        let coords = |args: &str| -> Result<(i32, i32, Vec<String>), AttestError> {
            let mut parts = args.split(',').map(str::trim);
            let x = parts.next().and_then(|p| p.parse().ok()).ok_or_else(malformed)?;
            let y = parts.next().and_then(|p| p.parse().ok()).ok_or_else(malformed)?;
            Ok((x, y, parts.map(str::to_string).collect()))
        };
        let key = |args: &str| -> Result<String, AttestError> {
            if args.trim().is_empty() {
                Err(malformed())
            } else {
                Ok(args.trim().to_string())
            }
        };

        match kind.parse::<ActionType>()? {
            ActionType::MouseMove => match coords(args)? {
                (x, y, rest) if rest.is_empty() => Ok(Self::MouseMove { x, y }),
                _ => Err(malformed()),
            },
            ActionType::MouseClick => {
                let (x, y, rest) = coords(args)?;
                let button = match rest.as_slice() {
                    [] => MouseButton::Left,
                    [b] => b.parse()?,
                    _ => return Err(malformed()),
                };
                Ok(Self::MouseClick { x, y, button })
            }
            ActionType::KeyPress => Ok(Self::KeyPress { key: key(args)? }),
            ActionType::KeyRelease => Ok(Self::KeyRelease { key: key(args)? }),
        }
    }
}

/// A single atomic OS-level input event that occurred during an execution.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Action {
    pub id: ActionId,
    pub execution_id: ExecutionId,
    pub action_type: ActionType,
    pub parameters: ActionParameters,
    pub occurred_at: DateTime<Utc>,
}
