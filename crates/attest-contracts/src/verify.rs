//! Causal verification outcome types.

use std::fmt;

use serde::{Deserialize, Serialize};

/// The verdict of a causal verification.
///
/// `Fail` is a normal, expected result value and never an error.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Decision {
    /// At least one pixel changed: the action had an observable effect.
    Pass,
    /// No pixel changed.
    Fail,
}

impl Decision {
    pub fn is_pass(self) -> bool {
        matches!(self, Self::Pass)
    }
}

impl fmt::Display for Decision {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Pass => "pass",
            Self::Fail => "fail",
        })
    }
}
