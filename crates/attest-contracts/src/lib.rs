//! # attest-contracts
//!
//! Shared records, frames, and error types for the ATTEST execution ledger.
//!
//! All crates in the workspace import from here. No business logic lives in
//! this crate, only data definitions and error types.

/// UUID v4 newtype for a record identifier.
macro_rules! record_id {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
        #[serde(transparent)]
        pub struct $name(pub uuid::Uuid);

        impl $name {
            pub fn new() -> Self {
                Self(uuid::Uuid::new_v4())
            }
        }

        impl Default for $name {
            fn default() -> Self {
                Self::new()
            }
        }

        impl std::fmt::Display for $name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                self.0.fmt(f)
            }
        }
    };
}

pub mod audit;
pub mod error;
pub mod evidence;
pub mod execution;
pub mod frame;
pub mod verify;
