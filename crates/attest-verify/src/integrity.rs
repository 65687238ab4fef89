//! SHA-256 content digests for evidence bytes.

use sha2::{Digest, Sha256};

use attest_core::traits::IntegrityChecker;

/// `IntegrityChecker` producing lowercase hex SHA-256 digests (64 chars).
#[derive(Debug, Clone, Copy, Default)]
pub struct Sha256Checker;

impl Sha256Checker {
    pub fn new() -> Self {
        Self
    }
}

impl IntegrityChecker for Sha256Checker {
    fn hash(&self, bytes: &[u8]) -> String {
        hex::encode(Sha256::digest(bytes))
    }
}
