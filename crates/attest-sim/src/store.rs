//! Object-store collaborators: a filesystem store for real runs and an
//! in-memory store for scenarios and tests.

use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use tracing::debug;

use attest_contracts::error::{AttestError, AttestResult};
use attest_core::traits::ObjectStore;

const FILE_SCHEME: &str = "file://";
const MEMORY_SCHEME: &str = "mem://";

fn not_found(uri: &str) -> AttestError {
    AttestError::NotFound {
        entity: "object",
        id: uri.to_string(),
    }
}

fn storage_failure(reason: String) -> AttestError {
    AttestError::TransportFailure {
        step: "storage".to_string(),
        reason,
    }
}

/// Rejects keys that would escape the store root.
fn check_key(key: &str) -> AttestResult<()> {
    let escapes = key.is_empty()
        || Path::new(key).is_absolute()
        || key.split(['/', '\\']).any(|part| part == "..");
    if escapes {
        return Err(AttestError::IntegrityViolation {
            reason: format!("object key '{key}' is not a relative path"),
        });
    }
    Ok(())
}

// ── Filesystem ────────────────────────────────────────────────────────────────

/// Writes each object to `<root>/<key>` and returns a `file://` location.
#[derive(Debug, Clone)]
pub struct FsObjectStore {
    root: PathBuf,
}

impl FsObjectStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }
}

impl ObjectStore for FsObjectStore {
    fn put(&self, key: &str, bytes: &[u8]) -> AttestResult<String> {
        check_key(key)?;
        let path = self.root.join(key);
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).map_err(|e| {
                storage_failure(format!("create {}: {e}", parent.display()))
            })?;
        }
        fs::write(&path, bytes)
            .map_err(|e| storage_failure(format!("write {}: {e}", path.display())))?;

        debug!(path = %path.display(), len = bytes.len(), "object written");
        Ok(format!("{FILE_SCHEME}{}", path.display()))
    }

    fn get(&self, storage_uri: &str) -> AttestResult<Vec<u8>> {
        let path = storage_uri
            .strip_prefix(FILE_SCHEME)
            .ok_or_else(|| not_found(storage_uri))?;
        fs::read(path).map_err(|e| match e.kind() {
            std::io::ErrorKind::NotFound => not_found(storage_uri),
            _ => storage_failure(format!("read {path}: {e}")),
        })
    }
}

// ── In-memory ─────────────────────────────────────────────────────────────────

#[derive(Debug, Default)]
pub struct MemoryObjectStore {
    objects: Mutex<HashMap<String, Vec<u8>>>,
}

impl MemoryObjectStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> AttestResult<usize> {
        Ok(self
            .objects
            .lock()
            .map_err(|e| storage_failure(format!("lock poisoned: {e}")))?
            .len())
    }

    pub fn is_empty(&self) -> AttestResult<bool> {
        Ok(self.len()? == 0)
    }
}

impl ObjectStore for MemoryObjectStore {
    fn put(&self, key: &str, bytes: &[u8]) -> AttestResult<String> {
        check_key(key)?;
        let uri = format!("{MEMORY_SCHEME}{key}");
        self.objects
            .lock()
            .map_err(|e| storage_failure(format!("lock poisoned: {e}")))?
            .insert(uri.clone(), bytes.to_vec());
        Ok(uri)
    }

    fn get(&self, storage_uri: &str) -> AttestResult<Vec<u8>> {
        self.objects
            .lock()
            .map_err(|e| storage_failure(format!("lock poisoned: {e}")))?
            .get(storage_uri)
            .cloned()
            .ok_or_else(|| not_found(storage_uri))
    }
}
