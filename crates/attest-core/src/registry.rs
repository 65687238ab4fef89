//! In-process storage shared by the ledger and the evidence store.
//!
//! Each execution and its child records live in one `ExecutionEntry` behind
//! its own `Mutex`. The outer `RwLock` only guards the id → entry map, so
//! work on distinct executions never contends beyond a map lookup. Anything
//! that must be atomic for one execution (seal, existence check + insert)
//! runs while holding that entry's mutex.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, RwLock};

use attest_contracts::{
    error::{AttestError, AttestResult},
    evidence::{Action, Artifact, Observation},
    execution::{Execution, ExecutionId},
};

/// An execution together with every evidence record that references it.
#[derive(Debug, Clone)]
pub struct ExecutionEntry {
    pub execution: Execution,
    pub observations: Vec<Observation>,
    pub artifacts: Vec<Artifact>,
    pub actions: Vec<Action>,
}

impl ExecutionEntry {
    pub fn new(execution: Execution) -> Self {
        Self {
            execution,
            observations: Vec::new(),
            artifacts: Vec::new(),
            actions: Vec::new(),
        }
    }
}

#[derive(Default)]
pub struct ExecutionRegistry {
    entries: RwLock<HashMap<ExecutionId, Arc<Mutex<ExecutionEntry>>>>,
}

fn poisoned(what: &str) -> AttestError {
    AttestError::TransportFailure {
        step: "registry".to_string(),
        reason: format!("{what} lock poisoned"),
    }
}

impl ExecutionRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub(crate) fn insert(&self, entry: ExecutionEntry) -> AttestResult<()> {
        let id = entry.execution.id;
        let mut map = self.entries.write().map_err(|_| poisoned("registry"))?;
        map.insert(id, Arc::new(Mutex::new(entry)));
        Ok(())
    }

    fn handle(&self, id: ExecutionId) -> AttestResult<Arc<Mutex<ExecutionEntry>>> {
        let map = self.entries.read().map_err(|_| poisoned("registry"))?;
        map.get(&id)
            .cloned()
            .ok_or_else(|| AttestError::execution_not_found(id))
    }

    /// Run `f` with exclusive access to one execution's entry.
    ///
    /// Fails with `NotFound` if the id is unknown. Whatever `f` reads and
    /// writes is indivisible with respect to every other call on that id.
    pub(crate) fn with_entry<T>(
        &self,
        id: ExecutionId,
        f: impl FnOnce(&mut ExecutionEntry) -> AttestResult<T>,
    ) -> AttestResult<T> {
        let handle = self.handle(id)?;
        let mut entry = handle.lock().map_err(|_| poisoned("execution"))?;
        f(&mut entry)
    }

    /// Read-only view of one entry; `None` if the id is unknown.
    pub(crate) fn read<T>(
        &self,
        id: ExecutionId,
        f: impl FnOnce(&ExecutionEntry) -> T,
    ) -> AttestResult<Option<T>> {
        let handle = match self.handle(id) {
            Ok(h) => h,
            Err(AttestError::NotFound { .. }) => return Ok(None),
            Err(e) => return Err(e),
        };
        let entry = handle.lock().map_err(|_| poisoned("execution"))?;
        Ok(Some(f(&entry)))
    }

    /// Every known execution id, in no particular order.
    pub(crate) fn ids(&self) -> AttestResult<Vec<ExecutionId>> {
        let map = self.entries.read().map_err(|_| poisoned("registry"))?;
        Ok(map.keys().copied().collect())
    }
}
