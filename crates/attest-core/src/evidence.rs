//! The evidence store: immutable observations, artifacts, and actions.
//!
//! Every record references exactly one execution. The existence check on the
//! execution and the insert of the child record happen under that
//! execution's lock, so the parent cannot be sealed between check and insert.
//! The audit entry is written inside the same critical section and before
//! the record is pushed; a failed audit write leaves nothing behind.
//!
//! Checksums are validated for shape on the way in. They are not recomputed
//! against `storage_uri` at record time; `verify_observation` and
//! `verify_artifact` perform that re-hash on demand.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use tracing::{debug, warn};

use attest_contracts::{
    audit::{actions, Actor, AuditMetadata, NewAuditEvent, TargetType},
    error::{AttestError, AttestResult},
    evidence::{
        Action, ActionId, ActionParameters, Artifact, ArtifactId, ArtifactType, Observation,
        ObservationId,
    },
    execution::ExecutionId,
};

use crate::{
    registry::{ExecutionEntry, ExecutionRegistry},
    traits::{AuditTrail, IntegrityChecker, ObjectStore},
};

/// Length of a hex-encoded SHA-256 digest.
pub const DIGEST_HEX_LEN: usize = 64;

/// Check that `checksum` is one lowercase hex SHA-256 digest.
pub fn validate_digest(checksum: &str) -> AttestResult<()> {
    let well_formed = checksum.len() == DIGEST_HEX_LEN
        && checksum
            .bytes()
            .all(|b| b.is_ascii_digit() || (b'a'..=b'f').contains(&b));
    if well_formed {
        Ok(())
    } else {
        Err(AttestError::IntegrityViolation {
            reason: format!("checksum '{checksum}' is not a {DIGEST_HEX_LEN}-char lowercase hex digest"),
        })
    }
}

/// Check the checksum shape expected for `artifact_type`.
pub fn validate_artifact_checksum(artifact_type: ArtifactType, checksum: &str) -> AttestResult<()> {
    if !artifact_type.has_paired_checksum() {
        return validate_digest(checksum);
    }
    match checksum.split_once(':') {
        Some((before, after)) => {
            validate_digest(before)?;
            validate_digest(after)
        }
        None => Err(AttestError::IntegrityViolation {
            reason: format!(
                "{artifact_type} checksum must be '<before>:<after>', got '{checksum}'"
            ),
        }),
    }
}

/// The checksum recorded on a `pixel_delta` artifact.
pub fn paired_checksum(before: &str, after: &str) -> String {
    format!("{before}:{after}")
}

fn validate_uri(storage_uri: &str) -> AttestResult<()> {
    if storage_uri.trim().is_empty() {
        return Err(AttestError::IntegrityViolation {
            reason: "storage_uri must not be empty".to_string(),
        });
    }
    Ok(())
}

fn reject_if_sealed(entry: &ExecutionEntry) -> AttestResult<()> {
    if entry.execution.is_sealed() {
        return Err(AttestError::ExecutionSealed {
            execution_id: entry.execution.id.to_string(),
            status: entry.execution.status.to_string(),
        });
    }
    Ok(())
}

pub struct EvidenceStore {
    registry: Arc<ExecutionRegistry>,
    audit: Arc<dyn AuditTrail>,
}

impl EvidenceStore {
    pub fn new(registry: Arc<ExecutionRegistry>, audit: Arc<dyn AuditTrail>) -> Self {
        Self { registry, audit }
    }

    /// Record a raw screen capture. `captured_at` defaults to now.
    pub fn record_observation(
        &self,
        actor: &Actor,
        execution_id: ExecutionId,
        storage_uri: impl Into<String>,
        checksum: impl Into<String>,
        captured_at: Option<DateTime<Utc>>,
    ) -> AttestResult<Observation> {
        let storage_uri = storage_uri.into();
        let checksum = checksum.into();
        validate_uri(&storage_uri)?;
        validate_digest(&checksum)?;

        self.registry.with_entry(execution_id, |entry| {
            reject_if_sealed(entry)?;
            let observation = Observation {
                id: ObservationId::new(),
                execution_id,
                storage_uri,
                checksum,
                captured_at: captured_at.unwrap_or_else(Utc::now),
            };
            self.audit.record(
                NewAuditEvent::new(
                    actor,
                    actions::OBSERVATION_RECORDED,
                    TargetType::Observation,
                    observation.id,
                )
                .with_metadata(AuditMetadata::EvidenceRecorded {
                    checksum: observation.checksum.clone(),
                    storage_uri: observation.storage_uri.clone(),
                }),
            )?;
            entry.observations.push(observation.clone());
            debug!(%execution_id, observation_id = %observation.id, "observation recorded");
            Ok(observation)
        })
    }

    /// Record derived or packaged evidence.
    pub fn record_artifact(
        &self,
        actor: &Actor,
        execution_id: ExecutionId,
        artifact_type: ArtifactType,
        storage_uri: impl Into<String>,
        checksum: impl Into<String>,
    ) -> AttestResult<Artifact> {
        let storage_uri = storage_uri.into();
        let checksum = checksum.into();
        validate_uri(&storage_uri)?;
        validate_artifact_checksum(artifact_type, &checksum)?;

        self.registry.with_entry(execution_id, |entry| {
            reject_if_sealed(entry)?;
            let artifact = Artifact {
                id: ArtifactId::new(),
                execution_id,
                artifact_type,
                storage_uri,
                checksum,
                created_at: Utc::now(),
            };
            self.audit.record(
                NewAuditEvent::new(
                    actor,
                    actions::ARTIFACT_RECORDED,
                    TargetType::Artifact,
                    artifact.id,
                )
                .with_metadata(AuditMetadata::EvidenceRecorded {
                    checksum: artifact.checksum.clone(),
                    storage_uri: artifact.storage_uri.clone(),
                }),
            )?;
            entry.artifacts.push(artifact.clone());
            debug!(
                %execution_id,
                artifact_id = %artifact.id,
                artifact_type = %artifact.artifact_type,
                "artifact recorded"
            );
            Ok(artifact)
        })
    }

    /// Record one performed input event. `occurred_at` defaults to now.
    pub fn record_action(
        &self,
        actor: &Actor,
        execution_id: ExecutionId,
        parameters: ActionParameters,
        occurred_at: Option<DateTime<Utc>>,
    ) -> AttestResult<Action> {
        self.registry.with_entry(execution_id, |entry| {
            reject_if_sealed(entry)?;
            let action = Action {
                id: ActionId::new(),
                execution_id,
                action_type: parameters.action_type(),
                parameters,
                occurred_at: occurred_at.unwrap_or_else(Utc::now),
            };
            self.audit.record(
                NewAuditEvent::new(actor, actions::ACTION_RECORDED, TargetType::Action, action.id)
                    .with_metadata(AuditMetadata::ActionRecorded {
                        action_type: action.action_type.to_string(),
                    }),
            )?;
            entry.actions.push(action.clone());
            debug!(%execution_id, action_id = %action.id, action_type = %action.action_type, "action recorded");
            Ok(action)
        })
    }

    /// Observations of one execution, `captured_at` ascending.
    pub fn list_observations(&self, execution_id: ExecutionId) -> AttestResult<Vec<Observation>> {
        let mut rows = self
            .registry
            .read(execution_id, |entry| entry.observations.clone())?
            .unwrap_or_default();
        rows.sort_by_key(|o| o.captured_at);
        Ok(rows)
    }

    /// Artifacts of one execution, `created_at` ascending.
    pub fn list_artifacts(&self, execution_id: ExecutionId) -> AttestResult<Vec<Artifact>> {
        let mut rows = self
            .registry
            .read(execution_id, |entry| entry.artifacts.clone())?
            .unwrap_or_default();
        rows.sort_by_key(|a| a.created_at);
        Ok(rows)
    }

    /// Actions of one execution, `occurred_at` ascending.
    pub fn list_actions(&self, execution_id: ExecutionId) -> AttestResult<Vec<Action>> {
        let mut rows = self
            .registry
            .read(execution_id, |entry| entry.actions.clone())?
            .unwrap_or_default();
        rows.sort_by_key(|a| a.occurred_at);
        Ok(rows)
    }

    /// Re-hash the stored bytes of an observation and compare with its
    /// recorded checksum.
    pub fn verify_observation(
        &self,
        execution_id: ExecutionId,
        observation_id: ObservationId,
        store: &dyn ObjectStore,
        checker: &dyn IntegrityChecker,
    ) -> AttestResult<()> {
        let observation = self
            .list_observations(execution_id)?
            .into_iter()
            .find(|o| o.id == observation_id)
            .ok_or_else(|| AttestError::NotFound {
                entity: "observation",
                id: observation_id.to_string(),
            })?;
        rehash(&observation.storage_uri, &observation.checksum, store, checker)
    }

    /// Re-hash the stored bytes of a single-blob artifact.
    ///
    /// Paired-checksum artifacts (`delta`, `pixel_delta`) reference two blobs
    /// and are rejected with `IntegrityViolation`.
    pub fn verify_artifact(
        &self,
        execution_id: ExecutionId,
        artifact_id: ArtifactId,
        store: &dyn ObjectStore,
        checker: &dyn IntegrityChecker,
    ) -> AttestResult<()> {
        let artifact = self
            .list_artifacts(execution_id)?
            .into_iter()
            .find(|a| a.id == artifact_id)
            .ok_or_else(|| AttestError::NotFound {
                entity: "artifact",
                id: artifact_id.to_string(),
            })?;
        if artifact.artifact_type.has_paired_checksum() {
            return Err(AttestError::IntegrityViolation {
                reason: format!(
                    "{} artifact '{}' has a paired checksum and no single blob to re-hash",
                    artifact.artifact_type, artifact.id
                ),
            });
        }
        rehash(&artifact.storage_uri, &artifact.checksum, store, checker)
    }
}

fn rehash(
    storage_uri: &str,
    expected: &str,
    store: &dyn ObjectStore,
    checker: &dyn IntegrityChecker,
) -> AttestResult<()> {
    let bytes = store.get(storage_uri)?;
    let actual = checker.hash(&bytes);
    if actual != expected {
        warn!(%storage_uri, %expected, %actual, "stored evidence does not match its checksum");
        return Err(AttestError::IntegrityViolation {
            reason: format!("content at '{storage_uri}' hashes to {actual}, recorded {expected}"),
        });
    }
    Ok(())
}

// ── Tests ────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use std::collections::HashMap;
    use std::sync::Mutex;

    use chrono::{Duration, Utc};

    use attest_contracts::{
        audit::{actions, Actor},
        error::{AttestError, AttestResult},
        evidence::{ActionParameters, ActionType, ArtifactType, MouseButton},
        execution::ExecutionId,
    };

    use super::{paired_checksum, validate_artifact_checksum, validate_digest};
    use crate::{
        test_support::{digest, harness, StubChecker},
        traits::{IntegrityChecker, ObjectStore},
    };

    fn actor() -> Actor {
        Actor::executor("test-runner")
    }

    #[derive(Default)]
    struct MapStore {
        blobs: Mutex<HashMap<String, Vec<u8>>>,
    }

    impl ObjectStore for MapStore {
        fn put(&self, key: &str, bytes: &[u8]) -> AttestResult<String> {
            let uri = format!("mem://{key}");
            self.blobs.lock().unwrap().insert(uri.clone(), bytes.to_vec());
            Ok(uri)
        }

        fn get(&self, storage_uri: &str) -> AttestResult<Vec<u8>> {
            self.blobs
                .lock()
                .unwrap()
                .get(storage_uri)
                .cloned()
                .ok_or_else(|| AttestError::NotFound {
                    entity: "blob",
                    id: storage_uri.to_string(),
                })
        }
    }

    // ── Checksum validation ──────────────────────────────────────────────────

    #[test]
    fn digest_shape_is_enforced() {
        assert!(validate_digest(&"a".repeat(64)).is_ok());
        assert!(validate_digest("").is_err());
        assert!(validate_digest(&"A".repeat(64)).is_err());
        assert!(validate_digest(&"g".repeat(64)).is_err());
        assert!(validate_digest(&"a".repeat(63)).is_err());
    }

    #[test]
    fn pixel_delta_requires_paired_checksum() {
        let pair = paired_checksum(&digest(1), &digest(2));
        assert!(validate_artifact_checksum(ArtifactType::PixelDelta, &pair).is_ok());
        assert!(validate_artifact_checksum(ArtifactType::PixelDelta, &digest(1)).is_err());
        assert!(validate_artifact_checksum(ArtifactType::Before, &pair).is_err());
    }

    // ── Recording ────────────────────────────────────────────────────────────

    #[test]
    fn observation_for_unknown_execution_is_not_found_and_not_persisted() {
        let h = harness();
        let missing = ExecutionId::new();

        let err = h
            .evidence
            .record_observation(&actor(), missing, "file:///b.raw", digest(1), None)
            .unwrap_err();
        assert!(matches!(err, AttestError::NotFound { entity: "execution", .. }));
        assert!(h.evidence.list_observations(missing).unwrap().is_empty());
        assert!(h.audit.actions().is_empty());
    }

    #[test]
    fn artifact_for_unknown_execution_is_not_found() {
        let h = harness();
        let err = h
            .evidence
            .record_artifact(&actor(), ExecutionId::new(), ArtifactType::Log, "file:///l", digest(3))
            .unwrap_err();
        assert!(matches!(err, AttestError::NotFound { .. }));
    }

    #[test]
    fn malformed_checksum_is_an_integrity_violation() {
        let h = harness();
        let execution = h.ledger.start(&actor(), None).unwrap();

        let err = h
            .evidence
            .record_observation(&actor(), execution.id, "file:///b.raw", "", None)
            .unwrap_err();
        assert!(matches!(err, AttestError::IntegrityViolation { .. }));

        let err = h
            .evidence
            .record_observation(&actor(), execution.id, " ", digest(1), None)
            .unwrap_err();
        assert!(matches!(err, AttestError::IntegrityViolation { .. }));
        assert!(h.evidence.list_observations(execution.id).unwrap().is_empty());
    }

    #[test]
    fn each_record_is_audited_once() {
        let h = harness();
        let execution = h.ledger.start(&actor(), None).unwrap();

        h.evidence
            .record_observation(&actor(), execution.id, "file:///b.raw", digest(1), None)
            .unwrap();
        h.evidence
            .record_action(
                &actor(),
                execution.id,
                ActionParameters::MouseClick { x: 1, y: 1, button: MouseButton::Left },
                None,
            )
            .unwrap();
        h.evidence
            .record_artifact(
                &actor(),
                execution.id,
                ArtifactType::PixelDelta,
                "before->after",
                paired_checksum(&digest(1), &digest(2)),
            )
            .unwrap();

        assert_eq!(
            h.audit.actions(),
            vec![
                actions::EXECUTION_STARTED,
                actions::OBSERVATION_RECORDED,
                actions::ACTION_RECORDED,
                actions::ARTIFACT_RECORDED,
            ]
        );
    }

    #[test]
    fn action_type_follows_parameters() {
        let h = harness();
        let execution = h.ledger.start(&actor(), None).unwrap();
        let action = h
            .evidence
            .record_action(
                &actor(),
                execution.id,
                ActionParameters::KeyRelease { key: "Esc".to_string() },
                None,
            )
            .unwrap();
        assert_eq!(action.action_type, ActionType::KeyRelease);
        assert_eq!(h.evidence.list_actions(execution.id).unwrap(), vec![action]);
    }

    #[test]
    fn audit_outage_leaves_no_record() {
        let h = harness();
        let execution = h.ledger.start(&actor(), None).unwrap();
        h.audit.go_offline();

        let err = h
            .evidence
            .record_observation(&actor(), execution.id, "file:///b.raw", digest(1), None)
            .unwrap_err();
        assert!(err.is_transient());
        assert!(h.evidence.list_observations(execution.id).unwrap().is_empty());
    }

    #[test]
    fn sealed_execution_rejects_evidence() {
        let h = harness();
        let execution = h.ledger.start(&actor(), None).unwrap();
        h.ledger.complete(&actor(), execution.id, false).unwrap();

        let err = h
            .evidence
            .record_observation(&actor(), execution.id, "file:///late.raw", digest(9), None)
            .unwrap_err();
        match err {
            AttestError::ExecutionSealed { status, .. } => assert_eq!(status, "failed"),
            other => panic!("expected ExecutionSealed, got {:?}", other),
        }
    }

    // ── Listing ──────────────────────────────────────────────────────────────

    #[test]
    fn observations_list_in_capture_order_regardless_of_insert_order() {
        let h = harness();
        let execution = h.ledger.start(&actor(), None).unwrap();
        let t0 = Utc::now();

        for (offset, seed) in [(30, 3u8), (10, 1), (20, 2)] {
            h.evidence
                .record_observation(
                    &actor(),
                    execution.id,
                    format!("file:///{seed}.raw"),
                    digest(seed),
                    Some(t0 + Duration::seconds(offset)),
                )
                .unwrap();
        }

        let listed = h.evidence.list_observations(execution.id).unwrap();
        let checksums: Vec<_> = listed.iter().map(|o| o.checksum.clone()).collect();
        assert_eq!(checksums, vec![digest(1), digest(2), digest(3)]);
        assert!(listed.windows(2).all(|w| w[0].captured_at <= w[1].captured_at));
    }

    #[test]
    fn actions_list_in_occurrence_order_regardless_of_insert_order() {
        let h = harness();
        let execution = h.ledger.start(&actor(), None).unwrap();
        let t0 = Utc::now();

        for (offset, x) in [(20, 2), (0, 0), (10, 1)] {
            h.evidence
                .record_action(
                    &actor(),
                    execution.id,
                    ActionParameters::MouseMove { x, y: 0 },
                    Some(t0 + Duration::seconds(offset)),
                )
                .unwrap();
        }
        h.evidence
            .record_action(
                &actor(),
                execution.id,
                ActionParameters::MouseClick { x: 1, y: 0, button: MouseButton::Left },
                Some(t0 + Duration::seconds(10)),
            )
            .unwrap();

        let listed = h.evidence.list_actions(execution.id).unwrap();
        assert!(listed.windows(2).all(|w| w[0].occurred_at <= w[1].occurred_at));
        let kinds: Vec<_> = listed.iter().map(|a| a.action_type).collect();
        assert_eq!(
            kinds,
            vec![
                ActionType::MouseMove,
                ActionType::MouseMove,
                ActionType::MouseClick,
                ActionType::MouseMove,
            ],
            "equal timestamps keep insertion order"
        );
    }

    #[test]
    fn artifacts_list_in_creation_order() {
        let h = harness();
        let execution = h.ledger.start(&actor(), None).unwrap();

        let recorded = [
            (ArtifactType::Before, "file:///before.raw", digest(1)),
            (ArtifactType::After, "file:///after.raw", digest(2)),
            (
                ArtifactType::PixelDelta,
                "file:///before.raw->file:///after.raw",
                paired_checksum(&digest(1), &digest(2)),
            ),
            (ArtifactType::Log, "file:///run.log", digest(3)),
        ];
        for (kind, uri, checksum) in &recorded {
            h.evidence
                .record_artifact(&actor(), execution.id, *kind, *uri, checksum.clone())
                .unwrap();
        }

        let listed = h.evidence.list_artifacts(execution.id).unwrap();
        assert_eq!(listed.len(), recorded.len());
        assert!(listed.windows(2).all(|w| w[0].created_at <= w[1].created_at));
        for (kind, _, checksum) in &recorded {
            assert!(listed.iter().any(|a| a.artifact_type == *kind && a.checksum == *checksum));
        }
    }

    #[test]
    fn listings_do_not_cross_executions() {
        let h = harness();
        let a = h.ledger.start(&actor(), None).unwrap();
        let b = h.ledger.start(&actor(), None).unwrap();
        h.evidence
            .record_artifact(&actor(), a.id, ArtifactType::Log, "file:///a.log", digest(1))
            .unwrap();

        assert_eq!(h.evidence.list_artifacts(a.id).unwrap().len(), 1);
        assert!(h.evidence.list_artifacts(b.id).unwrap().is_empty());
        assert!(h.evidence.list_artifacts(ExecutionId::new()).unwrap().is_empty());
    }

    // ── Re-hash verification ─────────────────────────────────────────────────

    #[test]
    fn verify_observation_detects_tampered_content() {
        let h = harness();
        let store = MapStore::default();
        let execution = h.ledger.start(&actor(), None).unwrap();

        let uri = store.put("frame", b"pixels").unwrap();
        let observation = h
            .evidence
            .record_observation(&actor(), execution.id, &uri, StubChecker.hash(b"pixels"), None)
            .unwrap();

        h.evidence
            .verify_observation(execution.id, observation.id, &store, &StubChecker)
            .unwrap();

        store.put("frame", b"PIXELS").unwrap();
        let err = h
            .evidence
            .verify_observation(execution.id, observation.id, &store, &StubChecker)
            .unwrap_err();
        assert!(matches!(err, AttestError::IntegrityViolation { .. }));
    }

    #[test]
    fn verify_artifact_refuses_paired_checksums() {
        let h = harness();
        let store = MapStore::default();
        let execution = h.ledger.start(&actor(), None).unwrap();
        let artifact = h
            .evidence
            .record_artifact(
                &actor(),
                execution.id,
                ArtifactType::PixelDelta,
                "before->after",
                paired_checksum(&digest(1), &digest(2)),
            )
            .unwrap();

        let err = h
            .evidence
            .verify_artifact(execution.id, artifact.id, &store, &StubChecker)
            .unwrap_err();
        assert!(matches!(err, AttestError::IntegrityViolation { .. }));
    }
}
