//! Workflow configuration.
//!
//! Loaded from TOML and passed explicitly into `VerificationWorkflow::new`;
//! nothing reads configuration from ambient state.
//!
//! ```toml
//! environment = "local-os-demo"
//! actor_id = "executor-01"
//! output_dir = "artifacts"
//! settle_delay_ms = 500
//! step_timeout_ms = 10000
//! max_attempts = 3
//! retry_backoff_ms = 250
//! stale_after_secs = 600
//! ```

use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};

use attest_contracts::error::{AttestError, AttestResult};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct WorkflowConfig {
    /// Opaque environment descriptor stored on every execution started.
    pub environment: Option<String>,

    /// Identifier written as `actor_id` on the workflow's audit events.
    pub actor_id: String,

    /// Where the filesystem object store writes evidence blobs.
    pub output_dir: PathBuf,

    /// Pause after the action, before the after-capture.
    pub settle_delay_ms: u64,

    /// Upper bound on any single collaborator call.
    pub step_timeout_ms: u64,

    /// Total tries for capture and storage steps (the action is never retried).
    pub max_attempts: u32,

    /// Base delay between retries; attempt `n` waits `n * retry_backoff_ms`.
    pub retry_backoff_ms: u64,

    /// Executions left `Started` for longer than this are swept to `Failed`.
    pub stale_after_secs: u64,
}

impl Default for WorkflowConfig {
    fn default() -> Self {
        Self {
            environment: None,
            actor_id: "executor".to_string(),
            output_dir: PathBuf::from("artifacts"),
            settle_delay_ms: 500,
            step_timeout_ms: 10_000,
            max_attempts: 3,
            retry_backoff_ms: 250,
            stale_after_secs: 600,
        }
    }
}

impl WorkflowConfig {
    /// Parse and validate `s` as TOML. Missing keys take their defaults.
    pub fn from_toml_str(s: &str) -> AttestResult<Self> {
        let config: Self = toml::from_str(s).map_err(|e| AttestError::ConfigError {
            reason: format!("failed to parse workflow TOML: {}", e),
        })?;
        config.validate()?;
        Ok(config)
    }

    pub fn from_file(path: &Path) -> AttestResult<Self> {
        let contents = std::fs::read_to_string(path).map_err(|e| AttestError::ConfigError {
            reason: format!("failed to read config file '{}': {}", path.display(), e),
        })?;
        Self::from_toml_str(&contents)
    }

    pub fn validate(&self) -> AttestResult<()> {
        if self.max_attempts == 0 {
            return Err(AttestError::ConfigError {
                reason: "max_attempts must be at least 1".to_string(),
            });
        }
        if self.step_timeout_ms == 0 {
            return Err(AttestError::ConfigError {
                reason: "step_timeout_ms must be positive".to_string(),
            });
        }
        if self.actor_id.trim().is_empty() {
            return Err(AttestError::ConfigError {
                reason: "actor_id must not be empty".to_string(),
            });
        }
        // The watchdog must not sweep a run that is still inside one step.
        let busy_ms = self.settle_delay_ms.saturating_add(self.step_timeout_ms);
        if self.stale_after_secs.saturating_mul(1_000) <= busy_ms {
            return Err(AttestError::ConfigError {
                reason: format!(
                    "stale_after_secs ({}) must exceed settle_delay_ms + step_timeout_ms ({busy_ms} ms)",
                    self.stale_after_secs
                ),
            });
        }
        Ok(())
    }

    pub fn settle_delay(&self) -> Duration {
        Duration::from_millis(self.settle_delay_ms)
    }

    pub fn step_timeout(&self) -> Duration {
        Duration::from_millis(self.step_timeout_ms)
    }

    pub fn retry_backoff(&self) -> Duration {
        Duration::from_millis(self.retry_backoff_ms)
    }

    pub fn stale_after(&self) -> chrono::Duration {
        chrono::Duration::seconds(self.stale_after_secs.min(i64::MAX as u64) as i64)
    }
}

#[cfg(test)]
mod tests {
    use std::path::Path;

    use attest_contracts::error::AttestError;

    use super::WorkflowConfig;

    #[test]
    fn empty_document_yields_defaults() {
        let config = WorkflowConfig::from_toml_str("").unwrap();
        assert_eq!(config, WorkflowConfig::default());
        assert_eq!(config.settle_delay().as_millis(), 500);
    }

    #[test]
    fn partial_document_overrides_named_keys() {
        let config = WorkflowConfig::from_toml_str(
            r#"
                environment = "local-os-demo"
                settle_delay_ms = 0
                max_attempts = 5
            "#,
        )
        .unwrap();

        assert_eq!(config.environment.as_deref(), Some("local-os-demo"));
        assert_eq!(config.settle_delay_ms, 0);
        assert_eq!(config.max_attempts, 5);
        assert_eq!(config.step_timeout_ms, 10_000);
    }

    #[test]
    fn unknown_keys_are_rejected() {
        let err = WorkflowConfig::from_toml_str("backend_url = \"http://x\"").unwrap_err();
        assert!(matches!(err, AttestError::ConfigError { .. }));
    }

    #[test]
    fn zero_attempts_is_invalid() {
        let err = WorkflowConfig::from_toml_str("max_attempts = 0").unwrap_err();
        assert!(err.to_string().contains("max_attempts"));
    }

    #[test]
    fn zero_stale_after_is_invalid() {
        let err = WorkflowConfig::from_toml_str("stale_after_secs = 0").unwrap_err();
        assert!(matches!(err, AttestError::ConfigError { .. }));
        assert!(err.to_string().contains("stale_after_secs"));
    }

    #[test]
    fn stale_after_must_outlast_one_step() {
        let err = WorkflowConfig::from_toml_str(
            r#"
                settle_delay_ms = 500
                step_timeout_ms = 10000
                stale_after_secs = 10
            "#,
        )
        .unwrap_err();
        assert!(err.to_string().contains("10500 ms"));

        let config = WorkflowConfig::from_toml_str("stale_after_secs = 11").unwrap();
        assert_eq!(config.stale_after(), chrono::Duration::seconds(11));
    }

    #[test]
    fn missing_file_is_a_config_error() {
        let err = WorkflowConfig::from_file(Path::new("/nonexistent/attest.toml")).unwrap_err();
        assert!(matches!(err, AttestError::ConfigError { .. }));
    }
}
