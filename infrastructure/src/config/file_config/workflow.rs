//! Workflow configuration from TOML (`[workflow]` section)

use super::ConfigValidationError;
use archmesh_application::ExecutionParams;
use archmesh_domain::{StageName, WorkflowPolicy};
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// How review gates are answered when running from the CLI.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum FileReviewMode {
    /// Prompt on the terminal
    #[default]
    Interactive,
    AutoApprove,
    AutoReject,
}

/// Raw workflow configuration from TOML
///
/// # Example
///
/// ```toml
/// [workflow]
/// max_attempts = 3
/// initial_backoff_ms = 500
/// backoff_multiplier = 2.0
/// max_backoff_ms = 10000
/// stage_timeout_seconds = 180
/// review_stages = ["design_architecture"]
/// review_mode = "interactive"
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FileWorkflowConfig {
    pub max_attempts: u32,
    pub initial_backoff_ms: u64,
    pub backoff_multiplier: f64,
    pub max_backoff_ms: u64,
    pub stage_timeout_seconds: u64,
    /// Stages that pause for human review
    pub review_stages: Vec<String>,
    pub review_mode: FileReviewMode,
}

impl Default for FileWorkflowConfig {
    fn default() -> Self {
        let params = ExecutionParams::default();
        Self {
            max_attempts: params.max_attempts,
            initial_backoff_ms: params.initial_backoff.as_millis() as u64,
            backoff_multiplier: params.backoff_multiplier,
            max_backoff_ms: params.max_backoff.as_millis() as u64,
            stage_timeout_seconds: params.stage_timeout.as_secs(),
            review_stages: WorkflowPolicy::default()
                .review_stages
                .iter()
                .map(|s| s.as_str().to_string())
                .collect(),
            review_mode: FileReviewMode::default(),
        }
    }
}

impl FileWorkflowConfig {
    pub fn to_execution_params(&self) -> Result<ExecutionParams, ConfigValidationError> {
        if self.max_attempts == 0 {
            return Err(ConfigValidationError::ZeroAttempts);
        }
        if self.stage_timeout_seconds == 0 {
            return Err(ConfigValidationError::InvalidTimeout);
        }
        if !self.backoff_multiplier.is_finite() || self.backoff_multiplier < 1.0 {
            return Err(ConfigValidationError::InvalidBackoffMultiplier(
                self.backoff_multiplier,
            ));
        }
        Ok(ExecutionParams::default()
            .with_max_attempts(self.max_attempts)
            .with_initial_backoff(Duration::from_millis(self.initial_backoff_ms))
            .with_backoff_multiplier(self.backoff_multiplier)
            .with_max_backoff(Duration::from_millis(self.max_backoff_ms))
            .with_stage_timeout(Duration::from_secs(self.stage_timeout_seconds)))
    }

    pub fn to_policy(&self) -> Result<WorkflowPolicy, ConfigValidationError> {
        let mut policy = WorkflowPolicy::auto_advance();
        for name in &self.review_stages {
            let stage: StageName = name
                .parse()
                .map_err(|_| ConfigValidationError::UnknownStage(name.clone()))?;
            policy = policy.with_review(stage);
        }
        Ok(policy)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_match_application_defaults() {
        let config = FileWorkflowConfig::default();
        assert_eq!(
            config.to_execution_params().unwrap(),
            ExecutionParams::default()
        );
        assert_eq!(config.to_policy().unwrap(), WorkflowPolicy::default());
    }

    #[test]
    fn test_rejects_zero_attempts_and_timeout() {
        let config = FileWorkflowConfig {
            max_attempts: 0,
            ..Default::default()
        };
        assert!(matches!(
            config.to_execution_params(),
            Err(ConfigValidationError::ZeroAttempts)
        ));

        let config = FileWorkflowConfig {
            stage_timeout_seconds: 0,
            ..Default::default()
        };
        assert!(matches!(
            config.to_execution_params(),
            Err(ConfigValidationError::InvalidTimeout)
        ));
    }

    #[test]
    fn test_unknown_review_stage() {
        let config = FileWorkflowConfig {
            review_stages: vec!["deploy".to_string()],
            ..Default::default()
        };
        assert!(matches!(
            config.to_policy(),
            Err(ConfigValidationError::UnknownStage(s)) if s == "deploy"
        ));
    }

    #[test]
    fn test_review_mode_deserialize() {
        let config: FileWorkflowConfig =
            toml::from_str(r#"review_mode = "auto-approve""#).unwrap();
        assert_eq!(config.review_mode, FileReviewMode::AutoApprove);
        assert_eq!(config.max_attempts, 3);
    }
}
