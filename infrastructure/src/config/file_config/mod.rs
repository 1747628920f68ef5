//! Raw TOML configuration data types
//!
//! These structs represent the exact structure of the TOML config file.
//! They are deserialized directly and converted into application types
//! after validation.

mod diagrams;
mod logging;
mod output;
mod providers;
mod workflow;

pub use diagrams::FileDiagramsConfig;
pub use logging::FileLoggingConfig;
pub use output::{FileOutputConfig, FileOutputFormat};
pub use providers::{
    FileAnthropicConfig, FileOllamaConfig, FileOpenAiConfig, FileProvidersConfig, FileRouteConfig,
};
pub use workflow::{FileReviewMode, FileWorkflowConfig};

use archmesh_application::WorkflowConfig;
use archmesh_domain::ProviderSelection;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Configuration validation errors
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ConfigValidationError {
    #[error("workflow.max_attempts must be at least 1")]
    ZeroAttempts,

    #[error("workflow.stage_timeout_seconds cannot be 0")]
    InvalidTimeout,

    #[error("workflow.backoff_multiplier must be >= 1.0, got {0}")]
    InvalidBackoffMultiplier(f64),

    #[error("unknown stage name: {0}")]
    UnknownStage(String),

    #[error("unknown provider: {0}")]
    UnknownProvider(String),

    #[error("unknown task type: {0}")]
    UnknownTaskType(String),

    #[error("unknown environment: {0}")]
    UnknownEnvironment(String),

    #[error("unknown diagram format: {0}")]
    UnknownDiagramFormat(String),

    #[error("model name cannot be empty")]
    EmptyModelName,
}

/// Complete file configuration (raw TOML structure)
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FileConfig {
    /// Stage execution and review settings
    pub workflow: FileWorkflowConfig,
    /// Provider routing and credentials
    pub providers: FileProvidersConfig,
    /// Diagram generation settings
    pub diagrams: FileDiagramsConfig,
    /// Output settings
    pub output: FileOutputConfig,
    /// Log destinations
    pub logging: FileLoggingConfig,
}

impl FileConfig {
    /// Validate the entire configuration, returning every detected issue.
    pub fn validate(&self) -> Vec<ConfigValidationError> {
        let mut issues = Vec::new();
        if let Err(e) = self.workflow.to_execution_params() {
            issues.push(e);
        }
        if let Err(e) = self.workflow.to_policy() {
            issues.push(e);
        }
        if let Err(e) = self.providers.to_selection() {
            issues.push(e);
        }
        if let Err(e) = self.diagrams.parse_format() {
            issues.push(e);
        }
        issues
    }

    pub fn to_workflow_config(&self) -> Result<WorkflowConfig, ConfigValidationError> {
        Ok(WorkflowConfig::new(
            self.workflow.to_execution_params()?,
            self.workflow.to_policy()?,
        )
        .with_diagram_format(self.diagrams.parse_format()?)
        .with_diagrams(self.diagrams.enabled))
    }

    pub fn to_provider_selection(&self) -> Result<ProviderSelection, ConfigValidationError> {
        self.providers.to_selection()
    }
}
