//! Configuration file loading for archmesh
//!
//! This module handles file I/O and merging of configuration from multiple sources.
//! The priority order (highest to lowest):
//!
//! 1. `ARCHMESH_*` environment variables (`__` separates nested keys)
//! 2. `--config <path>` specified file
//! 3. Project root: `./archmesh.toml` or `./.archmesh.toml`
//! 4. XDG config: `$XDG_CONFIG_HOME/archmesh/config.toml`
//! 5. Default values

mod file_config;
mod loader;

pub use file_config::{
    ConfigValidationError, FileAnthropicConfig, FileConfig, FileDiagramsConfig,
    FileLoggingConfig, FileOllamaConfig, FileOpenAiConfig, FileOutputConfig, FileOutputFormat,
    FileProvidersConfig, FileReviewMode, FileRouteConfig, FileWorkflowConfig,
};
pub use loader::ConfigLoader;
