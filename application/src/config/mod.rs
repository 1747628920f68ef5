//! Application-level configuration.
//!
//! This module provides configuration types that control how use cases behave:
//!
//! - [`ExecutionParams`]: retry budget, backoff and stage timeout
//! - [`WorkflowConfig`]: container handed to the workflow service

pub mod execution_params;
pub mod workflow_config;

pub use execution_params::ExecutionParams;
pub use workflow_config::WorkflowConfig;
