//! Infrastructure layer for archmesh
//!
//! This crate contains adapters that implement the ports defined
//! in the application layer, including configuration file loading.

pub mod config;
pub mod logging;
pub mod providers;
pub mod renderer;
pub mod store;

// Re-export commonly used types
pub use config::{
    ConfigLoader, ConfigValidationError, FileConfig, FileOutputConfig, FileOutputFormat,
    FileReviewMode,
};
pub use logging::JsonlWorkflowLogger;
pub use providers::{ProviderAdapter, RoutingGateway, http_adapters};
pub use renderer::TemplateDiagramRenderer;
pub use store::{InMemoryDiagramRepository, InMemorySessionStore};
