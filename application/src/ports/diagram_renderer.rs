//! Diagram renderer port

use archmesh_domain::DiagramRequest;
use async_trait::async_trait;
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum RendererError {
    #[error("Diagram type {0} is not supported by this renderer")]
    Unsupported(String),

    #[error("Rendering failed: {0}")]
    Failed(String),
}

/// Turns a diagram request into diagram source text.
#[async_trait]
pub trait DiagramRenderer: Send + Sync {
    async fn render(&self, request: &DiagramRequest) -> Result<String, RendererError>;
}
