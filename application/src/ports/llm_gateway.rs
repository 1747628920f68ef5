//! LLM Gateway port
//!
//! Defines the interface for communicating with LLM providers.

use archmesh_domain::{ProviderKind, ProviderRoute, TaskType};
use async_trait::async_trait;
use thiserror::Error;

/// Errors that can occur during LLM gateway operations
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum GatewayError {
    #[error("Connection error: {0}")]
    ConnectionError(String),

    #[error("Provider not available: {0}")]
    ProviderUnavailable(ProviderKind),

    #[error("Request failed{}: {message}", status.map(|s| format!(" ({})", s)).unwrap_or_default())]
    RequestFailed {
        status: Option<u16>,
        message: String,
    },

    #[error("Rate limited by {0}")]
    RateLimited(ProviderKind),

    #[error("Authentication failed for {0}")]
    Unauthorized(ProviderKind),

    #[error("Request refused by content policy: {0}")]
    ContentPolicy(String),

    #[error("Invalid response: {0}")]
    InvalidResponse(String),

    #[error("Timeout")]
    Timeout,

    #[error("Other error: {0}")]
    Other(String),
}

impl GatewayError {
    /// Whether a later attempt (or another provider) may succeed.
    pub fn is_retryable(&self) -> bool {
        match self {
            GatewayError::ConnectionError(_)
            | GatewayError::ProviderUnavailable(_)
            | GatewayError::RateLimited(_)
            | GatewayError::InvalidResponse(_)
            | GatewayError::Timeout => true,
            GatewayError::RequestFailed { status, .. } => match status {
                Some(code) => *code == 408 || *code == 429 || *code >= 500,
                None => true,
            },
            GatewayError::Unauthorized(_)
            | GatewayError::ContentPolicy(_)
            | GatewayError::Other(_) => false,
        }
    }
}

/// One model invocation.
#[derive(Debug, Clone, PartialEq)]
pub struct GatewayRequest {
    pub task_type: TaskType,
    pub route: ProviderRoute,
    pub system_prompt: String,
    pub prompt: String,
    /// Free-form tags attached to provider calls for tracing
    pub context: Vec<(String, String)>,
}

impl GatewayRequest {
    pub fn new(
        task_type: TaskType,
        route: ProviderRoute,
        system_prompt: impl Into<String>,
        prompt: impl Into<String>,
    ) -> Self {
        Self {
            task_type,
            route,
            system_prompt: system_prompt.into(),
            prompt: prompt.into(),
            context: Vec::new(),
        }
    }

    pub fn with_context(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.context.push((key.into(), value.into()));
        self
    }
}

/// Text returned by a provider, with the provider and model that produced it.
#[derive(Debug, Clone, PartialEq)]
pub struct GatewayResponse {
    pub text: String,
    pub provider: ProviderKind,
    pub model: String,
}

/// Gateway for LLM communication
///
/// This port defines how the application layer communicates with LLM providers.
/// Implementations (adapters) live in the infrastructure layer.
#[async_trait]
pub trait LlmGateway: Send + Sync {
    /// Send a prompt following the request's route and return the completion
    async fn invoke(&self, request: GatewayRequest) -> Result<GatewayResponse, GatewayError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_retryable_classification() {
        assert!(GatewayError::Timeout.is_retryable());
        assert!(GatewayError::RateLimited(ProviderKind::OpenAi).is_retryable());
        assert!(
            GatewayError::RequestFailed {
                status: Some(503),
                message: "overloaded".into()
            }
            .is_retryable()
        );
        assert!(
            !GatewayError::RequestFailed {
                status: Some(400),
                message: "bad request".into()
            }
            .is_retryable()
        );
        assert!(!GatewayError::Unauthorized(ProviderKind::Anthropic).is_retryable());
        assert!(!GatewayError::ContentPolicy("blocked".into()).is_retryable());
    }

    #[test]
    fn test_request_failed_display() {
        let err = GatewayError::RequestFailed {
            status: Some(500),
            message: "boom".into(),
        };
        assert_eq!(err.to_string(), "Request failed (500): boom");
    }
}
