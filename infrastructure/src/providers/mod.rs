//! LLM provider adapters and the routing gateway.
//!
//! Each [`ProviderAdapter`] speaks one provider's HTTP API. The
//! [`RoutingGateway`] implements the application's `LlmGateway` port on top
//! of them, following the route chosen for the task and falling back to the
//! route's secondary provider on transient failures.

mod http;
pub mod routing;

#[cfg(feature = "http-providers")]
pub mod anthropic;
#[cfg(feature = "http-providers")]
pub mod ollama;
#[cfg(feature = "http-providers")]
pub mod openai;

use archmesh_application::ports::llm_gateway::GatewayError;
use archmesh_domain::ProviderKind;
use async_trait::async_trait;

pub use http::{resolve_api_key, status_error};
pub use routing::RoutingGateway;

/// One provider's completion endpoint.
#[async_trait]
pub trait ProviderAdapter: Send + Sync {
    fn kind(&self) -> ProviderKind;

    /// Run a single-turn completion and return the text of the reply.
    async fn complete(
        &self,
        model: &str,
        system_prompt: &str,
        prompt: &str,
    ) -> Result<String, GatewayError>;
}

/// Build every HTTP adapter the configuration allows.
///
/// Providers whose API key cannot be resolved are skipped with a warning;
/// routes that target them fail over to their fallback.
#[cfg(feature = "http-providers")]
pub fn http_adapters(
    config: &crate::config::FileProvidersConfig,
) -> Vec<std::sync::Arc<dyn ProviderAdapter>> {
    use std::sync::Arc;
    use tracing::warn;

    let client = reqwest::Client::new();
    let mut adapters: Vec<Arc<dyn ProviderAdapter>> =
        vec![Arc::new(ollama::OllamaAdapter::new(client.clone(), &config.ollama))];

    match resolve_api_key(config.anthropic.api_key.as_deref(), &config.anthropic.api_key_env) {
        Some(key) => adapters.push(Arc::new(anthropic::AnthropicAdapter::new(
            client.clone(),
            key,
            &config.anthropic,
        ))),
        None => warn!(
            "Anthropic disabled: {} is not set",
            config.anthropic.api_key_env
        ),
    }

    match resolve_api_key(config.openai.api_key.as_deref(), &config.openai.api_key_env) {
        Some(key) => adapters.push(Arc::new(openai::OpenAiAdapter::new(
            client,
            key,
            &config.openai,
        ))),
        None => warn!("OpenAI disabled: {} is not set", config.openai.api_key_env),
    }

    adapters
}

/// Without the `http-providers` feature no provider is reachable.
#[cfg(not(feature = "http-providers"))]
pub fn http_adapters(
    _config: &crate::config::FileProvidersConfig,
) -> Vec<std::sync::Arc<dyn ProviderAdapter>> {
    tracing::warn!("Built without the http-providers feature; no LLM provider is available");
    Vec::new()
}
