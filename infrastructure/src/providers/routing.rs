use super::ProviderAdapter;
use archmesh_application::ports::llm_gateway::{
    GatewayError, GatewayRequest, GatewayResponse, LlmGateway,
};
use archmesh_domain::ProviderKind;
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Arc;
use tracing::{debug, warn};

/// `LlmGateway` that dispatches each request to the provider named by its
/// route.
///
/// Routing order:
///  1. the route's primary provider with the route's model
///  2. on a retryable error (unavailable, rate limited, 5xx, timeout), the
///     route's fallback provider with that provider's default model
///
/// Non-retryable errors (bad credentials, content policy, 4xx) are returned
/// as-is without trying the fallback.
pub struct RoutingGateway {
    providers: HashMap<ProviderKind, Arc<dyn ProviderAdapter>>,
}

impl RoutingGateway {
    pub fn new(providers: Vec<Arc<dyn ProviderAdapter>>) -> Self {
        let providers = providers.into_iter().map(|p| (p.kind(), p)).collect();
        Self { providers }
    }

    pub fn has_provider(&self, kind: ProviderKind) -> bool {
        self.providers.contains_key(&kind)
    }

    async fn call(
        &self,
        kind: ProviderKind,
        model: &str,
        request: &GatewayRequest,
    ) -> Result<GatewayResponse, GatewayError> {
        let provider = self
            .providers
            .get(&kind)
            .ok_or(GatewayError::ProviderUnavailable(kind))?;

        let text = provider
            .complete(model, &request.system_prompt, &request.prompt)
            .await?;

        Ok(GatewayResponse {
            text,
            provider: kind,
            model: model.to_string(),
        })
    }
}

#[async_trait]
impl LlmGateway for RoutingGateway {
    async fn invoke(&self, request: GatewayRequest) -> Result<GatewayResponse, GatewayError> {
        let route = &request.route;
        debug!(
            task = %request.task_type,
            provider = %route.provider,
            model = %route.model,
            context = ?request.context,
            "Routing LLM request"
        );

        let primary_err = match self.call(route.provider, &route.model, &request).await {
            Ok(response) => return Ok(response),
            Err(e) => e,
        };

        let fallback = match route.fallback {
            Some(fallback) if fallback != route.provider && primary_err.is_retryable() => {
                fallback
            }
            _ => return Err(primary_err),
        };

        warn!(
            task = %request.task_type,
            provider = %route.provider,
            fallback = %fallback,
            error = %primary_err,
            "Primary provider failed, trying fallback"
        );
        self.call(fallback, fallback.default_model(), &request).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use archmesh_domain::{ProviderRoute, TaskType};
    use std::sync::Mutex;

    // -- Mock ProviderAdapter --------------------------------------------------

    struct MockProvider {
        kind: ProviderKind,
        reply: Result<String, GatewayError>,
        calls: Mutex<Vec<String>>,
    }

    impl MockProvider {
        fn ok(kind: ProviderKind, text: &str) -> Arc<Self> {
            Arc::new(Self {
                kind,
                reply: Ok(text.to_string()),
                calls: Mutex::new(Vec::new()),
            })
        }

        fn failing(kind: ProviderKind, err: GatewayError) -> Arc<Self> {
            Arc::new(Self {
                kind,
                reply: Err(err),
                calls: Mutex::new(Vec::new()),
            })
        }

        fn models_called(&self) -> Vec<String> {
            self.calls.lock().unwrap().clone()
        }
    }

    #[async_trait]
    impl ProviderAdapter for MockProvider {
        fn kind(&self) -> ProviderKind {
            self.kind
        }

        async fn complete(
            &self,
            model: &str,
            _system_prompt: &str,
            _prompt: &str,
        ) -> Result<String, GatewayError> {
            self.calls.lock().unwrap().push(model.to_string());
            self.reply.clone()
        }
    }

    // -- Helpers ---------------------------------------------------------------

    fn gateway(providers: &[&Arc<MockProvider>]) -> RoutingGateway {
        RoutingGateway::new(
            providers
                .iter()
                .map(|p| Arc::clone(p) as Arc<dyn ProviderAdapter>)
                .collect(),
        )
    }

    fn request(route: ProviderRoute) -> GatewayRequest {
        GatewayRequest::new(TaskType::ArchitectureDesign, route, "system", "prompt")
    }

    fn anthropic_with_openai_fallback() -> ProviderRoute {
        ProviderRoute::new(ProviderKind::Anthropic, "claude-opus-4-1")
            .with_fallback(ProviderKind::OpenAi)
    }

    // -- routing order ---------------------------------------------------------

    #[tokio::test]
    async fn primary_provider_answers_with_route_model() {
        let anthropic = MockProvider::ok(ProviderKind::Anthropic, "from anthropic");
        let openai = MockProvider::ok(ProviderKind::OpenAi, "from openai");
        let gw = gateway(&[&anthropic, &openai]);

        let response = gw.invoke(request(anthropic_with_openai_fallback())).await.unwrap();

        assert_eq!(response.text, "from anthropic");
        assert_eq!(response.provider, ProviderKind::Anthropic);
        assert_eq!(response.model, "claude-opus-4-1");
        assert!(openai.models_called().is_empty());
    }

    #[tokio::test]
    async fn retryable_error_uses_fallback_default_model() {
        let anthropic = MockProvider::failing(
            ProviderKind::Anthropic,
            GatewayError::RateLimited(ProviderKind::Anthropic),
        );
        let openai = MockProvider::ok(ProviderKind::OpenAi, "from openai");
        let gw = gateway(&[&anthropic, &openai]);

        let response = gw.invoke(request(anthropic_with_openai_fallback())).await.unwrap();

        assert_eq!(response.provider, ProviderKind::OpenAi);
        assert_eq!(response.model, ProviderKind::OpenAi.default_model());
        assert_eq!(anthropic.models_called(), vec!["claude-opus-4-1"]);
        assert_eq!(openai.models_called(), vec!["gpt-4o"]);
    }

    #[tokio::test]
    async fn missing_primary_counts_as_unavailable() {
        let openai = MockProvider::ok(ProviderKind::OpenAi, "from openai");
        let gw = gateway(&[&openai]);

        let response = gw.invoke(request(anthropic_with_openai_fallback())).await.unwrap();
        assert_eq!(response.provider, ProviderKind::OpenAi);
    }

    #[tokio::test]
    async fn fatal_error_skips_fallback() {
        let anthropic = MockProvider::failing(
            ProviderKind::Anthropic,
            GatewayError::Unauthorized(ProviderKind::Anthropic),
        );
        let openai = MockProvider::ok(ProviderKind::OpenAi, "from openai");
        let gw = gateway(&[&anthropic, &openai]);

        let err = gw
            .invoke(request(anthropic_with_openai_fallback()))
            .await
            .unwrap_err();

        assert_eq!(err, GatewayError::Unauthorized(ProviderKind::Anthropic));
        assert!(openai.models_called().is_empty());
    }

    #[tokio::test]
    async fn no_fallback_returns_primary_error() {
        let ollama = MockProvider::failing(ProviderKind::Ollama, GatewayError::Timeout);
        let gw = gateway(&[&ollama]);

        let err = gw
            .invoke(request(ProviderRoute::new(ProviderKind::Ollama, "llama3.1")))
            .await
            .unwrap_err();
        assert_eq!(err, GatewayError::Timeout);
    }

    #[tokio::test]
    async fn empty_gateway_reports_fallback_unavailable() {
        let gw = gateway(&[]);
        assert!(!gw.has_provider(ProviderKind::Anthropic));

        let err = gw
            .invoke(request(anthropic_with_openai_fallback()))
            .await
            .unwrap_err();
        assert_eq!(err, GatewayError::ProviderUnavailable(ProviderKind::OpenAi));
    }
}
