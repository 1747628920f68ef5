//! Ollama local chat adapter.

use super::ProviderAdapter;
use super::http::send_json;
use crate::config::FileOllamaConfig;
use archmesh_application::ports::llm_gateway::GatewayError;
use archmesh_domain::ProviderKind;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tracing::debug;

pub struct OllamaAdapter {
    client: reqwest::Client,
    endpoint: String,
}

impl OllamaAdapter {
    pub fn new(client: reqwest::Client, config: &FileOllamaConfig) -> Self {
        Self {
            client,
            endpoint: format!("{}/api/chat", config.base_url.trim_end_matches('/')),
        }
    }
}

#[derive(Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    stream: bool,
    format: &'static str,
    messages: [ChatMessage<'a>; 2],
}

#[derive(Serialize)]
struct ChatMessage<'a> {
    role: &'static str,
    content: &'a str,
}

#[derive(Deserialize)]
struct ChatResponse {
    message: ReplyMessage,
}

#[derive(Deserialize)]
struct ReplyMessage {
    content: String,
}

#[async_trait]
impl ProviderAdapter for OllamaAdapter {
    fn kind(&self) -> ProviderKind {
        ProviderKind::Ollama
    }

    async fn complete(
        &self,
        model: &str,
        system_prompt: &str,
        prompt: &str,
    ) -> Result<String, GatewayError> {
        debug!(provider = "ollama", model, "Sending local chat request");

        let body = ChatRequest {
            model,
            stream: false,
            format: "json",
            messages: [
                ChatMessage {
                    role: "system",
                    content: system_prompt,
                },
                ChatMessage {
                    role: "user",
                    content: prompt,
                },
            ],
        };
        let request = self.client.post(&self.endpoint).json(&body);

        let response: ChatResponse = send_json(ProviderKind::Ollama, request).await?;
        if response.message.content.trim().is_empty() {
            return Err(GatewayError::InvalidResponse(
                "ollama reply is empty".to_string(),
            ));
        }
        Ok(response.message.content)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_request_shape() {
        let body = ChatRequest {
            model: "llama3.1",
            stream: false,
            format: "json",
            messages: [
                ChatMessage {
                    role: "system",
                    content: "sys",
                },
                ChatMessage {
                    role: "user",
                    content: "hi",
                },
            ],
        };
        let value = serde_json::to_value(&body).unwrap();
        assert_eq!(value["stream"], false);
        assert_eq!(value["messages"][1]["content"], "hi");
    }

    #[tokio::test]
    async fn test_unreachable_server_is_retryable() {
        let config = FileOllamaConfig {
            base_url: "http://127.0.0.1:9".to_string(),
        };
        let adapter = OllamaAdapter::new(reqwest::Client::new(), &config);
        let err = adapter.complete("llama3.1", "s", "p").await.unwrap_err();
        assert!(err.is_retryable(), "unexpected error: {err:?}");
    }
}
