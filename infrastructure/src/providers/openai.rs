//! OpenAI chat completions adapter.

use super::ProviderAdapter;
use super::http::send_json;
use crate::config::FileOpenAiConfig;
use archmesh_application::ports::llm_gateway::GatewayError;
use archmesh_domain::ProviderKind;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tracing::debug;

pub struct OpenAiAdapter {
    client: reqwest::Client,
    api_key: String,
    endpoint: String,
    max_tokens: u32,
}

impl OpenAiAdapter {
    pub fn new(client: reqwest::Client, api_key: String, config: &FileOpenAiConfig) -> Self {
        Self {
            client,
            api_key,
            endpoint: format!(
                "{}/v1/chat/completions",
                config.base_url.trim_end_matches('/')
            ),
            max_tokens: config.max_tokens,
        }
    }
}

#[derive(Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    max_tokens: u32,
    messages: [ChatMessage<'a>; 2],
}

#[derive(Serialize)]
struct ChatMessage<'a> {
    role: &'static str,
    content: &'a str,
}

#[derive(Deserialize)]
struct ChatResponse {
    choices: Vec<Choice>,
}

#[derive(Deserialize)]
struct Choice {
    message: ReplyMessage,
    #[serde(default)]
    finish_reason: Option<String>,
}

#[derive(Deserialize)]
struct ReplyMessage {
    #[serde(default)]
    content: Option<String>,
}

fn extract_text(response: ChatResponse) -> Result<String, GatewayError> {
    let choice = response.choices.into_iter().next().ok_or_else(|| {
        GatewayError::InvalidResponse("openai response has no choices".to_string())
    })?;
    if choice.finish_reason.as_deref() == Some("content_filter") {
        return Err(GatewayError::ContentPolicy(
            "openai filtered the completion".to_string(),
        ));
    }
    choice
        .message
        .content
        .filter(|text| !text.trim().is_empty())
        .ok_or_else(|| GatewayError::InvalidResponse("openai reply is empty".to_string()))
}

#[async_trait]
impl ProviderAdapter for OpenAiAdapter {
    fn kind(&self) -> ProviderKind {
        ProviderKind::OpenAi
    }

    async fn complete(
        &self,
        model: &str,
        system_prompt: &str,
        prompt: &str,
    ) -> Result<String, GatewayError> {
        debug!(provider = "openai", model, "Sending chat completion request");

        let body = ChatRequest {
            model,
            max_tokens: self.max_tokens,
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
        let request = self
            .client
            .post(&self.endpoint)
            .bearer_auth(&self.api_key)
            .json(&body);

        let response: ChatResponse = send_json(ProviderKind::OpenAi, request).await?;
        extract_text(response)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_extract_first_choice() {
        let response: ChatResponse = serde_json::from_str(
            r#"{"choices":[{"message":{"role":"assistant","content":"hello"},"finish_reason":"stop"}]}"#,
        )
        .unwrap();
        assert_eq!(extract_text(response).unwrap(), "hello");
    }

    #[test]
    fn test_content_filter_and_empty_choices() {
        let filtered: ChatResponse = serde_json::from_str(
            r#"{"choices":[{"message":{"content":null},"finish_reason":"content_filter"}]}"#,
        )
        .unwrap();
        assert!(matches!(
            extract_text(filtered),
            Err(GatewayError::ContentPolicy(_))
        ));

        let none: ChatResponse = serde_json::from_str(r#"{"choices":[]}"#).unwrap();
        assert!(matches!(
            extract_text(none),
            Err(GatewayError::InvalidResponse(_))
        ));
    }
}
