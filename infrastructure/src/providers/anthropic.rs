//! Anthropic Messages API adapter.

use super::ProviderAdapter;
use super::http::send_json;
use crate::config::FileAnthropicConfig;
use archmesh_application::ports::llm_gateway::GatewayError;
use archmesh_domain::ProviderKind;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tracing::debug;

pub struct AnthropicAdapter {
    client: reqwest::Client,
    api_key: String,
    endpoint: String,
    api_version: String,
    max_tokens: u32,
}

impl AnthropicAdapter {
    pub fn new(client: reqwest::Client, api_key: String, config: &FileAnthropicConfig) -> Self {
        Self {
            client,
            api_key,
            endpoint: format!("{}/v1/messages", config.base_url.trim_end_matches('/')),
            api_version: config.api_version.clone(),
            max_tokens: config.max_tokens,
        }
    }
}

#[derive(Serialize)]
struct MessagesRequest<'a> {
    model: &'a str,
    max_tokens: u32,
    system: &'a str,
    messages: [Message<'a>; 1],
}

#[derive(Serialize)]
struct Message<'a> {
    role: &'static str,
    content: &'a str,
}

#[derive(Deserialize)]
struct MessagesResponse {
    content: Vec<ContentBlock>,
    #[serde(default)]
    stop_reason: Option<String>,
}

#[derive(Deserialize)]
struct ContentBlock {
    #[serde(rename = "type")]
    block_type: String,
    #[serde(default)]
    text: Option<String>,
}

fn extract_text(response: MessagesResponse) -> Result<String, GatewayError> {
    if response.stop_reason.as_deref() == Some("refusal") {
        return Err(GatewayError::ContentPolicy(
            "anthropic refused the request".to_string(),
        ));
    }
    let text: String = response
        .content
        .into_iter()
        .filter(|block| block.block_type == "text")
        .filter_map(|block| block.text)
        .collect();
    if text.trim().is_empty() {
        return Err(GatewayError::InvalidResponse(
            "anthropic response has no text content".to_string(),
        ));
    }
    Ok(text)
}

#[async_trait]
impl ProviderAdapter for AnthropicAdapter {
    fn kind(&self) -> ProviderKind {
        ProviderKind::Anthropic
    }

    async fn complete(
        &self,
        model: &str,
        system_prompt: &str,
        prompt: &str,
    ) -> Result<String, GatewayError> {
        debug!(provider = "anthropic", model, "Sending messages request");

        let body = MessagesRequest {
            model,
            max_tokens: self.max_tokens,
            system: system_prompt,
            messages: [Message {
                role: "user",
                content: prompt,
            }],
        };
        let request = self
            .client
            .post(&self.endpoint)
            .header("x-api-key", &self.api_key)
            .header("anthropic-version", &self.api_version)
            .json(&body);

        let response: MessagesResponse = send_json(ProviderKind::Anthropic, request).await?;
        extract_text(response)
    }
}
