//! Shared helpers for the HTTP provider adapters.

use archmesh_application::ports::llm_gateway::GatewayError;
use archmesh_domain::ProviderKind;

/// Longest slice of an error body kept in a [`GatewayError`].
const MAX_ERROR_BODY: usize = 500;

/// Map a non-success HTTP status to a gateway error.
pub fn status_error(kind: ProviderKind, status: u16, body: &str) -> GatewayError {
    match status {
        401 | 403 => GatewayError::Unauthorized(kind),
        429 => GatewayError::RateLimited(kind),
        _ if mentions_content_policy(body) => GatewayError::ContentPolicy(truncate(body)),
        _ => GatewayError::RequestFailed {
            status: Some(status),
            message: format!("{}: {}", kind, truncate(body)),
        },
    }
}

fn mentions_content_policy(body: &str) -> bool {
    let lower = body.to_ascii_lowercase();
    lower.contains("content_policy") || lower.contains("content_filter")
}

fn truncate(body: &str) -> String {
    let trimmed = body.trim();
    match trimmed.char_indices().nth(MAX_ERROR_BODY) {
        Some((idx, _)) => format!("{}...", &trimmed[..idx]),
        None => trimmed.to_string(),
    }
}

/// API key from the config file, else from the named environment variable.
pub fn resolve_api_key(direct: Option<&str>, env_name: &str) -> Option<String> {
    direct
        .map(str::to_string)
        .or_else(|| std::env::var(env_name).ok())
        .filter(|key| !key.trim().is_empty())
}

#[cfg(feature = "http-providers")]
pub(crate) fn transport_error(kind: ProviderKind, err: reqwest::Error) -> GatewayError {
    if err.is_timeout() {
        GatewayError::Timeout
    } else if err.is_connect() {
        GatewayError::ProviderUnavailable(kind)
    } else if let Some(status) = err.status() {
        status_error(kind, status.as_u16(), &err.to_string())
    } else if err.is_decode() {
        GatewayError::InvalidResponse(format!("{}: {}", kind, err))
    } else {
        GatewayError::ConnectionError(format!("{}: {}", kind, err))
    }
}

/// Send a JSON request and decode a JSON response, mapping failures.
#[cfg(feature = "http-providers")]
pub(crate) async fn send_json<T: serde::de::DeserializeOwned>(
    kind: ProviderKind,
    request: reqwest::RequestBuilder,
) -> Result<T, GatewayError> {
    let response = request
        .send()
        .await
        .map_err(|e| transport_error(kind, e))?;

    let status = response.status();
    if !status.is_success() {
        let body = response.text().await.unwrap_or_default();
        return Err(status_error(kind, status.as_u16(), &body));
    }

    response
        .json::<T>()
        .await
        .map_err(|e| GatewayError::InvalidResponse(format!("{}: {}", kind, e)))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_classification() {
        assert_eq!(
            status_error(ProviderKind::Anthropic, 401, ""),
            GatewayError::Unauthorized(ProviderKind::Anthropic)
        );
        assert_eq!(
            status_error(ProviderKind::OpenAi, 429, "slow down"),
            GatewayError::RateLimited(ProviderKind::OpenAi)
        );
        assert!(matches!(
            status_error(ProviderKind::OpenAi, 400, r#"{"code":"content_filter"}"#),
            GatewayError::ContentPolicy(_)
        ));

        let overloaded = status_error(ProviderKind::Anthropic, 529, "overloaded");
        assert!(overloaded.is_retryable());
        let bad = status_error(ProviderKind::Ollama, 404, "model not found");
        assert!(!bad.is_retryable());
    }

    #[test]
    fn test_error_body_is_truncated() {
        let body = "x".repeat(2000);
        let GatewayError::RequestFailed { message, .. } =
            status_error(ProviderKind::Ollama, 500, &body)
        else {
            panic!("expected RequestFailed");
        };
        assert!(message.len() < 600);
        assert!(message.ends_with("..."));
    }

    #[test]
    fn test_resolve_api_key_prefers_direct_value() {
        assert_eq!(
            resolve_api_key(Some("sk-direct"), "ARCHMESH_TEST_UNSET_KEY"),
            Some("sk-direct".to_string())
        );
        assert_eq!(resolve_api_key(Some("  "), "ARCHMESH_TEST_UNSET_KEY"), None);
        assert_eq!(resolve_api_key(None, "ARCHMESH_TEST_UNSET_KEY"), None);
    }
}
