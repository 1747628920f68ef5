//! Provider configuration from TOML (`[providers]` section)

use super::ConfigValidationError;
use archmesh_domain::{Environment, ProviderKind, ProviderRoute, ProviderSelection, TaskType};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Anthropic API provider configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FileAnthropicConfig {
    /// Environment variable name for the API key (default: "ANTHROPIC_API_KEY").
    pub api_key_env: String,
    /// Direct API key (not recommended; use the env var instead).
    pub api_key: Option<String>,
    /// Base URL for the Anthropic API.
    pub base_url: String,
    /// Default max tokens per response.
    pub max_tokens: u32,
    /// Anthropic API version header.
    pub api_version: String,
}

impl Default for FileAnthropicConfig {
    fn default() -> Self {
        Self {
            api_key_env: "ANTHROPIC_API_KEY".to_string(),
            api_key: None,
            base_url: "https://api.anthropic.com".to_string(),
            max_tokens: 8192,
            api_version: "2023-06-01".to_string(),
        }
    }
}

/// OpenAI API provider configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FileOpenAiConfig {
    /// Environment variable name for the API key (default: "OPENAI_API_KEY").
    pub api_key_env: String,
    /// Direct API key (not recommended; use the env var instead).
    pub api_key: Option<String>,
    /// Base URL for the OpenAI API (can be overridden for Azure OpenAI).
    pub base_url: String,
    /// Default max tokens per response.
    pub max_tokens: u32,
}

impl Default for FileOpenAiConfig {
    fn default() -> Self {
        Self {
            api_key_env: "OPENAI_API_KEY".to_string(),
            api_key: None,
            base_url: "https://api.openai.com".to_string(),
            max_tokens: 8192,
        }
    }
}

/// Ollama (local) provider configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FileOllamaConfig {
    pub base_url: String,
}

impl Default for FileOllamaConfig {
    fn default() -> Self {
        Self {
            base_url: "http://localhost:11434".to_string(),
        }
    }
}

/// Per-task route override.
///
/// ```toml
/// [providers.routes.architecture_design]
/// provider = "anthropic"
/// model = "claude-opus-4-1"
/// fallback = "openai"
/// ```
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FileRouteConfig {
    pub provider: String,
    /// Defaults to the provider's default model
    #[serde(default)]
    pub model: Option<String>,
    #[serde(default)]
    pub fallback: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FileProvidersConfig {
    /// "development" or "production"; picks the built-in route table.
    pub environment: String,
    /// Per-task overrides keyed by task type name.
    pub routes: BTreeMap<String, FileRouteConfig>,
    /// Anthropic API settings.
    pub anthropic: FileAnthropicConfig,
    /// OpenAI API settings.
    pub openai: FileOpenAiConfig,
    /// Ollama settings.
    pub ollama: FileOllamaConfig,
}

impl Default for FileProvidersConfig {
    fn default() -> Self {
        Self {
            environment: Environment::default().as_str().to_string(),
            routes: BTreeMap::new(),
            anthropic: FileAnthropicConfig::default(),
            openai: FileOpenAiConfig::default(),
            ollama: FileOllamaConfig::default(),
        }
    }
}

impl FileProvidersConfig {
    /// Build the provider selection: the environment's table plus overrides.
    pub fn to_selection(&self) -> Result<ProviderSelection, ConfigValidationError> {
        let environment: Environment = self
            .environment
            .parse()
            .map_err(|_| ConfigValidationError::UnknownEnvironment(self.environment.clone()))?;
        let mut selection = ProviderSelection::for_environment(environment);

        for (task_name, route) in &self.routes {
            let task: TaskType = task_name
                .parse()
                .map_err(|_| ConfigValidationError::UnknownTaskType(task_name.clone()))?;
            selection = selection.with_route(task, route.to_route()?);
        }
        Ok(selection)
    }
}

impl FileRouteConfig {
    fn to_route(&self) -> Result<ProviderRoute, ConfigValidationError> {
        let provider = parse_provider(&self.provider)?;
        let model = match &self.model {
            Some(model) if model.trim().is_empty() => {
                return Err(ConfigValidationError::EmptyModelName);
            }
            Some(model) => model.trim().to_string(),
            None => provider.default_model().to_string(),
        };
        let mut route = ProviderRoute::new(provider, model);
        if let Some(fallback) = &self.fallback {
            route = route.with_fallback(parse_provider(fallback)?);
        }
        Ok(route)
    }
}

fn parse_provider(name: &str) -> Result<ProviderKind, ConfigValidationError> {
    name.parse()
        .map_err(|_| ConfigValidationError::UnknownProvider(name.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_selection_is_development() {
        let selection = FileProvidersConfig::default().to_selection().unwrap();
        assert_eq!(selection.environment(), Environment::Development);
        assert_eq!(
            selection.route_for(TaskType::ArchitectureDesign).provider,
            ProviderKind::Ollama
        );
    }

    #[test]
    fn test_route_override() {
        let toml_str = r#"
environment = "production"

[routes.requirements_parsing]
provider = "anthropic"
fallback = "ollama"
"#;
        let config: FileProvidersConfig = toml::from_str(toml_str).unwrap();
        let selection = config.to_selection().unwrap();
        let route = selection.route_for(TaskType::RequirementsParsing);
        assert_eq!(route.provider, ProviderKind::Anthropic);
        assert_eq!(route.model, ProviderKind::Anthropic.default_model());
        assert_eq!(route.fallback, Some(ProviderKind::Ollama));
        // untouched tasks keep the production table
        assert_eq!(
            selection.route_for(TaskType::SystemAnalysis).provider,
            ProviderKind::OpenAi
        );
    }

    #[test]
    fn test_invalid_routes() {
        let mut config = FileProvidersConfig::default();
        config.routes.insert(
            "requirements_parsing".to_string(),
            FileRouteConfig {
                provider: "copilot".to_string(),
                ..Default::default()
            },
        );
        assert!(matches!(
            config.to_selection(),
            Err(ConfigValidationError::UnknownProvider(p)) if p == "copilot"
        ));

        let mut config = FileProvidersConfig::default();
        config.routes.insert(
            "requirements_parsing".to_string(),
            FileRouteConfig {
                provider: "openai".to_string(),
                model: Some("  ".to_string()),
                fallback: None,
            },
        );
        assert!(matches!(
            config.to_selection(),
            Err(ConfigValidationError::EmptyModelName)
        ));

        let mut config = FileProvidersConfig::default();
        config
            .routes
            .insert("deployment".to_string(), FileRouteConfig::default());
        assert!(matches!(
            config.to_selection(),
            Err(ConfigValidationError::UnknownTaskType(_))
        ));
    }
}
