//! Provider selection types.
//!
//! A [`ProviderSelection`] maps each [`TaskType`] to a [`ProviderRoute`]
//! (provider, model, fallback provider). It is built once from configuration
//! and handed to the stage executor; nothing reads provider choice from
//! process-wide state.

use crate::core::error::DomainError;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// LLM provider families the gateway can route to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ProviderKind {
    Anthropic,
    OpenAi,
    /// Local models served by Ollama. Free, used by default in development.
    Ollama,
}

impl ProviderKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ProviderKind::Anthropic => "anthropic",
            ProviderKind::OpenAi => "openai",
            ProviderKind::Ollama => "ollama",
        }
    }

    /// Model used when this provider is reached as a fallback.
    pub fn default_model(&self) -> &'static str {
        match self {
            ProviderKind::Anthropic => "claude-sonnet-4-5",
            ProviderKind::OpenAi => "gpt-4o",
            ProviderKind::Ollama => "llama3.1",
        }
    }
}

impl std::fmt::Display for ProviderKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl std::str::FromStr for ProviderKind {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "anthropic" => Ok(ProviderKind::Anthropic),
            "openai" => Ok(ProviderKind::OpenAi),
            "ollama" => Ok(ProviderKind::Ollama),
            other => Err(DomainError::UnknownProvider(other.to_string())),
        }
    }
}

/// Deployment environment; decides the default provider table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum Environment {
    #[default]
    Development,
    Production,
}

impl Environment {
    pub fn as_str(&self) -> &'static str {
        match self {
            Environment::Development => "development",
            Environment::Production => "production",
        }
    }
}

impl std::str::FromStr for Environment {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "development" | "dev" => Ok(Environment::Development),
            "production" | "prod" => Ok(Environment::Production),
            other => Err(format!("unknown environment: {}", other)),
        }
    }
}

/// Kind of LLM work a stage asks the gateway to perform.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TaskType {
    RequirementsParsing,
    SystemAnalysis,
    ArchitectureDesign,
    IntegrationPlanning,
}

impl TaskType {
    pub const ALL: [TaskType; 4] = [
        TaskType::RequirementsParsing,
        TaskType::SystemAnalysis,
        TaskType::ArchitectureDesign,
        TaskType::IntegrationPlanning,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            TaskType::RequirementsParsing => "requirements_parsing",
            TaskType::SystemAnalysis => "system_analysis",
            TaskType::ArchitectureDesign => "architecture_design",
            TaskType::IntegrationPlanning => "integration_planning",
        }
    }
}

impl std::fmt::Display for TaskType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl std::str::FromStr for TaskType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        TaskType::ALL
            .into_iter()
            .find(|t| t.as_str() == s.trim())
            .ok_or_else(|| format!("unknown task type: {}", s))
    }
}

/// Where a task is sent: primary provider/model plus an optional fallback.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProviderRoute {
    pub provider: ProviderKind,
    pub model: String,
    pub fallback: Option<ProviderKind>,
}

impl ProviderRoute {
    pub fn new(provider: ProviderKind, model: impl Into<String>) -> Self {
        Self {
            provider,
            model: model.into(),
            fallback: None,
        }
    }

    pub fn with_fallback(mut self, fallback: ProviderKind) -> Self {
        self.fallback = Some(fallback);
        self
    }
}

/// Task type → provider route table for one environment.
#[derive(Debug, Clone, PartialEq)]
pub struct ProviderSelection {
    environment: Environment,
    routes: HashMap<TaskType, ProviderRoute>,
}

impl ProviderSelection {
    /// Built-in table for an environment.
    ///
    /// Development prefers the local Ollama provider for everything.
    /// Production sends design-heavy tasks to Anthropic and extraction tasks
    /// to OpenAI, each falling back to the other.
    pub fn for_environment(environment: Environment) -> Self {
        let routes = TaskType::ALL
            .into_iter()
            .map(|task| (task, Self::default_route(environment, task)))
            .collect();
        Self {
            environment,
            routes,
        }
    }

    fn default_route(environment: Environment, task: TaskType) -> ProviderRoute {
        match (environment, task) {
            (Environment::Development, _) => {
                ProviderRoute::new(ProviderKind::Ollama, "llama3.1")
                    .with_fallback(ProviderKind::OpenAi)
            }
            (
                Environment::Production,
                TaskType::RequirementsParsing | TaskType::SystemAnalysis,
            ) => ProviderRoute::new(ProviderKind::OpenAi, "gpt-4o")
                .with_fallback(ProviderKind::Anthropic),
            (
                Environment::Production,
                TaskType::ArchitectureDesign | TaskType::IntegrationPlanning,
            ) => ProviderRoute::new(ProviderKind::Anthropic, "claude-sonnet-4-5")
                .with_fallback(ProviderKind::OpenAi),
        }
    }

    /// Override the route for a single task type.
    pub fn with_route(mut self, task: TaskType, route: ProviderRoute) -> Self {
        self.routes.insert(task, route);
        self
    }

    pub fn environment(&self) -> Environment {
        self.environment
    }

    pub fn route_for(&self, task: TaskType) -> ProviderRoute {
        self.routes
            .get(&task)
            .cloned()
            .unwrap_or_else(|| Self::default_route(self.environment, task))
    }
}

impl Default for ProviderSelection {
    fn default() -> Self {
        Self::for_environment(Environment::default())
    }
}
