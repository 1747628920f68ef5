//! Building blocks shared by several stage payloads.

use super::PayloadError;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;

/// Someone or something interacting with the system.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Actor {
    pub name: String,
    #[serde(default)]
    pub description: String,
    /// External systems are drawn differently from people
    #[serde(default)]
    pub external: bool,
}

impl Actor {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            description: String::new(),
            external: false,
        }
    }
}

/// Coarse classification of a component.
///
/// Deserializes from any string; unrecognised kinds are kept verbatim.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(from = "String", into = "String")]
pub enum ComponentKind {
    #[default]
    Service,
    Frontend,
    Database,
    Queue,
    Cache,
    External,
    Other(String),
}

impl ComponentKind {
    pub fn as_str(&self) -> &str {
        match self {
            ComponentKind::Service => "service",
            ComponentKind::Frontend => "frontend",
            ComponentKind::Database => "database",
            ComponentKind::Queue => "queue",
            ComponentKind::Cache => "cache",
            ComponentKind::External => "external",
            ComponentKind::Other(s) => s,
        }
    }
}

impl From<String> for ComponentKind {
    fn from(s: String) -> Self {
        match s.trim().to_ascii_lowercase().as_str() {
            "service" | "api" | "backend" | "" => ComponentKind::Service,
            "frontend" | "ui" | "web" | "spa" => ComponentKind::Frontend,
            "database" | "db" | "datastore" | "storage" => ComponentKind::Database,
            "queue" | "broker" | "message_queue" => ComponentKind::Queue,
            "cache" => ComponentKind::Cache,
            "external" | "third_party" => ComponentKind::External,
            _ => ComponentKind::Other(s),
        }
    }
}

impl From<ComponentKind> for String {
    fn from(kind: ComponentKind) -> Self {
        kind.as_str().to_string()
    }
}

/// A deployable or logical building block.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Component {
    pub name: String,
    #[serde(default)]
    pub responsibility: String,
    #[serde(default)]
    pub technology: Option<String>,
    #[serde(default)]
    pub kind: ComponentKind,
}

impl Component {
    pub fn new(name: impl Into<String>, responsibility: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            responsibility: responsibility.into(),
            technology: None,
            kind: ComponentKind::default(),
        }
    }

    pub fn with_kind(mut self, kind: ComponentKind) -> Self {
        self.kind = kind;
        self
    }

    pub fn with_technology(mut self, technology: impl Into<String>) -> Self {
        self.technology = Some(technology.into());
        self
    }
}

/// A directed dependency between two components.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Relationship {
    pub from: String,
    pub to: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub protocol: Option<String>,
}

impl Relationship {
    pub fn new(from: impl Into<String>, to: impl Into<String>) -> Self {
        Self {
            from: from.into(),
            to: to.into(),
            description: String::new(),
            protocol: None,
        }
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }
}

pub(crate) fn require_text(field: &str, value: &str) -> Result<(), PayloadError> {
    if value.trim().is_empty() {
        return Err(PayloadError::Invalid(format!("{} must not be empty", field)));
    }
    Ok(())
}

/// Checks component names are non-empty and unique; returns the name set.
pub(crate) fn component_names(components: &[Component]) -> Result<HashSet<&str>, PayloadError> {
    if components.is_empty() {
        return Err(PayloadError::Invalid(
            "at least one component is required".to_string(),
        ));
    }
    let mut names = HashSet::new();
    for component in components {
        require_text("component name", &component.name)?;
        if !names.insert(component.name.as_str()) {
            return Err(PayloadError::Invalid(format!(
                "duplicate component name: {}",
                component.name
            )));
        }
    }
    Ok(names)
}

pub(crate) fn check_relationships(
    relationships: &[Relationship],
    names: &HashSet<&str>,
) -> Result<(), PayloadError> {
    for rel in relationships {
        for endpoint in [&rel.from, &rel.to] {
            if !names.contains(endpoint.as_str()) {
                return Err(PayloadError::Invalid(format!(
                    "relationship {} -> {} references unknown component {}",
                    rel.from, rel.to, endpoint
                )));
            }
        }
    }
    Ok(())
}
