//! Diagram entities and requests.

use crate::core::ids::{DiagramId, ProjectId, SessionId};
use crate::payload::{Actor, Component, IntegrationFlow, NfrMapping, Relationship};
use crate::workflow::StageName;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Kind of diagram produced from a stage result.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum DiagramType {
    Context,
    Container,
    Component,
    Sequence,
    NfrMapping,
}

impl DiagramType {
    pub fn as_str(&self) -> &'static str {
        match self {
            DiagramType::Context => "context",
            DiagramType::Container => "container",
            DiagramType::Component => "component",
            DiagramType::Sequence => "sequence",
            DiagramType::NfrMapping => "nfr-mapping",
        }
    }
}

impl std::fmt::Display for DiagramType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Source language of a diagram.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DiagramFormat {
    #[default]
    Plantuml,
    Mermaid,
}

impl DiagramFormat {
    pub fn as_str(&self) -> &'static str {
        match self {
            DiagramFormat::Plantuml => "plantuml",
            DiagramFormat::Mermaid => "mermaid",
        }
    }
}

impl std::fmt::Display for DiagramFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl std::str::FromStr for DiagramFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "plantuml" | "puml" => Ok(DiagramFormat::Plantuml),
            "mermaid" | "mmd" => Ok(DiagramFormat::Mermaid),
            other => Err(format!("unknown diagram format: {}", other)),
        }
    }
}

/// The subset of a stage payload a diagram is drawn from.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DiagramContext {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub system_name: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub actors: Vec<Actor>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub components: Vec<Component>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub relationships: Vec<Relationship>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub flow: Option<IntegrationFlow>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub nfr_mappings: Vec<NfrMapping>,
}

/// A request to render one diagram.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DiagramRequest {
    pub stage: StageName,
    pub diagram_type: DiagramType,
    pub format: DiagramFormat,
    pub title: String,
    pub context: DiagramContext,
}

/// A rendered diagram (Entity).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DiagramArtifact {
    pub id: DiagramId,
    pub project_id: ProjectId,
    pub session_id: SessionId,
    pub stage: StageName,
    pub diagram_type: DiagramType,
    pub format: DiagramFormat,
    pub title: String,
    pub source: String,
    pub editable: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl DiagramArtifact {
    pub fn new(
        project_id: ProjectId,
        session_id: SessionId,
        request: &DiagramRequest,
        source: impl Into<String>,
        now: DateTime<Utc>,
    ) -> Self {
        Self {
            id: DiagramId::generate(),
            project_id,
            session_id,
            stage: request.stage,
            diagram_type: request.diagram_type,
            format: request.format,
            title: request.title.clone(),
            source: source.into(),
            editable: true,
            created_at: now,
            updated_at: now,
        }
    }

    pub fn locked(mut self) -> Self {
        self.editable = false;
        self
    }

    /// Replace the source after a user edit. Header validation is the caller's job.
    pub fn edit(&mut self, source: impl Into<String>, now: DateTime<Utc>) {
        self.source = source.into();
        self.updated_at = now;
    }
}
