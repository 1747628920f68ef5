//! Pipeline stages.

use crate::core::error::DomainError;
use crate::providers::TaskType;
use serde::{Deserialize, Serialize};

/// A named step in a workflow.
///
/// The set is closed: every stage has a fixed payload schema, a fixed list of
/// upstream stages it reads from, and a task type used for provider routing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StageName {
    /// Describe the system being extended (brownfield only)
    AnalyzeExistingSystem,
    /// Extract actors and requirements from the input document
    ParseRequirements,
    /// Propose components, relationships and quality tactics
    DesignArchitecture,
    /// Plan how the new design plugs into the existing system
    PlanIntegration,
}

impl StageName {
    pub const ALL: [StageName; 4] = [
        StageName::AnalyzeExistingSystem,
        StageName::ParseRequirements,
        StageName::DesignArchitecture,
        StageName::PlanIntegration,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            StageName::AnalyzeExistingSystem => "analyze_existing_system",
            StageName::ParseRequirements => "parse_requirements",
            StageName::DesignArchitecture => "design_architecture",
            StageName::PlanIntegration => "plan_integration",
        }
    }

    pub fn display_name(&self) -> &'static str {
        match self {
            StageName::AnalyzeExistingSystem => "Existing System Analysis",
            StageName::ParseRequirements => "Requirements Parsing",
            StageName::DesignArchitecture => "Architecture Design",
            StageName::PlanIntegration => "Integration Planning",
        }
    }

    /// Upstream stages whose results must be present before this stage runs.
    pub fn dependencies(&self) -> &'static [StageName] {
        match self {
            StageName::AnalyzeExistingSystem | StageName::ParseRequirements => &[],
            StageName::DesignArchitecture => &[StageName::ParseRequirements],
            StageName::PlanIntegration => &[
                StageName::AnalyzeExistingSystem,
                StageName::DesignArchitecture,
            ],
        }
    }

    pub fn task_type(&self) -> TaskType {
        match self {
            StageName::AnalyzeExistingSystem => TaskType::SystemAnalysis,
            StageName::ParseRequirements => TaskType::RequirementsParsing,
            StageName::DesignArchitecture => TaskType::ArchitectureDesign,
            StageName::PlanIntegration => TaskType::IntegrationPlanning,
        }
    }
}

impl std::fmt::Display for StageName {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl std::str::FromStr for StageName {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        StageName::ALL
            .into_iter()
            .find(|stage| stage.as_str() == s.trim())
            .ok_or_else(|| DomainError::UnknownStage(s.to_string()))
    }
}

/// What happens after a stage produces a valid result.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StagePolicy {
    /// Move straight on to the next stage
    AutoAdvance,
    /// Pause until a human approves, rejects, or requests changes
    RequireReview,
}
