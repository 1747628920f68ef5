//! Workflow modes.

use super::stage::StageName;
use crate::core::error::DomainError;
use serde::{Deserialize, Serialize};

/// Greenfield designs a new system; brownfield extends an existing one.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum WorkflowMode {
    Greenfield,
    Brownfield,
}

impl WorkflowMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            WorkflowMode::Greenfield => "greenfield",
            WorkflowMode::Brownfield => "brownfield",
        }
    }

    /// Ordered stage list for this mode.
    pub fn stages(&self) -> Vec<StageName> {
        match self {
            WorkflowMode::Greenfield => {
                vec![StageName::ParseRequirements, StageName::DesignArchitecture]
            }
            WorkflowMode::Brownfield => vec![
                StageName::AnalyzeExistingSystem,
                StageName::ParseRequirements,
                StageName::DesignArchitecture,
                StageName::PlanIntegration,
            ],
        }
    }
}

impl std::fmt::Display for WorkflowMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl std::str::FromStr for WorkflowMode {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "greenfield" => Ok(WorkflowMode::Greenfield),
            "brownfield" => Ok(WorkflowMode::Brownfield),
            _ => Err(DomainError::InvalidMode(s.to_string())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_greenfield_stages() {
        assert_eq!(
            WorkflowMode::Greenfield.stages(),
            vec![StageName::ParseRequirements, StageName::DesignArchitecture]
        );
    }

    #[test]
    fn test_every_dependency_precedes_its_stage() {
        for mode in [WorkflowMode::Greenfield, WorkflowMode::Brownfield] {
            let stages = mode.stages();
            for (index, stage) in stages.iter().enumerate() {
                for dep in stage.dependencies() {
                    let dep_index = stages.iter().position(|s| s == dep);
                    assert!(
                        matches!(dep_index, Some(i) if i < index),
                        "{} depends on {} in {} mode",
                        stage,
                        dep,
                        mode
                    );
                }
            }
        }
    }

    #[test]
    fn test_parse_mode() {
        assert_eq!(
            "Brownfield".parse::<WorkflowMode>().unwrap(),
            WorkflowMode::Brownfield
        );
        assert_eq!(
            "bluefield".parse::<WorkflowMode>(),
            Err(DomainError::InvalidMode("bluefield".to_string()))
        );
    }
}
