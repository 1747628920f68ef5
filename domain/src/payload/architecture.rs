//! Output of the `design_architecture` stage.

use super::PayloadError;
use super::common::{Component, Relationship, check_relationships, component_names, require_text};
use serde::{Deserialize, Serialize};

/// Links a quality requirement to the components and tactic addressing it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NfrMapping {
    pub requirement: String,
    pub tactic: String,
    #[serde(default)]
    pub components: Vec<String>,
}

/// A recorded design decision.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DesignDecision {
    pub title: String,
    #[serde(default)]
    pub rationale: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ArchitecturePayload {
    /// e.g. "modular monolith", "microservices", "event-driven"
    pub style: String,
    #[serde(default)]
    pub overview: String,
    pub components: Vec<Component>,
    #[serde(default)]
    pub relationships: Vec<Relationship>,
    #[serde(default)]
    pub nfr_mappings: Vec<NfrMapping>,
    #[serde(default)]
    pub decisions: Vec<DesignDecision>,
}

impl ArchitecturePayload {
    pub fn validate(&self) -> Result<(), PayloadError> {
        require_text("style", &self.style)?;
        let names = component_names(&self.components)?;
        check_relationships(&self.relationships, &names)?;
        for mapping in &self.nfr_mappings {
            require_text("nfr mapping requirement", &mapping.requirement)?;
            for component in &mapping.components {
                if !names.contains(component.as_str()) {
                    return Err(PayloadError::Invalid(format!(
                        "nfr mapping for {} references unknown component {}",
                        mapping.requirement, component
                    )));
                }
            }
        }
        Ok(())
    }

    pub(crate) fn completeness(&self) -> f64 {
        let filled = [
            !self.relationships.is_empty(),
            !self.nfr_mappings.is_empty(),
            !self.decisions.is_empty(),
        ]
        .iter()
        .filter(|b| **b)
        .count();
        0.55 + 0.15 * filled as f64
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn payload() -> ArchitecturePayload {
        ArchitecturePayload {
            style: "modular monolith".to_string(),
            overview: String::new(),
            components: vec![
                Component::new("Web App", "Serves pages"),
                Component::new("Postgres", "Stores posts"),
            ],
            relationships: vec![Relationship::new("Web App", "Postgres")],
            nfr_mappings: vec![],
            decisions: vec![],
        }
    }

    #[test]
    fn test_valid_architecture() {
        assert!(payload().validate().is_ok());
    }

    #[test]
    fn test_empty_style_rejected() {
        let mut p = payload();
        p.style = "  ".to_string();
        assert!(p.validate().is_err());
    }

    #[test]
    fn test_nfr_mapping_must_reference_known_components() {
        let mut p = payload();
        p.nfr_mappings.push(NfrMapping {
            requirement: "availability".to_string(),
            tactic: "replication".to_string(),
            components: vec!["Redis".to_string()],
        });
        let err = p.validate().unwrap_err();
        assert!(err.to_string().contains("Redis"));
    }
}
