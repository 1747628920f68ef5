//! Output of the `analyze_existing_system` stage.

use super::PayloadError;
use super::common::{Component, Relationship, check_relationships, component_names, require_text};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExistingSystemPayload {
    pub summary: String,
    pub components: Vec<Component>,
    #[serde(default)]
    pub relationships: Vec<Relationship>,
    #[serde(default)]
    pub technologies: Vec<String>,
    #[serde(default)]
    pub pain_points: Vec<String>,
}

impl ExistingSystemPayload {
    pub fn validate(&self) -> Result<(), PayloadError> {
        require_text("summary", &self.summary)?;
        let names = component_names(&self.components)?;
        check_relationships(&self.relationships, &names)
    }

    pub(crate) fn completeness(&self) -> f64 {
        let filled = [
            !self.relationships.is_empty(),
            !self.technologies.is_empty(),
            !self.pain_points.is_empty(),
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

    #[test]
    fn test_requires_components() {
        let payload = ExistingSystemPayload {
            summary: "Legacy monolith".to_string(),
            components: vec![],
            relationships: vec![],
            technologies: vec!["PHP".to_string()],
            pain_points: vec![],
        };
        assert!(payload.validate().is_err());
    }

    #[test]
    fn test_valid_monolith() {
        let payload = ExistingSystemPayload {
            summary: "Legacy monolith".to_string(),
            components: vec![
                Component::new("Monolith", "Everything"),
                Component::new("MySQL", "Storage"),
            ],
            relationships: vec![Relationship::new("Monolith", "MySQL")],
            technologies: vec![],
            pain_points: vec!["Slow deploys".to_string()],
        };
        assert!(payload.validate().is_ok());
    }
}
