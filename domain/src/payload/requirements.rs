//! Output of the `parse_requirements` stage.

use super::PayloadError;
use super::common::{Actor, require_text};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;

/// A functional requirement extracted from the input document.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Requirement {
    pub id: String,
    pub description: String,
    /// MoSCoW-style priority as written by the model
    #[serde(default)]
    pub priority: Option<String>,
}

impl Requirement {
    pub fn new(id: impl Into<String>, description: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            description: description.into(),
            priority: None,
        }
    }
}

/// A non-functional (quality attribute) requirement.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QualityRequirement {
    /// e.g. "performance", "availability", "security"
    pub category: String,
    pub description: String,
    #[serde(default)]
    pub target: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RequirementsPayload {
    pub summary: String,
    #[serde(default)]
    pub actors: Vec<Actor>,
    #[serde(default, alias = "functional_requirements")]
    pub functional: Vec<Requirement>,
    #[serde(default, alias = "non_functional_requirements")]
    pub non_functional: Vec<QualityRequirement>,
    #[serde(default)]
    pub constraints: Vec<String>,
}

impl RequirementsPayload {
    pub fn validate(&self) -> Result<(), PayloadError> {
        require_text("summary", &self.summary)?;
        if self.functional.is_empty() {
            return Err(PayloadError::Invalid(
                "at least one functional requirement is required".to_string(),
            ));
        }
        let mut ids = HashSet::new();
        for req in &self.functional {
            require_text("requirement id", &req.id)?;
            require_text("requirement description", &req.description)?;
            if !ids.insert(req.id.as_str()) {
                return Err(PayloadError::Invalid(format!(
                    "duplicate requirement id: {}",
                    req.id
                )));
            }
        }
        for actor in &self.actors {
            require_text("actor name", &actor.name)?;
        }
        for nfr in &self.non_functional {
            require_text("quality requirement category", &nfr.category)?;
        }
        Ok(())
    }

    pub(crate) fn completeness(&self) -> f64 {
        let filled = [
            !self.actors.is_empty(),
            !self.non_functional.is_empty(),
            !self.constraints.is_empty(),
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

    fn payload() -> RequirementsPayload {
        RequirementsPayload {
            summary: "Blog platform".to_string(),
            actors: vec![Actor::new("Author"), Actor::new("Reader")],
            functional: vec![
                Requirement::new("FR-1", "Authors publish posts"),
                Requirement::new("FR-2", "Readers comment on posts"),
            ],
            non_functional: vec![],
            constraints: vec![],
        }
    }

    #[test]
    fn test_valid_payload() {
        assert!(payload().validate().is_ok());
    }

    #[test]
    fn test_requires_functional_requirements() {
        let mut p = payload();
        p.functional.clear();
        assert!(p.validate().is_err());
    }

    #[test]
    fn test_duplicate_ids_rejected() {
        let mut p = payload();
        p.functional[1].id = "FR-1".to_string();
        let err = p.validate().unwrap_err();
        assert!(err.to_string().contains("FR-1"));
    }

    #[test]
    fn test_accepts_long_field_aliases() {
        let json = r#"{
            "summary": "Shop",
            "functional_requirements": [{"id": "1", "description": "Checkout"}],
            "non_functional_requirements": [{"category": "performance", "description": "p95 < 200ms"}]
        }"#;
        let p: RequirementsPayload = serde_json::from_str(json).unwrap();
        assert_eq!(p.functional.len(), 1);
        assert_eq!(p.non_functional[0].category, "performance");
        assert!(p.validate().is_ok());
    }

    #[test]
    fn test_completeness_grows_with_detail() {
        let sparse = payload();
        let mut rich = payload();
        rich.constraints.push("Must run on AWS".to_string());
        assert!(rich.completeness() > sparse.completeness());
    }
}
