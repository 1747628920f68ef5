//! Output of the `plan_integration` stage.

use super::PayloadError;
use super::common::require_text;
use serde::{Deserialize, Serialize};

/// One message exchanged in an integration flow.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FlowStep {
    pub from: String,
    pub to: String,
    pub message: String,
}

impl FlowStep {
    pub fn new(from: impl Into<String>, to: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            from: from.into(),
            to: to.into(),
            message: message.into(),
        }
    }
}

/// An end-to-end interaction between old and new parts of the system.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IntegrationFlow {
    pub name: String,
    #[serde(default)]
    pub description: String,
    pub steps: Vec<FlowStep>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IntegrationPayload {
    pub flows: Vec<IntegrationFlow>,
    #[serde(default)]
    pub migration_steps: Vec<String>,
    #[serde(default)]
    pub risks: Vec<String>,
}

impl IntegrationPayload {
    pub fn validate(&self) -> Result<(), PayloadError> {
        if self.flows.is_empty() {
            return Err(PayloadError::Invalid(
                "at least one integration flow is required".to_string(),
            ));
        }
        for flow in &self.flows {
            require_text("flow name", &flow.name)?;
            if flow.steps.is_empty() {
                return Err(PayloadError::Invalid(format!(
                    "flow {} has no steps",
                    flow.name
                )));
            }
            for step in &flow.steps {
                require_text("step sender", &step.from)?;
                require_text("step receiver", &step.to)?;
                require_text("step message", &step.message)?;
            }
        }
        Ok(())
    }

    pub(crate) fn completeness(&self) -> f64 {
        let filled = [!self.migration_steps.is_empty(), !self.risks.is_empty()]
            .iter()
            .filter(|b| **b)
            .count();
        0.6 + 0.2 * filled as f64
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_flow_without_steps_rejected() {
        let payload = IntegrationPayload {
            flows: vec![IntegrationFlow {
                name: "Checkout".to_string(),
                description: String::new(),
                steps: vec![],
            }],
            migration_steps: vec![],
            risks: vec![],
        };
        let err = payload.validate().unwrap_err();
        assert!(err.to_string().contains("Checkout"));
    }

    #[test]
    fn test_valid_flow() {
        let payload = IntegrationPayload {
            flows: vec![IntegrationFlow {
                name: "Checkout".to_string(),
                description: String::new(),
                steps: vec![FlowStep::new("Storefront", "Payments", "charge card")],
            }],
            migration_steps: vec!["Strangle the cart module".to_string()],
            risks: vec![],
        };
        assert!(payload.validate().is_ok());
    }
}
