//! Stage payloads: the validated, typed output of each stage.
//!
//! Each [`StageName`] has exactly one payload variant. Model output is parsed
//! with [`parse_stage_output`] and must pass the variant's `validate()` before
//! the workflow accepts it.

pub mod architecture;
pub mod common;
pub mod existing_system;
pub mod integration;
pub mod parsing;
pub mod requirements;

use crate::workflow::stage::StageName;
use serde::{Deserialize, Serialize};
use thiserror::Error;

pub use architecture::{ArchitecturePayload, DesignDecision, NfrMapping};
pub use common::{Actor, Component, ComponentKind, Relationship};
pub use existing_system::ExistingSystemPayload;
pub use integration::{FlowStep, IntegrationFlow, IntegrationPayload};
pub use parsing::{ParsedOutput, extract_json, parse_stage_output};
pub use requirements::{QualityRequirement, Requirement, RequirementsPayload};

/// Why model output could not be turned into a payload.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum PayloadError {
    #[error("No JSON object found in model output")]
    NoJson,

    #[error("Output does not match the {stage} schema: {message}")]
    Schema { stage: StageName, message: String },

    #[error("Invalid payload: {0}")]
    Invalid(String),
}

/// Validated output of one stage.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum StagePayload {
    ExistingSystem(ExistingSystemPayload),
    Requirements(RequirementsPayload),
    Architecture(ArchitecturePayload),
    Integration(IntegrationPayload),
}

impl StagePayload {
    /// The stage that produces this variant.
    pub fn stage(&self) -> StageName {
        match self {
            StagePayload::ExistingSystem(_) => StageName::AnalyzeExistingSystem,
            StagePayload::Requirements(_) => StageName::ParseRequirements,
            StagePayload::Architecture(_) => StageName::DesignArchitecture,
            StagePayload::Integration(_) => StageName::PlanIntegration,
        }
    }

    pub fn validate(&self) -> Result<(), PayloadError> {
        match self {
            StagePayload::ExistingSystem(p) => p.validate(),
            StagePayload::Requirements(p) => p.validate(),
            StagePayload::Architecture(p) => p.validate(),
            StagePayload::Integration(p) => p.validate(),
        }
    }

    /// Heuristic quality score in `0.0..=1.0`, used when the model does not
    /// report its own confidence.
    pub fn completeness(&self) -> f64 {
        match self {
            StagePayload::ExistingSystem(p) => p.completeness(),
            StagePayload::Requirements(p) => p.completeness(),
            StagePayload::Architecture(p) => p.completeness(),
            StagePayload::Integration(p) => p.completeness(),
        }
    }

    /// One-line description for status output.
    pub fn summary(&self) -> String {
        match self {
            StagePayload::ExistingSystem(p) => format!(
                "{} existing components, {} pain points",
                p.components.len(),
                p.pain_points.len()
            ),
            StagePayload::Requirements(p) => format!(
                "{} actors, {} functional / {} quality requirements",
                p.actors.len(),
                p.functional.len(),
                p.non_functional.len()
            ),
            StagePayload::Architecture(p) => format!(
                "{} with {} components and {} relationships",
                p.style,
                p.components.len(),
                p.relationships.len()
            ),
            StagePayload::Integration(p) => format!(
                "{} flows, {} migration steps",
                p.flows.len(),
                p.migration_steps.len()
            ),
        }
    }
}
