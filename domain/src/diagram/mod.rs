//! Diagram subdomain: what to draw for each stage, and how to check the result.

pub mod entities;
pub mod planner;
pub mod validation;

pub use entities::{DiagramArtifact, DiagramContext, DiagramFormat, DiagramRequest, DiagramType};
pub use planner::DiagramPlanner;
pub use validation::{DiagramValidationError, validate_source};
