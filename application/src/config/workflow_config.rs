//! Workflow configuration container.
//!
//! [`WorkflowConfig`] groups what the workflow service needs at
//! construction: the execution parameters, the review policy, and the
//! diagram format used by the planner.

use crate::config::ExecutionParams;
use archmesh_domain::{DiagramFormat, WorkflowPolicy};

#[derive(Debug, Clone)]
pub struct WorkflowConfig {
    pub execution: ExecutionParams,
    pub policy: WorkflowPolicy,
    pub diagram_format: DiagramFormat,
    /// Whether diagrams are generated after each accepted stage.
    pub generate_diagrams: bool,
}

impl Default for WorkflowConfig {
    fn default() -> Self {
        Self::new(ExecutionParams::default(), WorkflowPolicy::default())
    }
}

impl WorkflowConfig {
    pub fn new(execution: ExecutionParams, policy: WorkflowPolicy) -> Self {
        Self {
            execution,
            policy,
            diagram_format: DiagramFormat::default(),
            generate_diagrams: true,
        }
    }

    pub fn with_diagram_format(mut self, format: DiagramFormat) -> Self {
        self.diagram_format = format;
        self
    }

    pub fn with_diagrams(mut self, enabled: bool) -> Self {
        self.generate_diagrams = enabled;
        self
    }
}
