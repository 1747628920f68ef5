//! Workflow policy: which stages pause for human review.

use super::stage::{StageName, StagePolicy};
use serde::{Deserialize, Serialize};

/// Static rules that decide a stage's [`StagePolicy`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WorkflowPolicy {
    /// Stages that require human confirmation before the workflow moves on.
    pub review_stages: Vec<StageName>,
}

impl Default for WorkflowPolicy {
    fn default() -> Self {
        Self {
            review_stages: vec![StageName::DesignArchitecture],
        }
    }
}

impl WorkflowPolicy {
    /// A policy that never pauses.
    pub fn auto_advance() -> Self {
        Self {
            review_stages: Vec::new(),
        }
    }

    pub fn with_review(mut self, stage: StageName) -> Self {
        if !self.review_stages.contains(&stage) {
            self.review_stages.push(stage);
        }
        self
    }

    pub fn policy_for(&self, stage: StageName) -> StagePolicy {
        if self.review_stages.contains(&stage) {
            StagePolicy::RequireReview
        } else {
            StagePolicy::AutoAdvance
        }
    }
}
