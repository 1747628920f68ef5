//! Progress events projected from a session.

use crate::core::ids::SessionId;
use crate::workflow::{StageName, WorkflowSession, WorkflowState};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProgressStatus {
    Running,
    Completed,
    Failed,
    ReviewRequired,
}

impl ProgressStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            ProgressStatus::Running => "running",
            ProgressStatus::Completed => "completed",
            ProgressStatus::Failed => "failed",
            ProgressStatus::ReviewRequired => "review_required",
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, ProgressStatus::Completed | ProgressStatus::Failed)
    }
}

impl From<WorkflowState> for ProgressStatus {
    fn from(state: WorkflowState) -> Self {
        match state {
            WorkflowState::Pending | WorkflowState::Running { .. } => ProgressStatus::Running,
            WorkflowState::AwaitingReview { .. } => ProgressStatus::ReviewRequired,
            WorkflowState::Completed => ProgressStatus::Completed,
            WorkflowState::Failed { .. } => ProgressStatus::Failed,
        }
    }
}

/// A point-in-time view of a session's progress.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProgressEvent {
    pub session_id: SessionId,
    pub stage: StageName,
    /// Overall progress across all stages, `0.0..=1.0`
    pub progress: f64,
    pub message: String,
    pub status: ProgressStatus,
    pub timestamp: DateTime<Utc>,
    /// Session version the event was projected from
    pub version: u64,
}

impl ProgressEvent {
    /// Build an event from the session as it is now.
    pub fn project(session: &WorkflowSession, message: impl Into<String>) -> Self {
        Self {
            session_id: session.id().clone(),
            stage: session.current_stage(),
            progress: session.overall_progress(),
            message: message.into(),
            status: session.state().into(),
            timestamp: session.last_activity_at(),
            version: session.version(),
        }
    }
}
