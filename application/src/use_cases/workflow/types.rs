//! Type definitions for the workflow use case.

use crate::ports::session_store::StoreError;
use archmesh_domain::{
    DomainError, ProjectId, ProviderKind, ReviewTask, SessionError, SessionId, StageName,
    StageProgress, StageResultId, WorkflowMode, WorkflowSession, WorkflowState,
};
use chrono::{DateTime, Utc};
use serde::Serialize;
use thiserror::Error;

/// Errors returned synchronously by workflow operations
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum WorkflowError {
    #[error("Invalid workflow mode: {0}")]
    InvalidMode(String),

    #[error("Cannot {operation} while session is {state}")]
    InvalidState {
        operation: &'static str,
        state: String,
    },

    #[error("Session not found: {0}")]
    SessionNotFound(SessionId),

    #[error("Stale transition: {0}")]
    StaleTransition(String),

    #[error("Session store error: {0}")]
    Store(StoreError),

    #[error("{0}")]
    Domain(DomainError),
}

impl WorkflowError {
    pub fn is_stale(&self) -> bool {
        matches!(self, WorkflowError::StaleTransition(_))
    }
}

impl From<StoreError> for WorkflowError {
    fn from(e: StoreError) -> Self {
        match e {
            StoreError::NotFound(id) => WorkflowError::SessionNotFound(id),
            StoreError::VersionConflict { expected, actual } => WorkflowError::StaleTransition(
                format!("expected version {}, found {}", expected, actual),
            ),
            other => WorkflowError::Store(other),
        }
    }
}

impl From<DomainError> for WorkflowError {
    fn from(e: DomainError) -> Self {
        match e {
            DomainError::InvalidMode(mode) => WorkflowError::InvalidMode(mode),
            DomainError::InvalidState { operation, state } => {
                WorkflowError::InvalidState { operation, state }
            }
            DomainError::StaleTransition(msg) => WorkflowError::StaleTransition(msg),
            other => WorkflowError::Domain(other),
        }
    }
}

/// Summary of the newest result of one stage.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ResultSummary {
    pub stage: StageName,
    pub result_id: StageResultId,
    pub attempt: u32,
    pub confidence: f64,
    pub summary: String,
    pub provider: ProviderKind,
    pub model: String,
    pub generated_at: DateTime<Utc>,
}

/// Read-only snapshot of a session returned by `get_status`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct WorkflowStatus {
    pub session_id: SessionId,
    pub project_id: ProjectId,
    pub mode: WorkflowMode,
    pub state: WorkflowState,
    pub current_stage: StageName,
    pub stage_progress: Vec<StageProgress>,
    pub overall_progress: f64,
    pub errors: Vec<SessionError>,
    pub pending_reviews: Vec<ReviewTask>,
    /// Newest result per stage, in stage order
    pub results: Vec<ResultSummary>,
    pub result_count: usize,
    pub started_at: DateTime<Utc>,
    pub last_activity_at: DateTime<Utc>,
    pub completed_at: Option<DateTime<Utc>>,
    pub active: bool,
    pub version: u64,
}

impl From<&WorkflowSession> for WorkflowStatus {
    fn from(session: &WorkflowSession) -> Self {
        let results = session
            .stages()
            .iter()
            .filter_map(|stage| session.latest_result(*stage))
            .map(|r| ResultSummary {
                stage: r.stage,
                result_id: r.id.clone(),
                attempt: r.attempt,
                confidence: r.confidence,
                summary: r.payload.summary(),
                provider: r.provider,
                model: r.model.clone(),
                generated_at: r.generated_at,
            })
            .collect();

        Self {
            session_id: session.id().clone(),
            project_id: session.project_id().clone(),
            mode: session.mode(),
            state: session.state(),
            current_stage: session.current_stage(),
            stage_progress: session.progress().to_vec(),
            overall_progress: session.overall_progress(),
            errors: session.errors().to_vec(),
            pending_reviews: session.pending_reviews().to_vec(),
            results,
            result_count: session.results().len(),
            started_at: session.started_at(),
            last_activity_at: session.last_activity_at(),
            completed_at: session.completed_at(),
            active: session.is_active(),
            version: session.version(),
        }
    }
}
