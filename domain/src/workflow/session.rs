//! Workflow session entity and its transition rules.
//!
//! All state changes go through methods on [`WorkflowSession`]; each one
//! checks that the session is in the state the transition expects and
//! returns a [`Transition`] describing what happened. Persistence and
//! version checks live in the application layer.

use super::mode::WorkflowMode;
use super::result::StageResult;
use super::review::{ReviewDecision, ReviewRecord, ReviewTask};
use super::stage::{StageName, StagePolicy};
use crate::core::error::DomainError;
use crate::core::ids::{ProjectId, SessionId};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Progress recorded when a stage starts running.
pub const STAGE_STARTED_PROGRESS: f64 = 0.1;
/// Progress added per failed attempt, capped below completion.
pub const ATTEMPT_PROGRESS_STEP: f64 = 0.1;
const ATTEMPT_PROGRESS_CAP: f64 = 0.9;

/// Why a session ended in `failed`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FailureKind {
    /// The gateway reported an unrecoverable error
    Execution,
    /// The stage's upstream results were missing
    MissingDependency,
    /// Every attempt in the retry budget failed
    RetriesExhausted,
    /// A reviewer rejected the stage result
    Rejected,
    /// The session was cancelled by a caller
    Cancelled,
}

impl FailureKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            FailureKind::Execution => "execution",
            FailureKind::MissingDependency => "missing_dependency",
            FailureKind::RetriesExhausted => "retries_exhausted",
            FailureKind::Rejected => "rejected",
            FailureKind::Cancelled => "cancelled",
        }
    }
}

/// Lifecycle state of a session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum WorkflowState {
    Pending,
    Running { stage: StageName },
    AwaitingReview { stage: StageName },
    Completed,
    Failed { stage: StageName, kind: FailureKind },
}

impl WorkflowState {
    pub fn is_terminal(&self) -> bool {
        matches!(self, WorkflowState::Completed | WorkflowState::Failed { .. })
    }

    pub fn is_cancelled(&self) -> bool {
        matches!(
            self,
            WorkflowState::Failed {
                kind: FailureKind::Cancelled,
                ..
            }
        )
    }
}

impl std::fmt::Display for WorkflowState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            WorkflowState::Pending => write!(f, "pending"),
            WorkflowState::Running { stage } => write!(f, "running:{}", stage),
            WorkflowState::AwaitingReview { stage } => write!(f, "awaiting_review:{}", stage),
            WorkflowState::Completed => write!(f, "completed"),
            WorkflowState::Failed { stage, kind } => {
                write!(f, "failed:{} ({})", stage, kind.as_str())
            }
        }
    }
}

/// What a successful transition did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Transition {
    Started { stage: StageName },
    Advanced { from: StageName, to: StageName },
    ReviewRequested { stage: StageName },
    /// Changes were requested; the same stage runs again
    Rerun { stage: StageName },
    Completed,
    Failed { stage: StageName, kind: FailureKind },
}

impl Transition {
    /// The stage that must be scheduled for execution next, if any.
    pub fn stage_to_run(&self) -> Option<StageName> {
        match self {
            Transition::Started { stage } | Transition::Rerun { stage } => Some(*stage),
            Transition::Advanced { to, .. } => Some(*to),
            _ => None,
        }
    }
}

/// A recorded error. Attempt failures are non-fatal until the budget runs out.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SessionError {
    pub stage: StageName,
    pub attempt: Option<u32>,
    pub message: String,
    pub fatal: bool,
    pub occurred_at: DateTime<Utc>,
}

/// Original input plus amendments collected from review comments.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct WorkflowInput {
    pub text: String,
    #[serde(default)]
    pub amendments: Vec<String>,
}

impl WorkflowInput {
    pub fn new(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            amendments: Vec::new(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StageProgress {
    pub stage: StageName,
    pub fraction: f64,
}

/// One run of a workflow (Entity).
///
/// Invariants:
/// - `current_index` always points into `stages`
/// - a stage's progress never decreases
/// - `active` is false exactly when the state is terminal
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "SessionRecord")]
pub struct WorkflowSession {
    id: SessionId,
    project_id: ProjectId,
    mode: WorkflowMode,
    stages: Vec<StageName>,
    current_index: usize,
    state: WorkflowState,
    input: WorkflowInput,
    progress: Vec<StageProgress>,
    results: Vec<StageResult>,
    errors: Vec<SessionError>,
    pending_reviews: Vec<ReviewTask>,
    reviews: Vec<ReviewRecord>,
    started_at: DateTime<Utc>,
    last_activity_at: DateTime<Utc>,
    completed_at: Option<DateTime<Utc>>,
    active: bool,
    version: u64,
}

/// Serialized form of [`WorkflowSession`], checked before use.
#[derive(Deserialize)]
struct SessionRecord {
    id: SessionId,
    project_id: ProjectId,
    mode: WorkflowMode,
    stages: Vec<StageName>,
    current_index: usize,
    state: WorkflowState,
    input: WorkflowInput,
    progress: Vec<StageProgress>,
    results: Vec<StageResult>,
    errors: Vec<SessionError>,
    pending_reviews: Vec<ReviewTask>,
    reviews: Vec<ReviewRecord>,
    started_at: DateTime<Utc>,
    last_activity_at: DateTime<Utc>,
    completed_at: Option<DateTime<Utc>>,
    active: bool,
    version: u64,
}

impl TryFrom<SessionRecord> for WorkflowSession {
    type Error = DomainError;

    fn try_from(record: SessionRecord) -> Result<Self, Self::Error> {
        if record.current_index >= record.stages.len() {
            return Err(DomainError::InvalidRecord(format!(
                "current_index {} is outside {} stages",
                record.current_index,
                record.stages.len()
            )));
        }
        if record.active == record.state.is_terminal() {
            return Err(DomainError::InvalidRecord(format!(
                "active={} does not match state {}",
                record.active, record.state
            )));
        }
        Ok(Self {
            id: record.id,
            project_id: record.project_id,
            mode: record.mode,
            stages: record.stages,
            current_index: record.current_index,
            state: record.state,
            input: record.input,
            progress: record.progress,
            results: record.results,
            errors: record.errors,
            pending_reviews: record.pending_reviews,
            reviews: record.reviews,
            started_at: record.started_at,
            last_activity_at: record.last_activity_at,
            completed_at: record.completed_at,
            active: record.active,
            version: record.version,
        })
    }
}

impl WorkflowSession {
    /// Creates a session in `pending` for the given mode.
    pub fn new(
        project_id: impl Into<ProjectId>,
        mode: WorkflowMode,
        input: WorkflowInput,
        now: DateTime<Utc>,
    ) -> Self {
        let stages = mode.stages();
        let progress = stages
            .iter()
            .map(|stage| StageProgress {
                stage: *stage,
                fraction: 0.0,
            })
            .collect();
        Self {
            id: SessionId::generate(),
            project_id: project_id.into(),
            mode,
            stages,
            current_index: 0,
            state: WorkflowState::Pending,
            input,
            progress,
            results: Vec::new(),
            errors: Vec::new(),
            pending_reviews: Vec::new(),
            reviews: Vec::new(),
            started_at: now,
            last_activity_at: now,
            completed_at: None,
            active: true,
            version: 0,
        }
    }

    // ==================== Accessors ====================

    pub fn id(&self) -> &SessionId {
        &self.id
    }

    pub fn project_id(&self) -> &ProjectId {
        &self.project_id
    }

    pub fn mode(&self) -> WorkflowMode {
        self.mode
    }

    pub fn stages(&self) -> &[StageName] {
        &self.stages
    }

    pub fn current_stage(&self) -> StageName {
        self.stages[self.current_index]
    }

    pub fn state(&self) -> WorkflowState {
        self.state
    }

    pub fn input(&self) -> &WorkflowInput {
        &self.input
    }

    pub fn progress(&self) -> &[StageProgress] {
        &self.progress
    }

    pub fn stage_progress(&self, stage: StageName) -> f64 {
        self.progress
            .iter()
            .find(|p| p.stage == stage)
            .map(|p| p.fraction)
            .unwrap_or(0.0)
    }

    /// Mean progress over all stages.
    pub fn overall_progress(&self) -> f64 {
        if self.progress.is_empty() {
            return 0.0;
        }
        self.progress.iter().map(|p| p.fraction).sum::<f64>() / self.progress.len() as f64
    }

    /// Full result history, oldest first.
    pub fn results(&self) -> &[StageResult] {
        &self.results
    }

    /// Newest result for `stage`.
    pub fn latest_result(&self, stage: StageName) -> Option<&StageResult> {
        self.results.iter().rev().find(|r| r.stage == stage)
    }

    /// Newest result per stage.
    pub fn latest_results(&self) -> HashMap<StageName, &StageResult> {
        let mut latest = HashMap::new();
        for result in &self.results {
            latest.insert(result.stage, result);
        }
        latest
    }

    pub fn errors(&self) -> &[SessionError] {
        &self.errors
    }

    pub fn pending_reviews(&self) -> &[ReviewTask] {
        &self.pending_reviews
    }

    pub fn reviews(&self) -> &[ReviewRecord] {
        &self.reviews
    }

    pub fn started_at(&self) -> DateTime<Utc> {
        self.started_at
    }

    pub fn last_activity_at(&self) -> DateTime<Utc> {
        self.last_activity_at
    }

    pub fn completed_at(&self) -> Option<DateTime<Utc>> {
        self.completed_at
    }

    pub fn is_active(&self) -> bool {
        self.active
    }

    pub fn version(&self) -> u64 {
        self.version
    }

    /// Set by the session store when a compare-and-set succeeds.
    pub fn set_version(&mut self, version: u64) {
        self.version = version;
    }

    /// Returns `true` if the session is executing `stage` right now.
    pub fn is_running(&self, stage: StageName) -> bool {
        self.state == WorkflowState::Running { stage }
    }

    // ==================== Transitions ====================

    /// `pending` → `running:stage[0]`.
    pub fn start(&mut self, now: DateTime<Utc>) -> Result<Transition, DomainError> {
        if self.state != WorkflowState::Pending {
            return Err(self.invalid_state("start"));
        }
        let stage = self.enter_stage(0, now);
        Ok(Transition::Started { stage })
    }

    /// Accept a stage result produced while the session was running that stage.
    ///
    /// Rejects the result as stale if the session has moved on (duplicate or
    /// late callback).
    pub fn accept_result(
        &mut self,
        result: StageResult,
        policy: StagePolicy,
        now: DateTime<Utc>,
    ) -> Result<Transition, DomainError> {
        let stage = result.stage;
        self.expect_running(stage)?;

        let result_id = result.id.clone();
        self.results.push(result);
        self.raise_progress(stage, 1.0);
        self.touch(now);

        if policy == StagePolicy::RequireReview {
            self.pending_reviews.push(ReviewTask {
                stage,
                result_id,
                requested_at: now,
            });
            self.state = WorkflowState::AwaitingReview { stage };
            return Ok(Transition::ReviewRequested { stage });
        }

        Ok(self.move_past(stage, now))
    }

    /// Record a failed attempt for the running stage without leaving it.
    pub fn record_attempt_failure(
        &mut self,
        stage: StageName,
        attempt: u32,
        message: impl Into<String>,
        now: DateTime<Utc>,
    ) -> Result<(), DomainError> {
        self.expect_running(stage)?;
        self.errors.push(SessionError {
            stage,
            attempt: Some(attempt),
            message: message.into(),
            fatal: false,
            occurred_at: now,
        });
        let bumped = (self.stage_progress(stage) + ATTEMPT_PROGRESS_STEP).min(ATTEMPT_PROGRESS_CAP);
        self.raise_progress(stage, bumped);
        self.touch(now);
        Ok(())
    }

    /// `running:stage` → `failed:stage`.
    pub fn fail(
        &mut self,
        stage: StageName,
        kind: FailureKind,
        message: impl Into<String>,
        now: DateTime<Utc>,
    ) -> Result<Transition, DomainError> {
        self.expect_running(stage)?;
        Ok(self.terminate_failed(stage, kind, message.into(), None, now))
    }

    /// Apply a human review decision to a session awaiting review.
    pub fn apply_review(
        &mut self,
        decision: ReviewDecision,
        comments: impl Into<String>,
        now: DateTime<Utc>,
    ) -> Result<Transition, DomainError> {
        let WorkflowState::AwaitingReview { stage } = self.state else {
            return Err(self.invalid_state("submit review"));
        };
        let comments = comments.into();

        let result_id = match self.pending_reviews.iter().position(|t| t.stage == stage) {
            Some(index) => self.pending_reviews.remove(index).result_id,
            None => self
                .latest_result(stage)
                .map(|r| r.id.clone())
                .unwrap_or_else(|| "unknown".into()),
        };
        self.reviews.push(ReviewRecord {
            stage,
            result_id,
            decision,
            comments: comments.clone(),
            decided_at: now,
        });
        self.touch(now);

        match decision {
            ReviewDecision::Approve => Ok(self.move_past(stage, now)),
            ReviewDecision::ChangesRequested => {
                if !comments.trim().is_empty() {
                    self.input.amendments.push(comments);
                }
                self.state = WorkflowState::Running { stage };
                Ok(Transition::Rerun { stage })
            }
            ReviewDecision::Reject => {
                let message = if comments.trim().is_empty() {
                    format!("{} rejected by reviewer", stage)
                } else {
                    format!("{} rejected by reviewer: {}", stage, comments)
                };
                Ok(self.terminate_failed(stage, FailureKind::Rejected, message, None, now))
            }
        }
    }

    /// Cancel a non-terminal session; it ends `failed:<current>` with kind `Cancelled`.
    pub fn cancel(&mut self, now: DateTime<Utc>) -> Result<Transition, DomainError> {
        if self.state.is_terminal() {
            return Err(self.invalid_state("cancel"));
        }
        let stage = self.current_stage();
        self.pending_reviews.clear();
        Ok(self.terminate_failed(
            stage,
            FailureKind::Cancelled,
            "workflow cancelled".to_string(),
            None,
            now,
        ))
    }

    // ==================== Helpers ====================

    fn expect_running(&self, stage: StageName) -> Result<(), DomainError> {
        if self.is_running(stage) {
            Ok(())
        } else {
            Err(DomainError::StaleTransition(format!(
                "expected running:{} but session {} is {}",
                stage, self.id, self.state
            )))
        }
    }

    fn invalid_state(&self, operation: &'static str) -> DomainError {
        DomainError::InvalidState {
            operation,
            state: self.state.to_string(),
        }
    }

    fn enter_stage(&mut self, index: usize, now: DateTime<Utc>) -> StageName {
        self.current_index = index;
        let stage = self.stages[index];
        self.state = WorkflowState::Running { stage };
        self.raise_progress(stage, STAGE_STARTED_PROGRESS);
        self.touch(now);
        stage
    }

    /// Leave `stage` after success: next stage, or `completed` if it was last.
    fn move_past(&mut self, stage: StageName, now: DateTime<Utc>) -> Transition {
        let next = self.current_index + 1;
        if next < self.stages.len() {
            let to = self.enter_stage(next, now);
            Transition::Advanced { from: stage, to }
        } else {
            self.state = WorkflowState::Completed;
            self.active = false;
            self.completed_at = Some(now);
            Transition::Completed
        }
    }

    fn terminate_failed(
        &mut self,
        stage: StageName,
        kind: FailureKind,
        message: String,
        attempt: Option<u32>,
        now: DateTime<Utc>,
    ) -> Transition {
        self.errors.push(SessionError {
            stage,
            attempt,
            message,
            fatal: true,
            occurred_at: now,
        });
        self.state = WorkflowState::Failed { stage, kind };
        self.active = false;
        self.completed_at = Some(now);
        self.touch(now);
        Transition::Failed { stage, kind }
    }

    fn raise_progress(&mut self, stage: StageName, fraction: f64) {
        if let Some(entry) = self.progress.iter_mut().find(|p| p.stage == stage) {
            entry.fraction = entry.fraction.max(fraction.clamp(0.0, 1.0));
        }
    }

    fn touch(&mut self, now: DateTime<Utc>) {
        if now > self.last_activity_at {
            self.last_activity_at = now;
        }
    }
}
