//! Workflow use case
//!
//! Drives sessions through their stages:
//!
//! ```text
//! start ──► running:stage[0] ──► (runner) ──► advance
//!                                               │
//!                   ┌───────────────────────────┼──────────────────────┐
//!                   ▼                           ▼                      ▼
//!          running:stage[i+1]       awaiting_review:stage[i]      completed
//!                                               │
//!                                         submit_review
//!                                 approve / changes_requested / reject
//! ```
//!
//! Every write is a compare-and-set on the session version. `advance` never
//! retries: a lost race surfaces as [`WorkflowError::StaleTransition`].
//! Bookkeeping writes (attempt failures, reviews, cancellation) reload and
//! re-apply their transition a bounded number of times.

mod runner;
mod types;

pub use types::{ResultSummary, WorkflowError, WorkflowStatus};

use crate::config::WorkflowConfig;
use crate::notification::NotificationPublisher;
use crate::ports::event_logger::{NoWorkflowLogger, WorkflowEvent, WorkflowEventLogger};
use crate::ports::session_store::{SessionStore, StoreError};
use crate::use_cases::diagrams::DiagramService;
use crate::use_cases::execute_stage::StageExecutor;
use archmesh_domain::{
    DomainError, ProgressEvent, ProjectId, ReviewDecision, SessionId, StageResult, Transition,
    WorkflowInput, WorkflowMode, WorkflowSession,
};
use chrono::Utc;
use serde_json::json;
use std::sync::Arc;
use tokio_util::task::TaskTracker;
use tracing::{debug, info};

/// Reload-and-retry bound for bookkeeping writes.
const MAX_MUTATION_ATTEMPTS: usize = 5;

/// Use case for running architecture workflows
pub struct WorkflowService {
    store: Arc<dyn SessionStore>,
    executor: StageExecutor,
    diagrams: Option<Arc<DiagramService>>,
    publisher: Arc<NotificationPublisher>,
    logger: Arc<dyn WorkflowEventLogger>,
    config: WorkflowConfig,
    tasks: TaskTracker,
}

impl WorkflowService {
    pub fn new(
        store: Arc<dyn SessionStore>,
        executor: StageExecutor,
        publisher: Arc<NotificationPublisher>,
        config: WorkflowConfig,
    ) -> Self {
        Self {
            store,
            executor,
            diagrams: None,
            publisher,
            logger: Arc::new(NoWorkflowLogger),
            config,
            tasks: TaskTracker::new(),
        }
    }

    pub fn with_diagrams(mut self, diagrams: Arc<DiagramService>) -> Self {
        self.diagrams = Some(diagrams);
        self
    }

    pub fn with_logger(mut self, logger: Arc<dyn WorkflowEventLogger>) -> Self {
        self.logger = logger;
        self
    }

    pub fn publisher(&self) -> &Arc<NotificationPublisher> {
        &self.publisher
    }

    pub fn config(&self) -> &WorkflowConfig {
        &self.config
    }

    // ==================== Inbound Operations ====================

    /// Create a session and start its first stage in the background.
    ///
    /// Returns as soon as the session is `running:stage[0]`.
    pub async fn start(
        self: &Arc<Self>,
        project_id: impl Into<ProjectId>,
        mode: &str,
        input: impl Into<String>,
    ) -> Result<SessionId, WorkflowError> {
        let mode: WorkflowMode = mode.parse()?;
        let now = Utc::now();
        let session = WorkflowSession::new(project_id, mode, WorkflowInput::new(input), now);
        let inserted = self.store.insert(session).await?;
        let session_id = inserted.id().clone();

        let expected = inserted.version();
        let mut session = inserted;
        let transition = session.start(now)?;
        let session = self.store.compare_and_swap(session, expected).await?;

        info!(
            session_id = %session_id,
            project_id = %session.project_id(),
            mode = %mode,
            stages = session.stages().len(),
            "Workflow started"
        );
        self.log_transition(&session, &transition);
        self.notify(&session, format!("Workflow started ({})", mode));

        if let Some(stage) = transition.stage_to_run() {
            self.schedule(session_id.clone(), stage);
        }
        Ok(session_id)
    }

    /// Store a stage result and apply the stage's transition rule.
    ///
    /// Fails with `StaleTransition` if the session is not running the
    /// result's stage or its version is no longer `expected_version`.
    pub async fn advance(
        self: &Arc<Self>,
        session_id: &SessionId,
        expected_version: u64,
        result: StageResult,
    ) -> Result<Transition, WorkflowError> {
        let mut session = self.store.load(session_id).await?;
        if session.version() != expected_version {
            return Err(WorkflowError::StaleTransition(format!(
                "session {} is at version {}, not {}",
                session_id,
                session.version(),
                expected_version
            )));
        }

        let stage = result.stage;
        let policy = self.config.policy.policy_for(stage);
        let accepted = result.clone();
        let transition = session.accept_result(result, policy, Utc::now())?;
        let session = self
            .store
            .compare_and_swap(session, expected_version)
            .await?;

        info!(
            session_id = %session_id,
            stage = %stage,
            attempt = accepted.attempt,
            confidence = accepted.confidence,
            state = %session.state(),
            "Stage result accepted"
        );
        self.logger.log(WorkflowEvent::new(
            "stage_completed",
            json!({
                "session_id": session_id.as_str(),
                "stage": stage.as_str(),
                "result_id": accepted.id.as_str(),
                "attempt": accepted.attempt,
                "confidence": accepted.confidence,
                "provider": accepted.provider.as_str(),
                "model": accepted.model,
                "summary": accepted.payload.summary(),
            }),
        ));
        self.log_transition(&session, &transition);
        self.notify(&session, transition_message(&transition));

        self.plan_diagrams(&session, accepted);
        if let Some(next) = transition.stage_to_run() {
            self.schedule(session_id.clone(), next);
        }
        Ok(transition)
    }

    /// Apply a review decision to a session awaiting review.
    pub async fn submit_review(
        self: &Arc<Self>,
        session_id: &SessionId,
        decision: ReviewDecision,
        comments: impl Into<String>,
    ) -> Result<Transition, WorkflowError> {
        let comments = comments.into();
        let (session, transition) = self
            .mutate(session_id, |session| {
                session.apply_review(decision, comments.clone(), Utc::now())
            })
            .await?;

        info!(
            session_id = %session_id,
            decision = %decision,
            state = %session.state(),
            "Review submitted"
        );
        self.logger.log(WorkflowEvent::new(
            "review_submitted",
            json!({
                "session_id": session_id.as_str(),
                "decision": decision.as_str(),
                "comments": comments,
            }),
        ));
        self.log_transition(&session, &transition);
        self.notify(&session, transition_message(&transition));

        if let Some(stage) = transition.stage_to_run() {
            self.schedule(session_id.clone(), stage);
        }
        Ok(transition)
    }

    /// Read-only snapshot of a session.
    pub async fn get_status(&self, session_id: &SessionId) -> Result<WorkflowStatus, WorkflowError> {
        let session = self.store.load(session_id).await?;
        Ok(WorkflowStatus::from(&session))
    }

    /// Full session record, including the result history.
    pub async fn session(&self, session_id: &SessionId) -> Result<WorkflowSession, WorkflowError> {
        Ok(self.store.load(session_id).await?)
    }

    /// Cancel a non-terminal session.
    ///
    /// An executor call already in flight is not aborted; its result is
    /// discarded when it comes back.
    pub async fn cancel(&self, session_id: &SessionId) -> Result<(), WorkflowError> {
        let (session, transition) = self
            .mutate(session_id, |session| session.cancel(Utc::now()))
            .await?;
        info!(session_id = %session_id, "Workflow cancelled");
        self.log_transition(&session, &transition);
        self.notify(&session, "Workflow cancelled");
        Ok(())
    }

    /// Wait until no stage or diagram task is running.
    pub async fn wait_idle(&self) {
        self.tasks.close();
        self.tasks.wait().await;
        self.tasks.reopen();
    }

    // ==================== Internals ====================

    /// Load, apply `f`, and compare-and-set; reload and re-apply on a
    /// version conflict. Transition errors from `f` are returned as is.
    async fn mutate<T, F>(
        &self,
        session_id: &SessionId,
        mut f: F,
    ) -> Result<(WorkflowSession, T), WorkflowError>
    where
        F: FnMut(&mut WorkflowSession) -> Result<T, DomainError>,
    {
        for attempt in 1..=MAX_MUTATION_ATTEMPTS {
            let mut session = self.store.load(session_id).await?;
            let expected = session.version();
            let output = f(&mut session)?;
            match self.store.compare_and_swap(session, expected).await {
                Ok(stored) => return Ok((stored, output)),
                Err(StoreError::VersionConflict { .. }) => {
                    debug!(session_id = %session_id, attempt, "Version conflict, reloading session");
                }
                Err(e) => return Err(e.into()),
            }
        }
        Err(WorkflowError::StaleTransition(format!(
            "session {} kept changing after {} attempts",
            session_id, MAX_MUTATION_ATTEMPTS
        )))
    }

    fn plan_diagrams(self: &Arc<Self>, session: &WorkflowSession, result: StageResult) {
        if !self.config.generate_diagrams {
            return;
        }
        let Some(diagrams) = self.diagrams.clone() else {
            return;
        };
        let project_id = session.project_id().clone();
        let session_id = session.id().clone();
        self.tasks.spawn(async move {
            diagrams
                .generate_for_stage(&project_id, &session_id, &result)
                .await;
        });
    }

    fn notify(&self, session: &WorkflowSession, message: impl Into<String>) {
        self.publisher
            .publish(ProgressEvent::project(session, message));
    }

    fn log_transition(&self, session: &WorkflowSession, transition: &Transition) {
        self.logger.log(WorkflowEvent::new(
            "transition",
            json!({
                "session_id": session.id().as_str(),
                "transition": format!("{:?}", transition),
                "state": session.state().to_string(),
                "version": session.version(),
                "progress": session.overall_progress(),
            }),
        ));
    }
}

fn transition_message(transition: &Transition) -> String {
    match transition {
        Transition::Started { stage } => format!("Running {}", stage.display_name()),
        Transition::Advanced { from, to } => {
            format!("{} done, running {}", from.display_name(), to.display_name())
        }
        Transition::ReviewRequested { stage } => {
            format!("{} is waiting for review", stage.display_name())
        }
        Transition::Rerun { stage } => {
            format!("Changes requested, re-running {}", stage.display_name())
        }
        Transition::Completed => "Workflow completed".to_string(),
        Transition::Failed { stage, kind } => {
            format!("{} failed ({})", stage.display_name(), kind.as_str())
        }
    }
}
