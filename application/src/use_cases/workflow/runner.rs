//! Background stage runner.
//!
//! One runner task executes one stage of one session: it retries within the
//! attempt budget, records every failed attempt on the session, and hands a
//! successful result to `advance`. The runner never holds the session across
//! an executor call; it reloads before every write so a cancelled or
//! otherwise moved session is left alone.

use super::{WorkflowError, WorkflowService};
use crate::ports::event_logger::WorkflowEvent;
use crate::use_cases::execute_stage::{ExecutionError, SessionContext};
use archmesh_domain::{SessionId, StageName};
use chrono::Utc;
use serde_json::json;
use std::sync::Arc;
use tracing::{debug, info, warn};

impl WorkflowService {
    /// Spawn a tracked task running `stage` for `session_id`.
    pub(super) fn schedule(self: &Arc<Self>, session_id: SessionId, stage: StageName) {
        let service = Arc::clone(self);
        self.tasks.spawn(async move {
            service.run_stage(session_id, stage).await;
        });
    }

    pub(super) async fn run_stage(self: Arc<Self>, session_id: SessionId, stage: StageName) {
        let params = &self.config.execution;
        let max_attempts = params.max_attempts.max(1);

        for attempt in 1..=max_attempts {
            let session = match self.store.load(&session_id).await {
                Ok(session) => session,
                Err(e) => {
                    warn!(session_id = %session_id, stage = %stage, error = %e, "Cannot load session for stage run");
                    return;
                }
            };
            if !session.is_running(stage) {
                debug!(session_id = %session_id, stage = %stage, state = %session.state(), "Session moved on, stopping runner");
                return;
            }
            let version = session.version();
            let ctx = SessionContext::from_session(&session, attempt);

            self.logger.log(WorkflowEvent::new(
                "stage_attempt",
                json!({
                    "session_id": session_id.as_str(),
                    "stage": stage.as_str(),
                    "attempt": attempt,
                    "max_attempts": max_attempts,
                }),
            ));

            let outcome =
                match tokio::time::timeout(params.stage_timeout, self.executor.execute(stage, &ctx))
                    .await
                {
                    Ok(outcome) => outcome,
                    Err(_) => Err(ExecutionError::Retryable(format!(
                        "stage timed out after {}s",
                        params.stage_timeout.as_secs_f64()
                    ))),
                };

            match outcome {
                Ok(result) => {
                    self.deliver(&session_id, stage, version, attempt, result).await;
                    return;
                }
                Err(ExecutionError::Retryable(message)) if attempt < max_attempts => {
                    warn!(
                        session_id = %session_id,
                        stage = %stage,
                        attempt,
                        error = %message,
                        "Stage attempt failed, retrying"
                    );
                    if !self.record_failure(&session_id, stage, attempt, &message).await {
                        return;
                    }
                    let delay = params.backoff_for(attempt);
                    if !delay.is_zero() {
                        tokio::time::sleep(delay).await;
                    }
                }
                Err(error) => {
                    let message = match &error {
                        ExecutionError::Retryable(message) => {
                            if !self.record_failure(&session_id, stage, attempt, message).await {
                                return;
                            }
                            format!("{} failed after {} attempts: {}", stage, attempt, message)
                        }
                        other => other.to_string(),
                    };
                    self.fail_stage(&session_id, stage, error.failure_kind(), message)
                        .await;
                    return;
                }
            }
        }
    }

    /// Hand a successful result to `advance`, unless the session moved on
    /// while the executor was running.
    async fn deliver(
        self: &Arc<Self>,
        session_id: &SessionId,
        stage: StageName,
        version: u64,
        attempt: u32,
        result: archmesh_domain::StageResult,
    ) {
        match self.store.load(session_id).await {
            Ok(current) if current.is_running(stage) && current.version() == version => {}
            Ok(current) => {
                info!(
                    session_id = %session_id,
                    stage = %stage,
                    state = %current.state(),
                    "Discarding result of a session that moved on"
                );
                self.log_discard(session_id, stage, attempt);
                return;
            }
            Err(e) => {
                warn!(session_id = %session_id, error = %e, "Cannot reload session after stage run");
                return;
            }
        }

        match self.advance(session_id, version, result).await {
            Ok(_) => {}
            Err(WorkflowError::StaleTransition(reason)) => {
                info!(session_id = %session_id, stage = %stage, reason = %reason, "Discarding stale stage result");
                self.log_discard(session_id, stage, attempt);
            }
            Err(e) => {
                warn!(session_id = %session_id, stage = %stage, error = %e, "Failed to advance workflow");
            }
        }
    }

    /// Returns `false` when the session is no longer running `stage`.
    async fn record_failure(
        &self,
        session_id: &SessionId,
        stage: StageName,
        attempt: u32,
        message: &str,
    ) -> bool {
        let outcome = self
            .mutate(session_id, |session| {
                session.record_attempt_failure(stage, attempt, message, Utc::now())
            })
            .await;
        match outcome {
            Ok((session, ())) => {
                self.logger.log(WorkflowEvent::new(
                    "stage_attempt_failed",
                    json!({
                        "session_id": session_id.as_str(),
                        "stage": stage.as_str(),
                        "attempt": attempt,
                        "error": message,
                    }),
                ));
                self.notify(
                    &session,
                    format!("{} attempt {} failed: {}", stage.display_name(), attempt, message),
                );
                true
            }
            Err(e) => {
                debug!(session_id = %session_id, stage = %stage, error = %e, "Attempt failure not recorded");
                false
            }
        }
    }

    async fn fail_stage(
        &self,
        session_id: &SessionId,
        stage: StageName,
        kind: archmesh_domain::FailureKind,
        message: String,
    ) {
        let outcome = self
            .mutate(session_id, |session| {
                session.fail(stage, kind, message.clone(), Utc::now())
            })
            .await;
        match outcome {
            Ok((session, transition)) => {
                warn!(
                    session_id = %session_id,
                    stage = %stage,
                    kind = kind.as_str(),
                    error = %message,
                    "Workflow failed"
                );
                self.log_transition(&session, &transition);
                self.notify(&session, message);
            }
            Err(e) => {
                debug!(session_id = %session_id, stage = %stage, error = %e, "Failure not recorded");
            }
        }
    }

    fn log_discard(&self, session_id: &SessionId, stage: StageName, attempt: u32) {
        self.logger.log(WorkflowEvent::new(
            "stage_result_discarded",
            json!({
                "session_id": session_id.as_str(),
                "stage": stage.as_str(),
                "attempt": attempt,
            }),
        ));
    }
}
