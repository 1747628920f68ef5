//! Review handler port for stages that pause for human confirmation.
//!
//! When a stage's policy requires review, the workflow enters
//! `awaiting_review` and the driver (CLI, API) asks a [`ReviewHandler`] for
//! a decision, then submits it through the workflow service.
//!
//! # Architecture
//!
//! Following the Ports and Adapters pattern:
//! - **Port**: [`ReviewHandler`] - defined here in application layer
//! - **Adapter**: `InteractiveReviewHandler` - implemented in presentation layer
//!
//! # Flow
//!
//! ```text
//! design_architecture succeeds
//!        ↓
//! awaiting_review:design_architecture
//!        ↓
//! ReviewHandler::request_review()
//!        ↓
//! Reviewer decides: approve / changes_requested / reject
//!        ↓
//! WorkflowService::submit_review()
//! ```
//!
//! # Built-in Implementations
//!
//! - [`AutoApproveReview`] - Always approves
//! - [`AutoRejectReview`] - Always rejects

use archmesh_domain::{ReviewDecision, SessionId, StageResult};
use async_trait::async_trait;
use thiserror::Error;

/// Error type for review handling.
///
/// These errors represent failures while collecting a decision,
/// not decisions made by the reviewer.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ReviewHandlerError {
    /// Reviewer cancelled the prompt (e.g., via Ctrl+C or EOF).
    #[error("Review cancelled")]
    Cancelled,
    /// Input/output error (e.g., terminal read failure).
    #[error("I/O error: {0}")]
    IoError(String),
}

/// A reviewer's decision with optional comments.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReviewOutcome {
    pub decision: ReviewDecision,
    pub comments: String,
}

impl ReviewOutcome {
    pub fn new(decision: ReviewDecision, comments: impl Into<String>) -> Self {
        Self {
            decision,
            comments: comments.into(),
        }
    }
}

/// Port for collecting review decisions.
#[async_trait]
pub trait ReviewHandler: Send + Sync {
    /// Ask for a decision on `result`, the newest result of the stage under review.
    async fn request_review(
        &self,
        session_id: &SessionId,
        result: &StageResult,
    ) -> Result<ReviewOutcome, ReviewHandlerError>;
}

/// Approves every stage. Used for unattended runs.
pub struct AutoApproveReview;

#[async_trait]
impl ReviewHandler for AutoApproveReview {
    async fn request_review(
        &self,
        _session_id: &SessionId,
        _result: &StageResult,
    ) -> Result<ReviewOutcome, ReviewHandlerError> {
        Ok(ReviewOutcome::new(ReviewDecision::Approve, ""))
    }
}

/// Rejects every stage.
///
/// This is the safest non-interactive mode: nothing proceeds past a review
/// gate without a human.
pub struct AutoRejectReview;

#[async_trait]
impl ReviewHandler for AutoRejectReview {
    async fn request_review(
        &self,
        _session_id: &SessionId,
        _result: &StageResult,
    ) -> Result<ReviewOutcome, ReviewHandlerError> {
        Ok(ReviewOutcome::new(
            ReviewDecision::Reject,
            "automatic rejection: no reviewer available",
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use archmesh_domain::{
        ProviderKind, StagePayload,
        payload::{Requirement, RequirementsPayload},
    };

    fn result() -> StageResult {
        StageResult::new(
            StagePayload::Requirements(RequirementsPayload {
                summary: "s".into(),
                actors: vec![],
                functional: vec![Requirement::new("FR-1", "x")],
                non_functional: vec![],
                constraints: vec![],
            }),
            "{}",
            ProviderKind::Ollama,
            "llama3.1",
        )
    }

    #[tokio::test]
    async fn test_auto_approve_review() {
        let outcome = AutoApproveReview
            .request_review(&SessionId::new("s"), &result())
            .await
            .unwrap();
        assert_eq!(outcome.decision, ReviewDecision::Approve);
    }

    #[tokio::test]
    async fn test_auto_reject_review() {
        let outcome = AutoRejectReview
            .request_review(&SessionId::new("s"), &result())
            .await
            .unwrap();
        assert_eq!(outcome.decision, ReviewDecision::Reject);
        assert!(!outcome.comments.is_empty());
    }
}
