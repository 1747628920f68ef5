//! Human review value objects.

use super::stage::StageName;
use crate::core::error::DomainError;
use crate::core::ids::StageResultId;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Decision submitted for a stage awaiting review.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReviewDecision {
    /// Accept the result and continue
    Approve,
    /// Abandon the workflow
    Reject,
    /// Re-run the stage with the reviewer's comments added to its input
    ChangesRequested,
}

impl ReviewDecision {
    pub fn as_str(&self) -> &'static str {
        match self {
            ReviewDecision::Approve => "approve",
            ReviewDecision::Reject => "reject",
            ReviewDecision::ChangesRequested => "changes_requested",
        }
    }
}

impl std::fmt::Display for ReviewDecision {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl std::str::FromStr for ReviewDecision {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().replace('-', "_").as_str() {
            "approve" | "approved" => Ok(ReviewDecision::Approve),
            "reject" | "rejected" => Ok(ReviewDecision::Reject),
            "changes_requested" | "request_changes" => Ok(ReviewDecision::ChangesRequested),
            _ => Err(DomainError::InvalidDecision(s.to_string())),
        }
    }
}

/// An open request for a human to look at a stage result.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReviewTask {
    pub stage: StageName,
    /// The result under review
    pub result_id: StageResultId,
    pub requested_at: DateTime<Utc>,
}

/// A decision that was applied to the session.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReviewRecord {
    pub stage: StageName,
    pub result_id: StageResultId,
    pub decision: ReviewDecision,
    pub comments: String,
    pub decided_at: DateTime<Utc>,
}
