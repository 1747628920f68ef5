//! Stage results.

use crate::core::ids::StageResultId;
use crate::payload::StagePayload;
use crate::providers::ProviderKind;
use crate::workflow::stage::StageName;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Output of one successful stage execution attempt.
///
/// Results are immutable once created. Re-running a stage (retry or
/// "changes requested") produces a new result for the same stage; the
/// session keeps the full history and treats the newest one as current.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StageResult {
    pub id: StageResultId,
    pub stage: StageName,
    /// 1-based attempt number within the run of the stage that produced it
    pub attempt: u32,
    pub raw_output: String,
    pub payload: StagePayload,
    /// Model-reported confidence, or the payload's completeness heuristic
    pub confidence: f64,
    pub generated_at: DateTime<Utc>,
    pub provider: ProviderKind,
    pub model: String,
}

impl StageResult {
    /// Creates a result; the stage is taken from the payload variant.
    pub fn new(
        payload: StagePayload,
        raw_output: impl Into<String>,
        provider: ProviderKind,
        model: impl Into<String>,
    ) -> Self {
        Self {
            id: StageResultId::generate(),
            stage: payload.stage(),
            attempt: 1,
            raw_output: raw_output.into(),
            confidence: payload.completeness(),
            payload,
            generated_at: Utc::now(),
            provider,
            model: model.into(),
        }
    }

    pub fn with_attempt(mut self, attempt: u32) -> Self {
        self.attempt = attempt;
        self
    }

    pub fn with_confidence(mut self, confidence: f64) -> Self {
        self.confidence = confidence.clamp(0.0, 1.0);
        self
    }

    pub fn with_generated_at(mut self, at: DateTime<Utc>) -> Self {
        self.generated_at = at;
        self
    }
}
