//! Execution parameters: stage retry and timeout control.
//!
//! [`ExecutionParams`] groups the static parameters that control how the
//! workflow runner executes a stage. These are application-layer concerns,
//! not domain policy.

use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Stage execution control parameters.
///
/// A stage run makes at most `max_attempts` executor calls. Between failed
/// attempts the runner sleeps for an exponentially growing backoff:
/// `initial_backoff * backoff_multiplier^(attempt - 1)`, capped at
/// `max_backoff`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExecutionParams {
    /// Attempt budget per stage run (at least 1).
    pub max_attempts: u32,
    /// Delay after the first failed attempt.
    pub initial_backoff: Duration,
    /// Growth factor applied to the delay after each further failure.
    pub backoff_multiplier: f64,
    /// Upper bound on any single delay.
    pub max_backoff: Duration,
    /// Timeout for one executor call.
    pub stage_timeout: Duration,
}

impl Default for ExecutionParams {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            initial_backoff: Duration::from_millis(500),
            backoff_multiplier: 2.0,
            max_backoff: Duration::from_secs(10),
            stage_timeout: Duration::from_secs(180),
        }
    }
}

impl ExecutionParams {
    // ==================== Builder Methods ====================

    pub fn with_max_attempts(mut self, max: u32) -> Self {
        self.max_attempts = max.max(1);
        self
    }

    pub fn with_initial_backoff(mut self, backoff: Duration) -> Self {
        self.initial_backoff = backoff;
        self
    }

    pub fn with_backoff_multiplier(mut self, multiplier: f64) -> Self {
        self.backoff_multiplier = multiplier;
        self
    }

    pub fn with_max_backoff(mut self, backoff: Duration) -> Self {
        self.max_backoff = backoff;
        self
    }

    pub fn with_stage_timeout(mut self, timeout: Duration) -> Self {
        self.stage_timeout = timeout;
        self
    }

    /// No delay between attempts. Used by tests and dry runs.
    pub fn without_backoff(mut self) -> Self {
        self.initial_backoff = Duration::ZERO;
        self.max_backoff = Duration::ZERO;
        self
    }

    // ==================== Derived Values ====================

    /// Delay to wait after failed attempt number `attempt` (1-based).
    pub fn backoff_for(&self, attempt: u32) -> Duration {
        let exponent = attempt.saturating_sub(1).min(32) as i32;
        let factor = self.backoff_multiplier.max(1.0).powi(exponent);
        let millis = self.initial_backoff.as_millis() as f64 * factor;
        let capped = millis.min(self.max_backoff.as_millis() as f64);
        Duration::from_millis(capped.max(0.0) as u64)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default() {
        let params = ExecutionParams::default();
        assert_eq!(params.max_attempts, 3);
        assert_eq!(params.stage_timeout, Duration::from_secs(180));
    }

    #[test]
    fn test_builder() {
        let params = ExecutionParams::default()
            .with_max_attempts(5)
            .with_stage_timeout(Duration::from_secs(30));
        assert_eq!(params.max_attempts, 5);
        assert_eq!(params.stage_timeout, Duration::from_secs(30));

        assert_eq!(ExecutionParams::default().with_max_attempts(0).max_attempts, 1);
    }

    #[test]
    fn test_backoff_grows_and_caps() {
        let params = ExecutionParams::default()
            .with_initial_backoff(Duration::from_millis(100))
            .with_backoff_multiplier(2.0)
            .with_max_backoff(Duration::from_millis(500));

        assert_eq!(params.backoff_for(1), Duration::from_millis(100));
        assert_eq!(params.backoff_for(2), Duration::from_millis(200));
        assert_eq!(params.backoff_for(3), Duration::from_millis(400));
        assert_eq!(params.backoff_for(4), Duration::from_millis(500));
        assert_eq!(params.backoff_for(40), Duration::from_millis(500));
    }

    #[test]
    fn test_without_backoff() {
        let params = ExecutionParams::default().without_backoff();
        assert_eq!(params.backoff_for(3), Duration::ZERO);
    }
}
