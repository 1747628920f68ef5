//! Domain error types

use thiserror::Error;

/// Domain-level errors raised by workflow transition rules.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum DomainError {
    #[error("Unknown workflow mode: {0}")]
    InvalidMode(String),

    #[error("Unknown stage: {0}")]
    UnknownStage(String),

    #[error("Unknown provider: {0}")]
    UnknownProvider(String),

    #[error("Unknown review decision: {0}")]
    InvalidDecision(String),

    #[error("Cannot {operation} while session is {state}")]
    InvalidState { operation: &'static str, state: String },

    #[error("Stale transition: {0}")]
    StaleTransition(String),

    #[error("Invalid session record: {0}")]
    InvalidRecord(String),
}

impl DomainError {
    /// Check if this error is a rejected out-of-order transition
    pub fn is_stale(&self) -> bool {
        matches!(self, DomainError::StaleTransition(_))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_invalid_state_display() {
        let error = DomainError::InvalidState {
            operation: "submit review",
            state: "running:parse_requirements".to_string(),
        };
        assert_eq!(
            error.to_string(),
            "Cannot submit review while session is running:parse_requirements"
        );
    }

    #[test]
    fn test_is_stale_check() {
        assert!(DomainError::StaleTransition("dup".to_string()).is_stale());
        assert!(!DomainError::InvalidMode("x".to_string()).is_stale());
    }
}
