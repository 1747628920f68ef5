//! Session store port
//!
//! Durable record of workflow sessions. Every write after the initial
//! insert is a compare-and-set on the session version.

use archmesh_domain::{SessionId, WorkflowSession};
use async_trait::async_trait;
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum StoreError {
    #[error("Session not found: {0}")]
    NotFound(SessionId),

    #[error("Session already exists: {0}")]
    AlreadyExists(SessionId),

    #[error("Version conflict: expected {expected}, found {actual}")]
    VersionConflict { expected: u64, actual: u64 },

    #[error("Store backend error: {0}")]
    Backend(String),
}

#[async_trait]
pub trait SessionStore: Send + Sync {
    /// Persist a new session. The stored copy (version 1) is returned.
    async fn insert(&self, session: WorkflowSession) -> Result<WorkflowSession, StoreError>;

    async fn load(&self, id: &SessionId) -> Result<WorkflowSession, StoreError>;

    /// Replace the stored session if its version still equals
    /// `expected_version`. On success the stored copy carries
    /// `expected_version + 1` and is returned.
    async fn compare_and_swap(
        &self,
        session: WorkflowSession,
        expected_version: u64,
    ) -> Result<WorkflowSession, StoreError>;

    async fn delete(&self, id: &SessionId) -> Result<(), StoreError>;

    /// Sessions that have not reached a terminal state.
    async fn list_active(&self) -> Result<Vec<WorkflowSession>, StoreError>;
}
