//! Diagram repository port

use archmesh_domain::{DiagramArtifact, DiagramId, ProjectId, SessionId};
use async_trait::async_trait;
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum RepositoryError {
    #[error("Diagram not found: {0}")]
    NotFound(DiagramId),

    #[error("Repository backend error: {0}")]
    Backend(String),
}

/// Storage for diagram artifacts. Artifacts reference sessions by id only
/// and outlive them.
#[async_trait]
pub trait DiagramRepository: Send + Sync {
    async fn save(&self, artifact: DiagramArtifact) -> Result<(), RepositoryError>;

    async fn get(&self, id: &DiagramId) -> Result<Option<DiagramArtifact>, RepositoryError>;

    /// Replace an existing artifact. Fails with `NotFound` if it was deleted.
    async fn update(&self, artifact: DiagramArtifact) -> Result<(), RepositoryError>;

    /// Returns `true` if an artifact was removed.
    async fn delete(&self, id: &DiagramId) -> Result<bool, RepositoryError>;

    /// Artifacts for a session, oldest first.
    async fn list_for_session(
        &self,
        session_id: &SessionId,
    ) -> Result<Vec<DiagramArtifact>, RepositoryError>;

    /// Artifacts for a project, oldest first.
    async fn list_for_project(
        &self,
        project_id: &ProjectId,
    ) -> Result<Vec<DiagramArtifact>, RepositoryError>;
}
