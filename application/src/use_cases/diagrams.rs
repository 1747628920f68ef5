//! Diagram use cases.
//!
//! Plans diagrams for an accepted stage result, renders them through the
//! [`DiagramRenderer`] port, validates the output and stores the artifacts.
//! Also covers user edits and deletion of stored artifacts.

use crate::ports::diagram_renderer::{DiagramRenderer, RendererError};
use crate::ports::diagram_repository::{DiagramRepository, RepositoryError};
use crate::ports::event_logger::{NoWorkflowLogger, WorkflowEvent, WorkflowEventLogger};
use archmesh_domain::{
    DiagramArtifact, DiagramId, DiagramPlanner, DiagramValidationError, ProjectId, SessionId,
    StageResult, validate_source,
};
use chrono::Utc;
use serde_json::json;
use std::sync::Arc;
use thiserror::Error;
use tracing::{debug, info, warn};

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum DiagramError {
    #[error("Renderer error: {0}")]
    Render(#[from] RendererError),

    #[error("Invalid diagram output: {0}")]
    InvalidOutput(#[from] DiagramValidationError),

    #[error("Diagram not found: {0}")]
    NotFound(DiagramId),

    #[error("Diagram {0} is not editable")]
    NotEditable(DiagramId),

    #[error("Repository error: {0}")]
    Repository(RepositoryError),
}

impl From<RepositoryError> for DiagramError {
    fn from(e: RepositoryError) -> Self {
        match e {
            RepositoryError::NotFound(id) => DiagramError::NotFound(id),
            other => DiagramError::Repository(other),
        }
    }
}

pub struct DiagramService {
    planner: DiagramPlanner,
    renderer: Arc<dyn DiagramRenderer>,
    repository: Arc<dyn DiagramRepository>,
    logger: Arc<dyn WorkflowEventLogger>,
}

impl DiagramService {
    pub fn new(
        planner: DiagramPlanner,
        renderer: Arc<dyn DiagramRenderer>,
        repository: Arc<dyn DiagramRepository>,
    ) -> Self {
        Self {
            planner,
            renderer,
            repository,
            logger: Arc::new(NoWorkflowLogger),
        }
    }

    pub fn with_logger(mut self, logger: Arc<dyn WorkflowEventLogger>) -> Self {
        self.logger = logger;
        self
    }

    /// Render and store every diagram planned for `result`.
    ///
    /// A failing diagram is logged and skipped; the others are still
    /// produced. Returns the stored artifacts in plan order.
    pub async fn generate_for_stage(
        &self,
        project_id: &ProjectId,
        session_id: &SessionId,
        result: &StageResult,
    ) -> Vec<DiagramArtifact> {
        let requests = self.planner.plan(result.stage, result);
        debug!(
            session_id = %session_id,
            stage = %result.stage,
            count = requests.len(),
            "Planned diagrams"
        );

        let mut artifacts = Vec::with_capacity(requests.len());
        for request in requests {
            let outcome = async {
                let source = self.renderer.render(&request).await?;
                validate_source(request.format, request.diagram_type, &source)?;
                let artifact = DiagramArtifact::new(
                    project_id.clone(),
                    session_id.clone(),
                    &request,
                    source,
                    Utc::now(),
                );
                self.repository.save(artifact.clone()).await?;
                Ok::<_, DiagramError>(artifact)
            }
            .await;

            match outcome {
                Ok(artifact) => {
                    info!(
                        session_id = %session_id,
                        diagram_id = %artifact.id,
                        diagram_type = %artifact.diagram_type,
                        "Diagram generated"
                    );
                    self.logger.log(WorkflowEvent::new(
                        "diagram_generated",
                        json!({
                            "session_id": session_id.as_str(),
                            "diagram_id": artifact.id.as_str(),
                            "stage": artifact.stage.as_str(),
                            "diagram_type": artifact.diagram_type.as_str(),
                            "format": artifact.format.as_str(),
                        }),
                    ));
                    artifacts.push(artifact);
                }
                Err(e) => {
                    warn!(
                        session_id = %session_id,
                        stage = %request.stage,
                        diagram_type = %request.diagram_type,
                        error = %e,
                        "Diagram generation failed"
                    );
                    self.logger.log(WorkflowEvent::new(
                        "diagram_failed",
                        json!({
                            "session_id": session_id.as_str(),
                            "stage": request.stage.as_str(),
                            "diagram_type": request.diagram_type.as_str(),
                            "error": e.to_string(),
                        }),
                    ));
                }
            }
        }
        artifacts
    }

    pub async fn list_for_session(
        &self,
        session_id: &SessionId,
    ) -> Result<Vec<DiagramArtifact>, DiagramError> {
        Ok(self.repository.list_for_session(session_id).await?)
    }

    pub async fn list_for_project(
        &self,
        project_id: &ProjectId,
    ) -> Result<Vec<DiagramArtifact>, DiagramError> {
        Ok(self.repository.list_for_project(project_id).await?)
    }

    pub async fn get(&self, id: &DiagramId) -> Result<DiagramArtifact, DiagramError> {
        self.repository
            .get(id)
            .await?
            .ok_or_else(|| DiagramError::NotFound(id.clone()))
    }

    /// Replace a diagram's source after a user edit.
    ///
    /// The new source must pass the same header check as rendered output.
    pub async fn update_source(
        &self,
        id: &DiagramId,
        source: impl Into<String>,
    ) -> Result<DiagramArtifact, DiagramError> {
        let mut artifact = self.get(id).await?;
        if !artifact.editable {
            return Err(DiagramError::NotEditable(id.clone()));
        }
        let source = source.into();
        validate_source(artifact.format, artifact.diagram_type, &source)?;
        artifact.edit(source, Utc::now());
        self.repository.update(artifact.clone()).await?;
        Ok(artifact)
    }

    pub async fn delete(&self, id: &DiagramId) -> Result<(), DiagramError> {
        if self.repository.delete(id).await? {
            Ok(())
        } else {
            Err(DiagramError::NotFound(id.clone()))
        }
    }
}
