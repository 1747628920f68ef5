//! `tokio::sync::RwLock`-backed session store and diagram repository.
//!
//! Both live for the duration of the process. The session store enforces
//! version checks on every write after insert.

use archmesh_application::ports::diagram_repository::{DiagramRepository, RepositoryError};
use archmesh_application::ports::session_store::{SessionStore, StoreError};
use archmesh_domain::{DiagramArtifact, DiagramId, ProjectId, SessionId, WorkflowSession};
use async_trait::async_trait;
use std::collections::HashMap;
use tokio::sync::RwLock;
use tracing::debug;

#[derive(Default)]
pub struct InMemorySessionStore {
    sessions: RwLock<HashMap<SessionId, WorkflowSession>>,
}

impl InMemorySessionStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn len(&self) -> usize {
        self.sessions.read().await.len()
    }
}

#[async_trait]
impl SessionStore for InMemorySessionStore {
    async fn insert(&self, mut session: WorkflowSession) -> Result<WorkflowSession, StoreError> {
        let mut sessions = self.sessions.write().await;
        if sessions.contains_key(session.id()) {
            return Err(StoreError::AlreadyExists(session.id().clone()));
        }
        session.set_version(1);
        sessions.insert(session.id().clone(), session.clone());
        debug!(session_id = %session.id(), "Session stored");
        Ok(session)
    }

    async fn load(&self, id: &SessionId) -> Result<WorkflowSession, StoreError> {
        self.sessions
            .read()
            .await
            .get(id)
            .cloned()
            .ok_or_else(|| StoreError::NotFound(id.clone()))
    }

    async fn compare_and_swap(
        &self,
        mut session: WorkflowSession,
        expected_version: u64,
    ) -> Result<WorkflowSession, StoreError> {
        let mut sessions = self.sessions.write().await;
        let current = sessions
            .get(session.id())
            .ok_or_else(|| StoreError::NotFound(session.id().clone()))?;

        if current.version() != expected_version {
            debug!(
                session_id = %session.id(),
                expected = expected_version,
                actual = current.version(),
                "Rejected stale session write"
            );
            return Err(StoreError::VersionConflict {
                expected: expected_version,
                actual: current.version(),
            });
        }

        session.set_version(expected_version + 1);
        sessions.insert(session.id().clone(), session.clone());
        Ok(session)
    }

    async fn delete(&self, id: &SessionId) -> Result<(), StoreError> {
        self.sessions
            .write()
            .await
            .remove(id)
            .map(|_| ())
            .ok_or_else(|| StoreError::NotFound(id.clone()))
    }

    async fn list_active(&self) -> Result<Vec<WorkflowSession>, StoreError> {
        let mut active: Vec<WorkflowSession> = self
            .sessions
            .read()
            .await
            .values()
            .filter(|s| s.is_active())
            .cloned()
            .collect();
        active.sort_by_key(|s| s.started_at());
        Ok(active)
    }
}

#[derive(Default)]
pub struct InMemoryDiagramRepository {
    artifacts: RwLock<HashMap<DiagramId, DiagramArtifact>>,
}

impl InMemoryDiagramRepository {
    pub fn new() -> Self {
        Self::default()
    }

    async fn collect_where(&self, keep: impl Fn(&DiagramArtifact) -> bool) -> Vec<DiagramArtifact> {
        let mut found: Vec<DiagramArtifact> = self
            .artifacts
            .read()
            .await
            .values()
            .filter(|a| keep(a))
            .cloned()
            .collect();
        found.sort_by(|a, b| {
            a.created_at
                .cmp(&b.created_at)
                .then_with(|| a.id.cmp(&b.id))
        });
        found
    }
}

#[async_trait]
impl DiagramRepository for InMemoryDiagramRepository {
    async fn save(&self, artifact: DiagramArtifact) -> Result<(), RepositoryError> {
        self.artifacts
            .write()
            .await
            .insert(artifact.id.clone(), artifact);
        Ok(())
    }

    async fn get(&self, id: &DiagramId) -> Result<Option<DiagramArtifact>, RepositoryError> {
        Ok(self.artifacts.read().await.get(id).cloned())
    }

    async fn update(&self, artifact: DiagramArtifact) -> Result<(), RepositoryError> {
        let mut artifacts = self.artifacts.write().await;
        match artifacts.get_mut(&artifact.id) {
            Some(slot) => {
                *slot = artifact;
                Ok(())
            }
            None => Err(RepositoryError::NotFound(artifact.id)),
        }
    }

    async fn delete(&self, id: &DiagramId) -> Result<bool, RepositoryError> {
        Ok(self.artifacts.write().await.remove(id).is_some())
    }

    async fn list_for_session(
        &self,
        session_id: &SessionId,
    ) -> Result<Vec<DiagramArtifact>, RepositoryError> {
        Ok(self.collect_where(|a| &a.session_id == session_id).await)
    }

    async fn list_for_project(
        &self,
        project_id: &ProjectId,
    ) -> Result<Vec<DiagramArtifact>, RepositoryError> {
        Ok(self.collect_where(|a| &a.project_id == project_id).await)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use archmesh_domain::{
        DiagramContext, DiagramFormat, DiagramRequest, DiagramType, StageName, WorkflowInput,
        WorkflowMode,
    };
    use chrono::{Duration, Utc};

    fn session() -> WorkflowSession {
        WorkflowSession::new(
            "proj-1",
            WorkflowMode::Greenfield,
            WorkflowInput::new("Build a booking system"),
            Utc::now(),
        )
    }

    fn artifact(project: &str, session: &str, offset_secs: i64) -> DiagramArtifact {
        let request = DiagramRequest {
            stage: StageName::ParseRequirements,
            diagram_type: DiagramType::Context,
            format: DiagramFormat::Plantuml,
            title: "System Context".to_string(),
            context: DiagramContext::default(),
        };
        DiagramArtifact::new(
            ProjectId::new(project),
            SessionId::new(session),
            &request,
            "@startuml\n@enduml",
            Utc::now() + Duration::seconds(offset_secs),
        )
    }

    #[tokio::test]
    async fn test_insert_sets_version_one_and_rejects_duplicates() {
        let store = InMemorySessionStore::new();
        let stored = store.insert(session()).await.unwrap();
        assert_eq!(stored.version(), 1);

        let err = store.insert(stored.clone()).await.unwrap_err();
        assert_eq!(err, StoreError::AlreadyExists(stored.id().clone()));
        assert_eq!(store.len().await, 1);
    }

    #[tokio::test]
    async fn test_compare_and_swap_bumps_version_once() {
        let store = InMemorySessionStore::new();
        let stored = store.insert(session()).await.unwrap();

        let mut started = stored.clone();
        started.start(Utc::now()).unwrap();
        let swapped = store.compare_and_swap(started, 1).await.unwrap();
        assert_eq!(swapped.version(), 2);

        // A second writer holding version 1 loses.
        let err = store.compare_and_swap(stored, 1).await.unwrap_err();
        assert_eq!(
            err,
            StoreError::VersionConflict {
                expected: 1,
                actual: 2
            }
        );
        assert_eq!(store.load(swapped.id()).await.unwrap().version(), 2);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_concurrent_compare_and_swap_has_one_winner() {
        let store = std::sync::Arc::new(InMemorySessionStore::new());
        let stored = store.insert(session()).await.unwrap();
        let mut started = stored.clone();
        started.start(Utc::now()).unwrap();

        let writers: Vec<_> = (0..8)
            .map(|_| {
                let store = store.clone();
                let session = started.clone();
                tokio::spawn(async move { store.compare_and_swap(session, 1).await })
            })
            .collect();

        let mut won = 0;
        let mut conflicts = 0;
        for writer in writers {
            match writer.await.unwrap() {
                Ok(session) => {
                    assert_eq!(session.version(), 2);
                    won += 1;
                }
                Err(StoreError::VersionConflict { expected: 1, actual: 2 }) => conflicts += 1,
                Err(e) => panic!("unexpected error: {e}"),
            }
        }
        assert_eq!((won, conflicts), (1, 7));
        assert_eq!(store.load(stored.id()).await.unwrap().version(), 2);
    }

    #[tokio::test]
    async fn test_missing_session() {
        let store = InMemorySessionStore::new();
        let id = SessionId::new("nope");
        assert_eq!(
            store.load(&id).await.unwrap_err(),
            StoreError::NotFound(id.clone())
        );
        assert_eq!(
            store.delete(&id).await.unwrap_err(),
            StoreError::NotFound(id)
        );
    }

    #[tokio::test]
    async fn test_list_active_skips_terminal_sessions() {
        let store = InMemorySessionStore::new();
        let live = store.insert(session()).await.unwrap();
        let done = store.insert(session()).await.unwrap();

        let mut cancelled = done.clone();
        cancelled.cancel(Utc::now()).unwrap();
        store.compare_and_swap(cancelled, done.version()).await.unwrap();

        let active = store.list_active().await.unwrap();
        assert_eq!(active.len(), 1);
        assert_eq!(active[0].id(), live.id());
    }

    #[tokio::test]
    async fn test_diagram_repository_crud() {
        let repo = InMemoryDiagramRepository::new();
        let mut diagram = artifact("proj-1", "sess-1", 0);
        repo.save(diagram.clone()).await.unwrap();

        diagram.edit("@startuml\nA -> B\n@enduml", Utc::now());
        repo.update(diagram.clone()).await.unwrap();
        assert_eq!(
            repo.get(&diagram.id).await.unwrap().unwrap().source,
            diagram.source
        );

        assert!(repo.delete(&diagram.id).await.unwrap());
        assert!(!repo.delete(&diagram.id).await.unwrap());
        assert_eq!(
            repo.update(diagram.clone()).await.unwrap_err(),
            RepositoryError::NotFound(diagram.id.clone())
        );
        assert!(repo.get(&diagram.id).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_listing_is_scoped_and_ordered() {
        let repo = InMemoryDiagramRepository::new();
        let later = artifact("proj-1", "sess-1", 10);
        let earlier = artifact("proj-1", "sess-1", 0);
        let other_session = artifact("proj-1", "sess-2", 5);
        let other_project = artifact("proj-2", "sess-3", 0);
        for a in [&later, &earlier, &other_session, &other_project] {
            repo.save(a.clone()).await.unwrap();
        }

        let by_session = repo.list_for_session(&SessionId::new("sess-1")).await.unwrap();
        assert_eq!(
            by_session.iter().map(|a| &a.id).collect::<Vec<_>>(),
            vec![&earlier.id, &later.id]
        );

        let by_project = repo.list_for_project(&ProjectId::new("proj-1")).await.unwrap();
        assert_eq!(by_project.len(), 3);
        assert_eq!(by_project[1].id, other_session.id);
    }
}
