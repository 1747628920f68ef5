//! Mock ports shared by the use case tests.

use crate::ports::diagram_renderer::{DiagramRenderer, RendererError};
use crate::ports::diagram_repository::{DiagramRepository, RepositoryError};
use crate::ports::event_logger::{WorkflowEvent, WorkflowEventLogger};
use crate::ports::llm_gateway::{GatewayError, GatewayRequest, GatewayResponse, LlmGateway};
use crate::ports::session_store::{SessionStore, StoreError};
use archmesh_domain::{
    DiagramArtifact, DiagramFormat, DiagramId, DiagramRequest, DiagramType, ProjectId, SessionId,
    StagePayload, TaskType, WorkflowSession,
    payload::{Requirement, RequirementsPayload},
};
use async_trait::async_trait;
use std::collections::{HashMap, VecDeque};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use tokio::sync::Semaphore;

pub(crate) fn requirements_json() -> String {
    r#"```json
{
  "summary": "Blog platform",
  "actors": [{"name": "Reader"}, {"name": "Author"}],
  "functional": [
    {"id": "FR-1", "description": "Authors publish posts"},
    {"id": "FR-2", "description": "Readers comment"}
  ],
  "non_functional": [{"category": "performance", "description": "p95 under 200ms"}]
}
```"#
    .to_string()
}

pub(crate) fn architecture_json() -> String {
    r#"{
  "style": "modular monolith",
  "components": [
    {"name": "Web", "responsibility": "Serve pages"},
    {"name": "Db", "responsibility": "Store posts", "kind": "database"}
  ],
  "relationships": [{"from": "Web", "to": "Db", "description": "reads/writes"}],
  "nfr_mappings": [{"requirement": "p95 under 200ms", "tactic": "caching", "components": ["Web"]}]
}"#
    .to_string()
}

pub(crate) fn existing_system_json() -> String {
    r#"{
  "summary": "Legacy billing monolith",
  "components": [{"name": "Billing", "responsibility": "Invoices"}],
  "pain_points": ["slow releases"]
}"#
    .to_string()
}

pub(crate) fn integration_json() -> String {
    r#"{
  "flows": [
    {"name": "Invoice sync", "steps": [{"from": "Billing", "to": "Web", "message": "invoice created"}]}
  ],
  "migration_steps": ["strangle billing"]
}"#
    .to_string()
}

pub(crate) fn requirements_payload() -> StagePayload {
    StagePayload::Requirements(RequirementsPayload {
        summary: "Blog platform".to_string(),
        actors: vec![],
        functional: vec![Requirement::new("FR-1", "Authors publish posts")],
        non_functional: vec![],
        constraints: vec![],
    })
}

type Scripted = Result<String, GatewayError>;

/// Gateway that replays scripted responses.
///
/// Responses queued for a task type are used first; otherwise the shared
/// queue is consumed. An exhausted script answers with an error.
pub(crate) struct ScriptedGateway {
    shared: Mutex<VecDeque<Scripted>>,
    per_task: Mutex<HashMap<TaskType, VecDeque<Scripted>>>,
    requests: Mutex<Vec<GatewayRequest>>,
    calls: AtomicUsize,
    entered: Arc<Semaphore>,
    gate: Option<Arc<Semaphore>>,
}

impl ScriptedGateway {
    pub(crate) fn new(responses: Vec<Scripted>) -> Self {
        Self {
            shared: Mutex::new(responses.into()),
            per_task: Mutex::new(HashMap::new()),
            requests: Mutex::new(Vec::new()),
            calls: AtomicUsize::new(0),
            entered: Arc::new(Semaphore::new(0)),
            gate: None,
        }
    }

    pub(crate) fn with_texts(texts: Vec<String>) -> Self {
        Self::new(texts.into_iter().map(Ok).collect())
    }

    /// Happy-path responses for every stage.
    pub(crate) fn all_stages() -> Self {
        Self::new(vec![])
            .for_task(TaskType::RequirementsParsing, vec![Ok(requirements_json())])
            .for_task(TaskType::ArchitectureDesign, vec![Ok(architecture_json())])
            .for_task(TaskType::SystemAnalysis, vec![Ok(existing_system_json())])
            .for_task(TaskType::IntegrationPlanning, vec![Ok(integration_json())])
    }

    pub(crate) fn for_task(self, task: TaskType, responses: Vec<Scripted>) -> Self {
        self.per_task
            .lock()
            .unwrap()
            .entry(task)
            .or_default()
            .extend(responses);
        self
    }

    /// Block every call until a permit is added to the returned semaphore.
    pub(crate) fn gated(mut self) -> (Self, Arc<Semaphore>) {
        let gate = Arc::new(Semaphore::new(0));
        self.gate = Some(gate.clone());
        (self, gate)
    }

    /// Gains a permit whenever a call reaches the gateway.
    pub(crate) fn entered(&self) -> Arc<Semaphore> {
        self.entered.clone()
    }

    pub(crate) fn call_count(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    pub(crate) fn requests(&self) -> Vec<GatewayRequest> {
        self.requests.lock().unwrap().clone()
    }

    fn next(&self, task: TaskType) -> Scripted {
        let mut per_task = self.per_task.lock().unwrap();
        if let Some(queue) = per_task.get_mut(&task) {
            // the last per-task response repeats, so re-runs stay scripted
            if queue.len() > 1 {
                return queue.pop_front().unwrap();
            }
            if let Some(last) = queue.front() {
                return last.clone();
            }
        }
        drop(per_task);
        self.shared
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| Err(GatewayError::Other("no more scripted responses".into())))
    }
}

#[async_trait]
impl LlmGateway for ScriptedGateway {
    async fn invoke(&self, request: GatewayRequest) -> Result<GatewayResponse, GatewayError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let task = request.task_type;
        let provider = request.route.provider;
        let model = request.route.model.clone();
        self.requests.lock().unwrap().push(request);
        self.entered.add_permits(1);
        if let Some(gate) = &self.gate {
            gate.acquire().await.unwrap().forget();
        }
        self.next(task).map(|text| GatewayResponse {
            text,
            provider,
            model,
        })
    }
}

/// Session store with the same compare-and-set contract as the real adapter.
#[derive(Default)]
pub(crate) struct MemoryStore {
    sessions: Mutex<HashMap<SessionId, WorkflowSession>>,
}

#[async_trait]
impl SessionStore for MemoryStore {
    async fn insert(&self, mut session: WorkflowSession) -> Result<WorkflowSession, StoreError> {
        let mut sessions = self.sessions.lock().unwrap();
        if sessions.contains_key(session.id()) {
            return Err(StoreError::AlreadyExists(session.id().clone()));
        }
        session.set_version(1);
        sessions.insert(session.id().clone(), session.clone());
        Ok(session)
    }

    async fn load(&self, id: &SessionId) -> Result<WorkflowSession, StoreError> {
        self.sessions
            .lock()
            .unwrap()
            .get(id)
            .cloned()
            .ok_or_else(|| StoreError::NotFound(id.clone()))
    }

    async fn compare_and_swap(
        &self,
        mut session: WorkflowSession,
        expected_version: u64,
    ) -> Result<WorkflowSession, StoreError> {
        let mut sessions = self.sessions.lock().unwrap();
        let current = sessions
            .get(session.id())
            .ok_or_else(|| StoreError::NotFound(session.id().clone()))?;
        if current.version() != expected_version {
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
            .lock()
            .unwrap()
            .remove(id)
            .map(|_| ())
            .ok_or_else(|| StoreError::NotFound(id.clone()))
    }

    async fn list_active(&self) -> Result<Vec<WorkflowSession>, StoreError> {
        Ok(self
            .sessions
            .lock()
            .unwrap()
            .values()
            .filter(|s| s.is_active())
            .cloned()
            .collect())
    }
}

#[derive(Default)]
pub(crate) struct MemoryDiagrams {
    artifacts: Mutex<Vec<DiagramArtifact>>,
}

#[async_trait]
impl DiagramRepository for MemoryDiagrams {
    async fn save(&self, artifact: DiagramArtifact) -> Result<(), RepositoryError> {
        self.artifacts.lock().unwrap().push(artifact);
        Ok(())
    }

    async fn get(&self, id: &DiagramId) -> Result<Option<DiagramArtifact>, RepositoryError> {
        Ok(self
            .artifacts
            .lock()
            .unwrap()
            .iter()
            .find(|a| &a.id == id)
            .cloned())
    }

    async fn update(&self, artifact: DiagramArtifact) -> Result<(), RepositoryError> {
        let mut artifacts = self.artifacts.lock().unwrap();
        match artifacts.iter_mut().find(|a| a.id == artifact.id) {
            Some(slot) => {
                *slot = artifact;
                Ok(())
            }
            None => Err(RepositoryError::NotFound(artifact.id)),
        }
    }

    async fn delete(&self, id: &DiagramId) -> Result<bool, RepositoryError> {
        let mut artifacts = self.artifacts.lock().unwrap();
        let before = artifacts.len();
        artifacts.retain(|a| &a.id != id);
        Ok(artifacts.len() != before)
    }

    async fn list_for_session(
        &self,
        session_id: &SessionId,
    ) -> Result<Vec<DiagramArtifact>, RepositoryError> {
        Ok(self
            .artifacts
            .lock()
            .unwrap()
            .iter()
            .filter(|a| &a.session_id == session_id)
            .cloned()
            .collect())
    }

    async fn list_for_project(
        &self,
        project_id: &ProjectId,
    ) -> Result<Vec<DiagramArtifact>, RepositoryError> {
        Ok(self
            .artifacts
            .lock()
            .unwrap()
            .iter()
            .filter(|a| &a.project_id == project_id)
            .cloned()
            .collect())
    }
}

/// Renders a minimal but valid diagram for any request.
pub(crate) struct StubRenderer;

#[async_trait]
impl DiagramRenderer for StubRenderer {
    async fn render(&self, request: &DiagramRequest) -> Result<String, RendererError> {
        Ok(match (request.format, request.diagram_type) {
            (DiagramFormat::Plantuml, _) => format!("@startuml\ntitle {}\n@enduml\n", request.title),
            (DiagramFormat::Mermaid, DiagramType::Sequence) => {
                "sequenceDiagram\n  A->>B: hi\n".to_string()
            }
            (DiagramFormat::Mermaid, _) => "flowchart LR\n  A --> B\n".to_string(),
        })
    }
}

/// Renderer that fails or emits invalid output.
pub(crate) enum BrokenRenderer {
    Fails,
    Garbage,
}

#[async_trait]
impl DiagramRenderer for BrokenRenderer {
    async fn render(&self, _request: &DiagramRequest) -> Result<String, RendererError> {
        match self {
            BrokenRenderer::Fails => Err(RendererError::Failed("renderer offline".into())),
            BrokenRenderer::Garbage => Ok("not a diagram".to_string()),
        }
    }
}

#[derive(Default)]
pub(crate) struct RecordingLogger {
    events: Mutex<Vec<WorkflowEvent>>,
}

impl RecordingLogger {
    pub(crate) fn types(&self) -> Vec<&'static str> {
        self.events
            .lock()
            .unwrap()
            .iter()
            .map(|e| e.event_type)
            .collect()
    }
}

impl WorkflowEventLogger for RecordingLogger {
    fn log(&self, event: WorkflowEvent) {
        self.events.lock().unwrap().push(event);
    }
}
