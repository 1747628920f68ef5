//! Execute Stage use case.
//!
//! Runs one named stage: checks upstream results, builds the prompts,
//! calls the gateway on the route chosen for the stage's task type, and
//! parses the response into a validated [`StageResult`]. Persistence and
//! transitions belong to the workflow service.

use crate::ports::llm_gateway::{GatewayError, GatewayRequest, LlmGateway};
use archmesh_domain::{
    FailureKind, PayloadError, ProviderSelection, SessionId, StageName, StagePayload,
    StagePromptTemplate, StageResult, WorkflowInput, WorkflowSession, parse_stage_output,
};
use std::collections::HashMap;
use std::sync::Arc;
use thiserror::Error;
use tracing::{debug, info};

/// Errors from a single stage execution attempt.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ExecutionError {
    #[error("{stage} requires a result from {missing}")]
    MissingDependency {
        stage: StageName,
        missing: StageName,
    },

    #[error("{0}")]
    Retryable(String),

    #[error("{0}")]
    Fatal(String),
}

impl ExecutionError {
    pub fn is_retryable(&self) -> bool {
        matches!(self, ExecutionError::Retryable(_))
    }

    /// Failure kind recorded when this error ends the session.
    pub fn failure_kind(&self) -> FailureKind {
        match self {
            ExecutionError::MissingDependency { .. } => FailureKind::MissingDependency,
            ExecutionError::Retryable(_) => FailureKind::RetriesExhausted,
            ExecutionError::Fatal(_) => FailureKind::Execution,
        }
    }
}

impl From<GatewayError> for ExecutionError {
    fn from(e: GatewayError) -> Self {
        if e.is_retryable() {
            ExecutionError::Retryable(format!("gateway: {}", e))
        } else {
            ExecutionError::Fatal(format!("gateway: {}", e))
        }
    }
}

impl From<PayloadError> for ExecutionError {
    fn from(e: PayloadError) -> Self {
        ExecutionError::Retryable(format!("invalid model output: {}", e))
    }
}

/// What the executor needs to know about a session.
#[derive(Debug, Clone, PartialEq)]
pub struct SessionContext {
    pub session_id: SessionId,
    pub input: WorkflowInput,
    /// Newest payload per completed stage
    pub upstream: HashMap<StageName, StagePayload>,
    pub attempt: u32,
}

impl SessionContext {
    pub fn new(session_id: SessionId, input: WorkflowInput) -> Self {
        Self {
            session_id,
            input,
            upstream: HashMap::new(),
            attempt: 1,
        }
    }

    pub fn from_session(session: &WorkflowSession, attempt: u32) -> Self {
        let upstream = session
            .latest_results()
            .into_iter()
            .map(|(stage, result)| (stage, result.payload.clone()))
            .collect();
        Self {
            session_id: session.id().clone(),
            input: session.input().clone(),
            upstream,
            attempt,
        }
    }

    pub fn with_upstream(mut self, payload: StagePayload) -> Self {
        self.upstream.insert(payload.stage(), payload);
        self
    }
}

/// Use case for executing a single workflow stage.
pub struct StageExecutor {
    gateway: Arc<dyn LlmGateway>,
    selection: ProviderSelection,
}

impl StageExecutor {
    pub fn new(gateway: Arc<dyn LlmGateway>, selection: ProviderSelection) -> Self {
        Self { gateway, selection }
    }

    pub fn selection(&self) -> &ProviderSelection {
        &self.selection
    }

    /// Execute `stage` against `ctx`.
    ///
    /// Missing upstream results fail before the gateway is called.
    pub async fn execute(
        &self,
        stage: StageName,
        ctx: &SessionContext,
    ) -> Result<StageResult, ExecutionError> {
        let mut upstream = Vec::new();
        for dependency in stage.dependencies() {
            match ctx.upstream.get(dependency) {
                Some(payload) => upstream.push((*dependency, payload)),
                None => {
                    return Err(ExecutionError::MissingDependency {
                        stage,
                        missing: *dependency,
                    });
                }
            }
        }

        let task_type = stage.task_type();
        let route = self.selection.route_for(task_type);
        info!(
            session_id = %ctx.session_id,
            stage = %stage,
            attempt = ctx.attempt,
            provider = %route.provider,
            model = %route.model,
            "Executing stage"
        );

        let request = GatewayRequest::new(
            task_type,
            route,
            StagePromptTemplate::system(stage),
            StagePromptTemplate::user(stage, &ctx.input.text, &ctx.input.amendments, &upstream),
        )
        .with_context("session_id", ctx.session_id.as_str())
        .with_context("stage", stage.as_str());

        let response = self.gateway.invoke(request).await?;
        debug!(
            stage = %stage,
            provider = %response.provider,
            chars = response.text.len(),
            "Stage response received"
        );

        let parsed = parse_stage_output(stage, &response.text)?;
        let mut result = StageResult::new(
            parsed.payload,
            response.text,
            response.provider,
            response.model,
        )
        .with_attempt(ctx.attempt);
        if let Some(confidence) = parsed.confidence {
            result = result.with_confidence(confidence);
        }
        Ok(result)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::use_cases::test_support::{
        ScriptedGateway, architecture_json, requirements_json, requirements_payload,
    };
    use archmesh_domain::{Environment, ProviderKind, TaskType};

    fn ctx() -> SessionContext {
        SessionContext::new(SessionId::new("s1"), WorkflowInput::new("Build a blog platform"))
    }

    #[tokio::test]
    async fn test_execute_parses_and_validates() {
        let gateway = Arc::new(ScriptedGateway::with_texts(vec![requirements_json()]));
        let executor = StageExecutor::new(gateway.clone(), ProviderSelection::default());

        let result = executor
            .execute(StageName::ParseRequirements, &ctx())
            .await
            .unwrap();

        assert_eq!(result.stage, StageName::ParseRequirements);
        assert_eq!(result.provider, ProviderKind::Ollama);
        assert!(matches!(result.payload, StagePayload::Requirements(_)));
        assert_eq!(gateway.call_count(), 1);
    }

    #[tokio::test]
    async fn test_missing_dependency_skips_gateway() {
        let gateway = Arc::new(ScriptedGateway::with_texts(vec![architecture_json()]));
        let executor = StageExecutor::new(gateway.clone(), ProviderSelection::default());

        let err = executor
            .execute(StageName::DesignArchitecture, &ctx())
            .await
            .unwrap_err();

        assert_eq!(
            err,
            ExecutionError::MissingDependency {
                stage: StageName::DesignArchitecture,
                missing: StageName::ParseRequirements
            }
        );
        assert_eq!(err.failure_kind(), FailureKind::MissingDependency);
        assert_eq!(gateway.call_count(), 0);
    }

    #[tokio::test]
    async fn test_prompt_carries_upstream_and_route() {
        let gateway = Arc::new(ScriptedGateway::with_texts(vec![architecture_json()]));
        let executor = StageExecutor::new(
            gateway.clone(),
            ProviderSelection::for_environment(Environment::Production),
        );

        let mut context = ctx().with_upstream(requirements_payload());
        context.input.amendments.push("Add moderation".to_string());
        executor
            .execute(StageName::DesignArchitecture, &context)
            .await
            .unwrap();

        let request = gateway.requests().pop().unwrap();
        assert_eq!(request.task_type, TaskType::ArchitectureDesign);
        assert_eq!(request.route.provider, ProviderKind::Anthropic);
        assert!(request.prompt.contains("Add moderation"));
        assert!(request.prompt.contains("FR-1"));
    }

    #[tokio::test]
    async fn test_non_json_output_is_retryable() {
        let gateway = Arc::new(ScriptedGateway::with_texts(vec![
            "I think you should use microservices.".to_string(),
        ]));
        let executor = StageExecutor::new(gateway, ProviderSelection::default());

        let err = executor
            .execute(StageName::ParseRequirements, &ctx())
            .await
            .unwrap_err();
        assert!(err.is_retryable());
    }

    #[tokio::test]
    async fn test_gateway_errors_are_classified() {
        let gateway = Arc::new(ScriptedGateway::new(vec![
            Err(GatewayError::Timeout),
            Err(GatewayError::Unauthorized(ProviderKind::Ollama)),
        ]));
        let executor = StageExecutor::new(gateway, ProviderSelection::default());

        let first = executor.execute(StageName::ParseRequirements, &ctx()).await;
        assert!(first.unwrap_err().is_retryable());

        let second = executor.execute(StageName::ParseRequirements, &ctx()).await;
        assert_eq!(second.unwrap_err().failure_kind(), FailureKind::Execution);
    }

    #[tokio::test]
    async fn test_reported_confidence_is_used() {
        let text = r#"```json
{"confidence": 0.42, "summary": "Blog", "functional": [{"id": "FR-1", "description": "Post"}]}
```"#;
        let gateway = Arc::new(ScriptedGateway::with_texts(vec![text.to_string()]));
        let executor = StageExecutor::new(gateway, ProviderSelection::default());

        let result = executor
            .execute(StageName::ParseRequirements, &ctx())
            .await
            .unwrap();
        assert_eq!(result.confidence, 0.42);
    }
}
