//! Prompt templates for each workflow stage

use crate::payload::StagePayload;
use crate::workflow::StageName;

/// Templates for generating stage prompts
pub struct StagePromptTemplate;

impl StagePromptTemplate {
    /// System prompt for a stage
    pub fn system(stage: StageName) -> String {
        format!(
            r#"{}

Respond with a single JSON object inside a ```json fenced block and nothing else.
The object must follow this schema:
{}
You may add a top-level "confidence" number between 0 and 1 describing how sure you are."#,
            Self::role(stage),
            Self::schema(stage)
        )
    }

    fn role(stage: StageName) -> &'static str {
        match stage {
            StageName::AnalyzeExistingSystem => {
                r#"You are a senior software architect reverse-engineering an existing system.
Identify its main components, how they interact, the technologies in use, and its pain points."#
            }
            StageName::ParseRequirements => {
                r#"You are a requirements analyst.
Extract the actors, functional requirements, quality requirements and constraints from the input.
Give every functional requirement a short unique id such as FR-1."#
            }
            StageName::DesignArchitecture => {
                r#"You are a software architect designing a target architecture.
Choose an architectural style, define components and their relationships, and map each quality
requirement to the tactic and components that address it. Only reference components you define."#
            }
            StageName::PlanIntegration => {
                r#"You are an integration architect planning how a new architecture replaces an existing system.
Describe the key integration flows as ordered message steps, the migration steps, and the risks."#
            }
        }
    }

    /// JSON schema sketch for the stage's payload
    pub fn schema(stage: StageName) -> &'static str {
        match stage {
            StageName::AnalyzeExistingSystem => {
                r#"{
  "summary": string,
  "components": [{"name": string, "responsibility": string, "technology": string?, "kind": string?}],
  "relationships": [{"from": string, "to": string, "description": string?, "protocol": string?}],
  "technologies": [string],
  "pain_points": [string]
}"#
            }
            StageName::ParseRequirements => {
                r#"{
  "summary": string,
  "actors": [{"name": string, "description": string?, "external": bool?}],
  "functional": [{"id": string, "description": string, "priority": string?}],
  "non_functional": [{"category": string, "description": string, "target": string?}],
  "constraints": [string]
}"#
            }
            StageName::DesignArchitecture => {
                r#"{
  "style": string,
  "overview": string,
  "components": [{"name": string, "responsibility": string, "technology": string?, "kind": string?}],
  "relationships": [{"from": string, "to": string, "description": string?, "protocol": string?}],
  "nfr_mappings": [{"requirement": string, "tactic": string, "components": [string]}],
  "decisions": [{"title": string, "rationale": string}]
}"#
            }
            StageName::PlanIntegration => {
                r#"{
  "flows": [{"name": string, "description": string?, "steps": [{"from": string, "to": string, "message": string}]}],
  "migration_steps": [string],
  "risks": [string]
}"#
            }
        }
    }

    /// User prompt for a stage
    ///
    /// `upstream` holds the payloads of the stages this one depends on, in
    /// dependency order.
    pub fn user(
        stage: StageName,
        input: &str,
        amendments: &[String],
        upstream: &[(StageName, &StagePayload)],
    ) -> String {
        let mut prompt = format!("## Task: {}\n\n## Input\n\n{}\n", stage.display_name(), input.trim());

        if !amendments.is_empty() {
            prompt.push_str("\n## Reviewer feedback\n\nAddress every point below:\n");
            for (i, amendment) in amendments.iter().enumerate() {
                prompt.push_str(&format!("{}. {}\n", i + 1, amendment.trim()));
            }
        }

        for (upstream_stage, payload) in upstream {
            let json = serde_json::to_string_pretty(payload).unwrap_or_else(|_| "{}".to_string());
            prompt.push_str(&format!(
                "\n## Result of {}\n\n```json\n{}\n```\n",
                upstream_stage.display_name(),
                json
            ));
        }

        prompt
    }
}
