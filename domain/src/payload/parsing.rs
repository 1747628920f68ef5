//! Parsing stage payloads from model responses.
//!
//! Supports three shapes of response, tried in order:
//! 1. a fenced ` ```json ` (or bare ` ``` `) block containing a JSON object
//! 2. the whole response as a JSON object
//! 3. the outermost `{ ... }` span inside surrounding prose

use super::{
    ArchitecturePayload, ExistingSystemPayload, IntegrationPayload, PayloadError,
    RequirementsPayload, StagePayload,
};
use crate::workflow::stage::StageName;
use serde::de::DeserializeOwned;
use serde_json::Value;

/// A validated payload plus the model's self-reported confidence, if any.
#[derive(Debug, Clone, PartialEq)]
pub struct ParsedOutput {
    pub payload: StagePayload,
    pub confidence: Option<f64>,
}

/// Find the first JSON object in a model response.
pub fn extract_json(response: &str) -> Option<Value> {
    let mut in_block = false;
    let mut current_block = String::new();

    for line in response.lines() {
        let trimmed = line.trim();
        if !in_block && trimmed.starts_with("```") {
            in_block = true;
            current_block.clear();
        } else if in_block && trimmed == "```" {
            in_block = false;
            if let Ok(value @ Value::Object(_)) = serde_json::from_str::<Value>(&current_block) {
                return Some(value);
            }
        } else if in_block {
            current_block.push_str(line);
            current_block.push('\n');
        }
    }

    if let Ok(value @ Value::Object(_)) = serde_json::from_str::<Value>(response.trim()) {
        return Some(value);
    }

    let start = response.find('{')?;
    let end = response.rfind('}')?;
    if end <= start {
        return None;
    }
    match serde_json::from_str::<Value>(&response[start..=end]) {
        Ok(value @ Value::Object(_)) => Some(value),
        _ => None,
    }
}

fn decode<T: DeserializeOwned>(stage: StageName, value: Value) -> Result<T, PayloadError> {
    serde_json::from_value(value).map_err(|e| PayloadError::Schema {
        stage,
        message: e.to_string(),
    })
}

/// Parse and validate the output of `stage`.
pub fn parse_stage_output(stage: StageName, response: &str) -> Result<ParsedOutput, PayloadError> {
    let value = extract_json(response).ok_or(PayloadError::NoJson)?;

    let confidence = value
        .get("confidence")
        .and_then(Value::as_f64)
        .filter(|c| c.is_finite())
        .map(|c| c.clamp(0.0, 1.0));

    let payload = match stage {
        StageName::AnalyzeExistingSystem => {
            StagePayload::ExistingSystem(decode::<ExistingSystemPayload>(stage, value)?)
        }
        StageName::ParseRequirements => {
            StagePayload::Requirements(decode::<RequirementsPayload>(stage, value)?)
        }
        StageName::DesignArchitecture => {
            StagePayload::Architecture(decode::<ArchitecturePayload>(stage, value)?)
        }
        StageName::PlanIntegration => {
            StagePayload::Integration(decode::<IntegrationPayload>(stage, value)?)
        }
    };
    payload.validate()?;

    Ok(ParsedOutput {
        payload,
        confidence,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    const REQUIREMENTS: &str = r#"{
        "summary": "A blog platform",
        "actors": [{"name": "Author"}, {"name": "Reader"}],
        "functional": [{"id": "FR-1", "description": "Publish posts"}],
        "confidence": 0.8
    }"#;

    #[test]
    fn test_parse_fenced_block() {
        let response = format!("Here is the analysis:\n\n```json\n{}\n```\nDone.", REQUIREMENTS);
        let parsed = parse_stage_output(StageName::ParseRequirements, &response).unwrap();
        assert_eq!(parsed.payload.stage(), StageName::ParseRequirements);
        assert_eq!(parsed.confidence, Some(0.8));
    }

    #[test]
    fn test_parse_raw_json() {
        let parsed = parse_stage_output(StageName::ParseRequirements, REQUIREMENTS).unwrap();
        match parsed.payload {
            StagePayload::Requirements(p) => assert_eq!(p.actors.len(), 2),
            other => panic!("unexpected payload {:?}", other),
        }
    }

    #[test]
    fn test_parse_json_embedded_in_prose() {
        let response = format!("Sure! {} Hope this helps.", REQUIREMENTS.replace('\n', " "));
        assert!(parse_stage_output(StageName::ParseRequirements, &response).is_ok());
    }

    #[test]
    fn test_no_json_is_an_error() {
        let err = parse_stage_output(StageName::ParseRequirements, "I cannot help with that.")
            .unwrap_err();
        assert_eq!(err, PayloadError::NoJson);
    }

    #[test]
    fn test_schema_mismatch_is_reported_with_stage() {
        let err = parse_stage_output(StageName::DesignArchitecture, REQUIREMENTS).unwrap_err();
        assert!(matches!(
            err,
            PayloadError::Schema {
                stage: StageName::DesignArchitecture,
                ..
            }
        ));
    }

    #[test]
    fn test_validation_runs_after_decoding() {
        let response = r#"{"summary": "x", "functional": []}"#;
        let err = parse_stage_output(StageName::ParseRequirements, response).unwrap_err();
        assert!(matches!(err, PayloadError::Invalid(_)));
    }

    #[test]
    fn test_confidence_is_clamped() {
        let response = REQUIREMENTS.replace("0.8", "7");
        let parsed = parse_stage_output(StageName::ParseRequirements, &response).unwrap();
        assert_eq!(parsed.confidence, Some(1.0));
    }
}
