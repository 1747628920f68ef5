//! Maps stage results to diagram requests.

use super::entities::{DiagramContext, DiagramFormat, DiagramRequest, DiagramType};
use crate::payload::StagePayload;
use crate::workflow::{StageName, StageResult};

/// Decides which diagrams a stage result yields.
///
/// Planning is a pure function of the stage, the result payload and the
/// configured format: the same inputs always produce the same requests in
/// the same order.
#[derive(Debug, Clone, Copy, Default)]
pub struct DiagramPlanner {
    format: DiagramFormat,
}

impl DiagramPlanner {
    pub fn new(format: DiagramFormat) -> Self {
        Self { format }
    }

    pub fn format(&self) -> DiagramFormat {
        self.format
    }

    /// Returns the diagram requests for `result`.
    ///
    /// A result whose payload belongs to another stage yields nothing.
    pub fn plan(&self, stage: StageName, result: &StageResult) -> Vec<DiagramRequest> {
        if result.payload.stage() != stage {
            return Vec::new();
        }

        match &result.payload {
            StagePayload::Requirements(p) => vec![self.request(
                stage,
                DiagramType::Context,
                "System Context",
                DiagramContext {
                    system_name: Some(system_name(&p.summary)),
                    actors: p.actors.clone(),
                    ..Default::default()
                },
            )],
            StagePayload::ExistingSystem(p) => vec![self.request(
                stage,
                DiagramType::Container,
                "Existing System Containers",
                DiagramContext {
                    system_name: Some(system_name(&p.summary)),
                    components: p.components.clone(),
                    relationships: p.relationships.clone(),
                    ..Default::default()
                },
            )],
            StagePayload::Architecture(p) => {
                let structural = DiagramContext {
                    system_name: Some(p.style.clone()),
                    components: p.components.clone(),
                    relationships: p.relationships.clone(),
                    ..Default::default()
                };
                let mut requests = vec![
                    self.request(
                        stage,
                        DiagramType::Container,
                        "Target Architecture Containers",
                        structural.clone(),
                    ),
                    self.request(
                        stage,
                        DiagramType::Component,
                        "Target Architecture Components",
                        structural,
                    ),
                ];
                if !p.nfr_mappings.is_empty() {
                    requests.push(self.request(
                        stage,
                        DiagramType::NfrMapping,
                        "Quality Attribute Mapping",
                        DiagramContext {
                            components: p.components.clone(),
                            nfr_mappings: p.nfr_mappings.clone(),
                            ..Default::default()
                        },
                    ));
                }
                requests
            }
            StagePayload::Integration(p) => p
                .flows
                .iter()
                .map(|flow| {
                    self.request(
                        stage,
                        DiagramType::Sequence,
                        &format!("Integration Flow: {}", flow.name),
                        DiagramContext {
                            flow: Some(flow.clone()),
                            ..Default::default()
                        },
                    )
                })
                .collect(),
        }
    }

    fn request(
        &self,
        stage: StageName,
        diagram_type: DiagramType,
        title: &str,
        context: DiagramContext,
    ) -> DiagramRequest {
        DiagramRequest {
            stage,
            diagram_type,
            format: self.format,
            title: title.to_string(),
            context,
        }
    }
}

/// First line of a summary, used as the system's label.
fn system_name(summary: &str) -> String {
    let name = crate::core::string::preview(summary, 60);
    if name.is_empty() {
        "System".to_string()
    } else {
        name
    }
}
