//! Header checks for rendered diagram source.

use super::entities::{DiagramFormat, DiagramType};
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum DiagramValidationError {
    #[error("Diagram source is empty")]
    Empty,

    #[error("Expected {format} source to start with {expected}")]
    MissingHeader {
        format: DiagramFormat,
        expected: &'static str,
    },

    #[error("PlantUML source is missing @enduml")]
    MissingFooter,
}

/// Check that `source` looks like a diagram of the given format and type.
pub fn validate_source(
    format: DiagramFormat,
    diagram_type: DiagramType,
    source: &str,
) -> Result<(), DiagramValidationError> {
    let trimmed = source.trim();
    if trimmed.is_empty() {
        return Err(DiagramValidationError::Empty);
    }
    let first_line = trimmed.lines().next().unwrap_or_default().trim();

    match format {
        DiagramFormat::Plantuml => {
            if !first_line.starts_with("@startuml") {
                return Err(DiagramValidationError::MissingHeader {
                    format,
                    expected: "@startuml",
                });
            }
            let last_line = trimmed.lines().last().unwrap_or_default().trim();
            if !last_line.starts_with("@enduml") {
                return Err(DiagramValidationError::MissingFooter);
            }
        }
        DiagramFormat::Mermaid => {
            let ok = match diagram_type {
                DiagramType::Sequence => first_line.starts_with("sequenceDiagram"),
                _ => first_line.starts_with("flowchart") || first_line.starts_with("graph"),
            };
            if !ok {
                let expected = match diagram_type {
                    DiagramType::Sequence => "sequenceDiagram",
                    _ => "flowchart or graph",
                };
                return Err(DiagramValidationError::MissingHeader { format, expected });
            }
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_plantuml_requires_start_and_end() {
        let ok = "@startuml\nA -> B\n@enduml\n";
        assert!(validate_source(DiagramFormat::Plantuml, DiagramType::Context, ok).is_ok());

        assert_eq!(
            validate_source(DiagramFormat::Plantuml, DiagramType::Context, "A -> B\n@enduml"),
            Err(DiagramValidationError::MissingHeader {
                format: DiagramFormat::Plantuml,
                expected: "@startuml"
            })
        );
        assert_eq!(
            validate_source(DiagramFormat::Plantuml, DiagramType::Context, "@startuml\nA -> B"),
            Err(DiagramValidationError::MissingFooter)
        );
    }

    #[test]
    fn test_mermaid_header_depends_on_type() {
        assert!(
            validate_source(DiagramFormat::Mermaid, DiagramType::Container, "flowchart LR\n a-->b")
                .is_ok()
        );
        assert!(
            validate_source(DiagramFormat::Mermaid, DiagramType::Component, "graph TD\n a-->b")
                .is_ok()
        );
        assert!(
            validate_source(DiagramFormat::Mermaid, DiagramType::Sequence, "sequenceDiagram\n A->>B: hi")
                .is_ok()
        );
        assert!(
            validate_source(DiagramFormat::Mermaid, DiagramType::Sequence, "flowchart LR\n a-->b")
                .is_err()
        );
    }

    #[test]
    fn test_empty_source_is_rejected() {
        assert_eq!(
            validate_source(DiagramFormat::Mermaid, DiagramType::Context, "  \n "),
            Err(DiagramValidationError::Empty)
        );
    }
}
