//! Diagram configuration from TOML (`[diagrams]` section)

use super::ConfigValidationError;
use archmesh_domain::DiagramFormat;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FileDiagramsConfig {
    /// "plantuml" or "mermaid"
    pub format: String,
    /// Generate diagrams after each accepted stage
    pub enabled: bool,
}

impl Default for FileDiagramsConfig {
    fn default() -> Self {
        Self {
            format: DiagramFormat::default().as_str().to_string(),
            enabled: true,
        }
    }
}

impl FileDiagramsConfig {
    pub fn parse_format(&self) -> Result<DiagramFormat, ConfigValidationError> {
        self.format
            .parse()
            .map_err(|_| ConfigValidationError::UnknownDiagramFormat(self.format.clone()))
    }
}
