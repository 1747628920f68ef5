//! Logging configuration from TOML (`[logging]` section)

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FileLoggingConfig {
    /// JSONL workflow event log; disabled when unset
    pub event_log: Option<PathBuf>,
    /// Diagnostic log file written alongside stderr output
    pub file: Option<PathBuf>,
}
