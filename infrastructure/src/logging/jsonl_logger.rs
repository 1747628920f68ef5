//! JSONL file writer for workflow events.
//!
//! Each [`WorkflowEvent`] becomes one JSON line with a `type` field and a
//! `timestamp`, appended through a buffered writer.

use archmesh_application::ports::event_logger::{WorkflowEvent, WorkflowEventLogger};
use serde_json::Value;
use std::fs::{File, OpenOptions};
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use tracing::warn;

/// Workflow event logger that appends one JSON object per line.
///
/// Thread-safe via `Mutex<BufWriter<File>>`. Flushes on `Drop`.
pub struct JsonlWorkflowLogger {
    writer: Mutex<BufWriter<File>>,
    path: PathBuf,
}

impl JsonlWorkflowLogger {
    /// Open (or create) the log file in append mode.
    ///
    /// Parent directories are created as needed. Returns `None` if the
    /// file cannot be opened.
    pub fn new(path: impl AsRef<Path>) -> Option<Self> {
        let path = path.as_ref();

        if let Some(parent) = path.parent()
            && !parent.as_os_str().is_empty()
            && let Err(e) = std::fs::create_dir_all(parent)
        {
            warn!(
                "Could not create event log directory {}: {}",
                parent.display(),
                e
            );
            return None;
        }

        let file = match OpenOptions::new().create(true).append(true).open(path) {
            Ok(f) => f,
            Err(e) => {
                warn!("Could not open event log file {}: {}", path.display(), e);
                return None;
            }
        };

        Some(Self {
            writer: Mutex::new(BufWriter::new(file)),
            path: path.to_path_buf(),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

fn to_record(event: WorkflowEvent, timestamp: String) -> Value {
    match event.payload {
        Value::Object(mut map) => {
            map.insert("type".to_string(), Value::String(event.event_type.to_string()));
            map.insert("timestamp".to_string(), Value::String(timestamp));
            Value::Object(map)
        }
        other => serde_json::json!({
            "type": event.event_type,
            "timestamp": timestamp,
            "data": other,
        }),
    }
}

impl WorkflowEventLogger for JsonlWorkflowLogger {
    fn log(&self, event: WorkflowEvent) {
        let timestamp = chrono::Utc::now().to_rfc3339_opts(chrono::SecondsFormat::Millis, true);
        let record = to_record(event, timestamp);

        let Ok(line) = serde_json::to_string(&record) else {
            return;
        };

        let mut writer = self
            .writer
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner);
        if let Err(e) = writeln!(writer, "{}", line).and_then(|_| writer.flush()) {
            warn!("Dropping workflow event {}: {}", event_type_of(&record), e);
        }
    }
}

fn event_type_of(record: &Value) -> &str {
    record.get("type").and_then(Value::as_str).unwrap_or("unknown")
}

impl Drop for JsonlWorkflowLogger {
    fn drop(&mut self) {
        if let Ok(mut writer) = self.writer.lock() {
            let _ = writer.flush();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    fn read_lines(path: &Path) -> Vec<Value> {
        fs::read_to_string(path)
            .unwrap()
            .lines()
            .map(|line| serde_json::from_str(line).unwrap())
            .collect()
    }

    #[test]
    fn test_writes_one_record_per_event() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("logs").join("run.events.jsonl");
        let logger = JsonlWorkflowLogger::new(&path).unwrap();

        logger.log(WorkflowEvent::new(
            "stage_attempt",
            serde_json::json!({"stage": "parse_requirements", "attempt": 1}),
        ));
        logger.log(WorkflowEvent::new(
            "transition",
            serde_json::json!({"from": "parse_requirements", "to": "design_architecture"}),
        ));
        drop(logger);

        let records = read_lines(&path);
        assert_eq!(records.len(), 2);
        assert!(records.iter().all(|r| r.get("timestamp").is_some()));
        assert_eq!(records[0]["type"], "stage_attempt");
        assert_eq!(records[0]["attempt"], 1);
        assert_eq!(records[1]["type"], "transition");
        assert_eq!(records[1]["to"], "design_architecture");
    }

    #[test]
    fn test_non_object_payload_is_wrapped() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("wrapped.jsonl");
        let logger = JsonlWorkflowLogger::new(&path).unwrap();

        logger.log(WorkflowEvent::new("note", serde_json::json!("plain text")));
        drop(logger);

        let records = read_lines(&path);
        assert_eq!(records[0]["type"], "note");
        assert_eq!(records[0]["data"], "plain text");
    }

    #[test]
    fn test_reopening_appends() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("append.jsonl");

        for _ in 0..2 {
            let logger = JsonlWorkflowLogger::new(&path).unwrap();
            logger.log(WorkflowEvent::new("review_submitted", serde_json::json!({})));
        }

        assert_eq!(read_lines(&path).len(), 2);
    }
}
