//! Logging infrastructure: structured workflow event logging.
//!
//! Provides [`JsonlWorkflowLogger`], a JSONL file writer that implements
//! the [`WorkflowEventLogger`](archmesh_application::WorkflowEventLogger) port.

mod jsonl_logger;

pub use jsonl_logger::JsonlWorkflowLogger;
