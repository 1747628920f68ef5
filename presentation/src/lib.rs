//! Presentation layer for archmesh
//!
//! This crate contains the CLI definition, output formatters,
//! progress reporters, and the interactive review prompt.

pub mod cli;
pub mod output;
pub mod progress;
pub mod review;

// Re-export commonly used types
pub use cli::commands::{Cli, OutputFormat, ReviewMode};
pub use output::console::ConsoleFormatter;
pub use progress::reporter::{ProgressReporter, ProgressView, SimpleProgress, follow};
pub use review::interactive::{InteractiveReviewHandler, review_until_interrupted};
