//! Prompt domain
//!
//! Templates for the system and user prompts sent at each workflow stage.

mod template;

pub use template::StagePromptTemplate;
