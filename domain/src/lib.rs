//! Domain layer for archmesh
//!
//! This crate contains the core business logic, entities, and value objects.
//! It has no dependencies on infrastructure or presentation concerns.
//!
//! # Core Concepts
//!
//! ## Workflow
//!
//! A [`WorkflowSession`] runs an ordered list of stages chosen by its
//! [`WorkflowMode`]:
//!
//! - **Greenfield**: parse requirements, then design the architecture
//! - **Brownfield**: analyze the existing system first, and finish with an
//!   integration plan
//!
//! Each stage either auto-advances or pauses for human review, as decided by
//! the [`WorkflowPolicy`]. Sessions carry a version used for optimistic
//! concurrency by the session store.
//!
//! ## Stage payloads
//!
//! Model output is parsed into a closed [`StagePayload`] enum and validated
//! before it becomes a [`StageResult`].
//!
//! ## Diagrams
//!
//! The [`DiagramPlanner`] turns stage results into diagram requests; rendered
//! sources are checked with [`validate_source`].

pub mod core;
pub mod diagram;
pub mod payload;
pub mod progress;
pub mod prompt;
pub mod providers;
pub mod workflow;

// Re-export commonly used types
pub use core::{
    error::DomainError,
    ids::{DiagramId, ProjectId, SessionId, StageResultId},
};
pub use diagram::{
    DiagramArtifact, DiagramContext, DiagramFormat, DiagramPlanner, DiagramRequest, DiagramType,
    DiagramValidationError, validate_source,
};
pub use payload::{
    ParsedOutput, PayloadError, StagePayload, extract_json, parse_stage_output,
};
pub use progress::{ProgressEvent, ProgressStatus};
pub use prompt::StagePromptTemplate;
pub use providers::{Environment, ProviderKind, ProviderRoute, ProviderSelection, TaskType};
pub use workflow::{
    FailureKind, ReviewDecision, ReviewRecord, ReviewTask, SessionError, StageName, StagePolicy,
    StageProgress, StageResult, Transition, WorkflowInput, WorkflowMode, WorkflowPolicy,
    WorkflowSession, WorkflowState,
};
