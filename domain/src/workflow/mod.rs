//! Workflow subdomain: stages, modes, sessions and their transition rules.

pub mod mode;
pub mod policy;
pub mod result;
pub mod review;
pub mod session;
pub mod stage;

pub use mode::WorkflowMode;
pub use policy::WorkflowPolicy;
pub use result::StageResult;
pub use review::{ReviewDecision, ReviewRecord, ReviewTask};
pub use session::{
    FailureKind, SessionError, StageProgress, Transition, WorkflowInput, WorkflowSession,
    WorkflowState,
};
pub use stage::{StageName, StagePolicy};
