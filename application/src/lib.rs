//! Application layer for archmesh
//!
//! This crate contains use cases, port definitions, and application configuration.
//! It depends only on the domain layer.

pub mod config;
pub mod notification;
pub mod ports;
pub mod use_cases;

// Re-export commonly used types
pub use config::{ExecutionParams, WorkflowConfig};
pub use notification::{NotificationPublisher, Subscription, SubscriptionHandle};
pub use ports::{
    diagram_renderer::{DiagramRenderer, RendererError},
    diagram_repository::{DiagramRepository, RepositoryError},
    event_logger::{NoWorkflowLogger, WorkflowEvent, WorkflowEventLogger},
    llm_gateway::{GatewayError, GatewayRequest, GatewayResponse, LlmGateway},
    review_handler::{
        AutoApproveReview, AutoRejectReview, ReviewHandler, ReviewHandlerError, ReviewOutcome,
    },
    session_store::{SessionStore, StoreError},
};
pub use use_cases::diagrams::{DiagramError, DiagramService};
pub use use_cases::execute_stage::{ExecutionError, SessionContext, StageExecutor};
pub use use_cases::workflow::{ResultSummary, WorkflowError, WorkflowService, WorkflowStatus};
