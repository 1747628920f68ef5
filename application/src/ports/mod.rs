//! Port definitions (interfaces for external adapters)
//!
//! Ports define the contracts that infrastructure adapters must implement.

pub mod diagram_renderer;
pub mod diagram_repository;
pub mod event_logger;
pub mod llm_gateway;
pub mod review_handler;
pub mod session_store;
