//! In-process storage adapters for sessions and diagrams.

mod memory;

pub use memory::{InMemoryDiagramRepository, InMemorySessionStore};
