//! Core domain concepts shared across all subdomains.
//!
//! - [`ids`]: typed identifiers for sessions, projects, results and diagrams
//! - [`error::DomainError`]: domain-level errors raised by transition rules
//! - [`string`]: small text helpers used for previews

pub mod error;
pub mod ids;
pub mod string;
