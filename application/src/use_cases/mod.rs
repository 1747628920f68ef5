//! Use cases (application services)

pub mod diagrams;
pub mod execute_stage;
pub mod workflow;

#[cfg(test)]
pub(crate) mod test_support;
