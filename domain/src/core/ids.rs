//! Typed identifiers.
//!
//! Every identifier is a thin wrapper around a string so that ids coming from
//! external callers (HTTP layers, CLIs) can be used verbatim, while freshly
//! created entities get a random v4 UUID.

use serde::{Deserialize, Serialize};

macro_rules! string_id {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(String);

        impl $name {
            pub fn new(id: impl Into<String>) -> Self {
                Self(id.into())
            }

            /// Generates a new random identifier.
            pub fn generate() -> Self {
                Self(uuid::Uuid::new_v4().to_string())
            }

            pub fn as_str(&self) -> &str {
                &self.0
            }
        }

        impl From<&str> for $name {
            fn from(s: &str) -> Self {
                Self::new(s)
            }
        }

        impl From<String> for $name {
            fn from(s: String) -> Self {
                Self(s)
            }
        }

        impl std::fmt::Display for $name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                write!(f, "{}", self.0)
            }
        }
    };
}

string_id!(
    /// Identifies one workflow run.
    SessionId
);
string_id!(
    /// Identifies the project a workflow belongs to.
    ProjectId
);
string_id!(
    /// Identifies a single stage execution attempt's output.
    StageResultId
);
string_id!(
    /// Identifies a generated diagram.
    DiagramId
);
