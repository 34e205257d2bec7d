//! Error types for skylift.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
    #[error("no applications matching '{0}'")]
    NotFound(String),

    #[error("'{search}' matches {} applications: {}", candidates.len(), candidates.join(", "))]
    Ambiguous {
        search: String,
        candidates: Vec<String>,
    },

    #[error("configuration error: {0}")]
    Configuration(String),

    #[error("invalid input: {0}")]
    Validation(String),

    #[error("cancelled")]
    Cancelled,

    /// The message doubles as the reason on synthetic results, so it carries no cluster name.
    #[error("Cluster is not reachable")]
    Unreachable { cluster: String },

    #[error("request failed: {0}")]
    Transport(String),

    #[error("internal error: {0}")]
    Internal(String),
}

impl Error {
    /// Whether the error stops a run before anything is dispatched.
    pub fn is_pre_dispatch(&self) -> bool {
        matches!(
            self,
            Error::NotFound(_)
                | Error::Ambiguous { .. }
                | Error::Configuration(_)
                | Error::Validation(_)
                | Error::Cancelled
        )
    }
}

pub type Result<T> = std::result::Result<T, Error>;
