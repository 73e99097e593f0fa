use thiserror::Error;

/// Failures surfaced by a [`crate::gateway::CustomerGateway`].
///
/// Errors carry rendered messages rather than source handles so a single
/// population outcome can be cloned out to every caller waiting on it.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum GatewayError {
    #[error("Transport error: {0}")]
    Transport(String),

    #[error("Schema error: {0}")]
    Schema(String),

    #[error("Customer '{id}' not found")]
    NotFound { id: String },

    #[error("Request timed out after {ms}ms")]
    Timeout { ms: u64 },

    #[error("Request cancelled")]
    Cancelled,
}

pub type GatewayResult<T> = Result<T, GatewayError>;

#[derive(Error, Debug)]
pub enum DashError {
    #[error(transparent)]
    Gateway(#[from] GatewayError),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Cannot read {path}: {source}")]
    ConfigRead {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),
}

pub type DashResult<T> = Result<T, DashError>;
