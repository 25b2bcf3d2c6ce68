// crates/core/src/result.rs
use thiserror::Error;

#[derive(Error, Debug)]
pub enum RetortError {
    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    #[error("Service misconfigured: {0}")]
    ServiceMisconfigured(String),

    #[error("Upstream failure: {0}")]
    Upstream(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Network error: {0}")]
    Network(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl RetortError {
    /// Whether the error was caused by the caller rather than by the service.
    pub fn is_client_error(&self) -> bool {
        matches!(self, RetortError::InvalidRequest(_))
    }
}

pub type RetortResult<T> = Result<T, RetortError>;
