use thiserror::Error;

/// Errors surfaced by embedding providers.
#[derive(Debug, Clone, Error, PartialEq)]
pub enum SemanticError {
    /// The provider is not configured (for example, no API key).
    #[error("embedding provider unavailable: {0}")]
    Unavailable(String),
    /// Configuration is inconsistent.
    #[error("invalid semantic config: {0}")]
    InvalidConfig(String),
    /// The circuit breaker is open and the call was not attempted.
    #[error("circuit breaker open for provider '{0}'")]
    CircuitOpen(String),
    /// Transport-level failure talking to the embedding API.
    #[error("request failed: {0}")]
    Request(String),
    /// The API answered with a non-success status.
    #[error("HTTP error {status}: {body}")]
    Status { status: u16, body: String },
    /// The response could not be turned into a vector.
    #[error("invalid embedding response: {0}")]
    InvalidResponse(String),
    /// The vector length does not match the configured dimensions.
    #[error("embedding has {actual} dimensions, expected {expected}")]
    DimensionMismatch { expected: usize, actual: usize },
}

impl SemanticError {
    /// Whether another attempt may succeed.
    ///
    /// Transport errors, 429 and 5xx are transient; other 4xx and anything
    /// produced locally are not.
    pub fn is_retryable(&self) -> bool {
        match self {
            SemanticError::Request(_) => true,
            SemanticError::Status { status, .. } => *status == 429 || *status >= 500,
            _ => false,
        }
    }
}
