use thiserror::Error;

/// Failures raised by a report store backend.
#[derive(Debug, Error)]
pub enum StoreError {
    /// The backend could not serve the request (poisoned lock, lost
    /// connection, missing extension).
    #[error("store backend failure: {0}")]
    Backend(String),
    /// The query cannot be expressed against this backend.
    #[error("invalid store query: {0}")]
    InvalidQuery(String),
    #[cfg(feature = "postgres")]
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),
}

impl StoreError {
    pub fn backend(msg: impl Into<String>) -> Self {
        StoreError::Backend(msg.into())
    }
}
