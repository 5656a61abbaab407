//! API error types.

use thiserror::Error;

pub type ApiResult<T> = Result<T, ApiError>;

/// Server lifecycle errors. Per-frame failures never surface here; they are
/// reported to the client as error outcomes.
#[derive(Debug, Error)]
pub enum ApiError {
    #[error("Invalid bind address: {0}")]
    InvalidAddress(String),

    #[error("Failed to bind listener: {0}")]
    Bind(#[source] std::io::Error),

    #[error("Server error: {0}")]
    Serve(#[source] std::io::Error),

    #[error("Metrics error: {0}")]
    Metrics(String),
}
