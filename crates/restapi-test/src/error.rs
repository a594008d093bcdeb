//! Test error types.

use thiserror::Error;

/// Errors that can occur while building or sending test requests.
#[derive(Debug, Error)]
pub enum TestError {
    /// Request building failed
    #[error("Request build error: {0}")]
    RequestBuild(String),

    /// Header name or value is invalid
    #[error("Invalid header: {0}")]
    InvalidHeader(String),

    /// Response body reading failed
    #[error("Body read error: {0}")]
    BodyRead(String),

    /// JSON serialization/deserialization failed
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Form encoding failed
    #[error("Form error: {0}")]
    Form(#[from] serde_urlencoded::ser::Error),
}
