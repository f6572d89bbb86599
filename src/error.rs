//! Errors from the two remote service contracts.

use reqwest::StatusCode;

/// Failure talking to the answer or transcription service.
#[derive(Debug, thiserror::Error)]
pub enum ServiceError {
    #[error("transport error: {0}")]
    Transport(#[from] reqwest::Error),
    #[error("service returned {0}")]
    Status(StatusCode),
    #[error("response body is not JSON: {0}")]
    Decode(#[from] serde_json::Error),
}
