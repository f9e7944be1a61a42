//! Error types for the external service clients.

use thiserror::Error;

pub type Result<T> = std::result::Result<T, ClientError>;

/// Errors raised while talking to the LLM, search, or page-fetch services
#[derive(Debug, Error)]
pub enum ClientError {
    /// Transport-level failure, including timeouts
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    /// The service answered with a non-success status
    #[error("API error {status}: {body}")]
    Api { status: u16, body: String },

    /// The response body did not have the expected shape
    #[error("Invalid response: {0}")]
    InvalidResponse(String),

    #[error("API key not configured: {0}")]
    MissingApiKey(&'static str),
}
