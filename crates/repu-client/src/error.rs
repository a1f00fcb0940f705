//! Error types for the reputation client.

use thiserror::Error;

/// Errors that can occur when querying the reputation service.
#[derive(Debug, Error)]
pub enum ClientError {
    /// HTTP transport error.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// The service answered with a non-success status.
    #[error("unexpected status {status} for {url}")]
    Status { status: u16, url: String },

    /// Response body could not be decoded.
    #[error("serialization error: {0}")]
    Serialization(String),
}
