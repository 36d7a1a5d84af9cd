//! Error types for the Overseerr client.

use reqwest::StatusCode;
use thiserror::Error;

/// Errors that can occur when talking to the Overseerr API
#[derive(Error, Debug)]
pub enum OverseerrError {
    /// The transport could not be built from the given settings
    #[error("Invalid client configuration: {0}")]
    InvalidConfig(String),

    /// Network failure, timeout, or a body that could not be read
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// The service answered with a non-2xx status
    #[error("Overseerr returned {status}: {body}")]
    Status { status: StatusCode, body: String },

    /// The body did not have the expected shape
    #[error("Invalid response from Overseerr: {0}")]
    InvalidResponse(String),
}

pub type Result<T> = std::result::Result<T, OverseerrError>;
