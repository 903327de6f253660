//! Error types for jetcal

use thiserror::Error;

/// jetcal error type
#[derive(Error, Debug)]
pub enum Error {
    /// I/O error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON parsing error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Validation error (malformed payload, mask or config)
    #[error("Validation error: {0}")]
    Validation(String),

    /// A registry could not be built from the supplied payloads
    #[error("Initialization error: {0}")]
    Initialization(String),

    /// A query hit a registry that was never built
    #[error("Not initialized: {0}")]
    NotInitialized(String),

    /// Computation error
    #[error("Computation error: {0}")]
    Computation(String),
}

/// Result type alias
pub type Result<T> = std::result::Result<T, Error>;
