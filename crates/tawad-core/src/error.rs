//! Error types for tawad-core

use thiserror::Error;

/// Result type alias using tawad-core's Error
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur in tawad-core operations
#[derive(Error, Debug)]
pub enum Error {
    /// HTTP transport failure
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    /// Serialization error
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Error message returned by the marketplace API
    #[error("{0}")]
    Api(String),

    /// Input rejected client-side, before any request is made
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// A mutation of the same kind is already in flight for this target
    #[error("Action already pending: {0}")]
    ActionPending(String),

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),
}
