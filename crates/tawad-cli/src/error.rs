use std::io;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum CliError {
    #[error(transparent)]
    Core(#[from] tawad_core::Error),
    #[error(transparent)]
    Io(#[from] io::Error),
    #[error(transparent)]
    Serialization(#[from] serde_json::Error),
    #[error("Configuration error: {0}")]
    Config(String),
    #[error("Secure storage error: {0}")]
    SecureStorage(String),
    #[error("Invalid conversation ID: {0}")]
    InvalidConversationId(String),
    #[error("Invalid date/time (expected RFC 3339, e.g. 2025-06-01T10:00:00Z): {0}")]
    InvalidDateTime(String),
    #[error("This conversation has no offer")]
    NoOffer,
    #[error("This conversation has no active transaction")]
    NoTransaction,
    #[error("Not signed in. Run `tawad auth login` first.")]
    NotSignedIn,
    #[error(
        "No API endpoint configured. Run `tawad config init --api-base-url <URL>` or set TAWAD_API_BASE_URL."
    )]
    NotConfigured,
}
