//! Error types for the core library.

use crate::codec::CodecError;
use crate::service::{ReceiveError, SendError};
use crate::settings::SettingsError;
use thiserror::Error;

/// Errors that can occur in core operations.
#[derive(Debug, Error)]
pub enum Error {
    /// Codec configuration or decoding failed.
    #[error("Codec error: {0}")]
    Codec(#[from] CodecError),

    /// Sending failed.
    #[error(transparent)]
    Send(#[from] SendError),

    /// Retrieval failed.
    #[error(transparent)]
    Receive(#[from] ReceiveError),

    /// Invalid settings.
    #[error("Settings error: {0}")]
    Settings(#[from] SettingsError),

    /// Serialization/deserialization error.
    #[error("Serialization error: {0}")]
    Serde(#[from] serde_json::Error),

    /// I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Account not found.
    #[error("Account not found: {0}")]
    AccountNotFound(String),

    /// Configuration error.
    #[error("Configuration error: {0}")]
    Config(String),
}

/// Result type alias using our Error type.
pub type Result<T> = std::result::Result<T, Error>;
