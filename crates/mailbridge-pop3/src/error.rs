//! Error types for POP3 operations.

use std::io;
use std::time::Duration;

/// Result type alias for POP3 operations.
pub type Result<T> = std::result::Result<T, Error>;

/// POP3 error types.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    /// Dialing or the TLS handshake did not finish in time.
    #[error("Timed out after {0:?}")]
    Timeout(Duration),

    /// The server closed the connection.
    #[error("Connection closed by server")]
    ConnectionClosed,

    /// Hostname is not usable as a TLS server name.
    #[error("Invalid hostname: {0}")]
    InvalidHostname(String),

    /// Server answered `-ERR`.
    #[error("POP3 error: {0}")]
    Negative(String),

    /// Response did not follow the protocol.
    #[error("Protocol error: {0}")]
    Protocol(String),

    /// The server does not offer a required capability.
    #[error("Not supported by server: {0}")]
    NotSupported(String),

    /// Invalid state for operation.
    #[error("Invalid state for operation: {0}")]
    InvalidState(String),
}

impl Error {
    /// Returns true if the server refused the command but the session is intact.
    #[must_use]
    pub const fn is_negative(&self) -> bool {
        matches!(self, Self::Negative(_))
    }

    /// Returns true if the connection can no longer carry commands.
    #[must_use]
    pub const fn is_connection_lost(&self) -> bool {
        matches!(self, Self::Io(_) | Self::ConnectionClosed | Self::Timeout(_))
    }
}
