//! Error types for SMTP operations.

use std::io;
use std::time::Duration;

/// Result type alias for SMTP operations.
pub type Result<T> = std::result::Result<T, Error>;

/// SMTP error types.
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

    /// Server returned error response.
    #[error("SMTP error {code}: {message}")]
    SmtpError {
        /// Reply code (e.g., 550).
        code: u16,
        /// Error message from server.
        message: String,
    },

    /// Protocol error (unexpected response).
    #[error("Protocol error: {0}")]
    Protocol(String),

    /// Invalid email address.
    #[error("Invalid email address: {0}")]
    InvalidAddress(String),

    /// Message too large for the server's advertised SIZE.
    #[error("Message of {size} bytes exceeds server limit of {limit} bytes")]
    MessageTooLarge {
        /// Size of the rejected message.
        size: usize,
        /// Limit advertised in EHLO.
        limit: usize,
    },

    /// Feature not supported by server.
    #[error("Server does not support {0}")]
    NotSupported(String),

    /// Invalid state for operation.
    #[error("Invalid state for operation: {0}")]
    InvalidState(String),
}

impl Error {
    /// Creates an SMTP error from a reply code and message.
    #[must_use]
    pub fn smtp_error(code: u16, message: impl Into<String>) -> Self {
        Self::SmtpError {
            code,
            message: message.into(),
        }
    }

    /// Returns true if this is a permanent error (5xx).
    #[must_use]
    pub const fn is_permanent(&self) -> bool {
        matches!(self, Self::SmtpError { code, .. } if *code >= 500 && *code < 600)
    }

    /// Returns true if this is a transient error (4xx).
    #[must_use]
    pub const fn is_transient(&self) -> bool {
        matches!(self, Self::SmtpError { code, .. } if *code >= 400 && *code < 500)
    }

    /// Returns true if the session can still be used after this error.
    ///
    /// Server rejections leave the connection intact; transport failures do not.
    #[must_use]
    pub const fn is_recoverable(&self) -> bool {
        matches!(
            self,
            Self::SmtpError { .. } | Self::InvalidAddress(_) | Self::MessageTooLarge { .. }
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn classifies_reply_codes() {
        let permanent = Error::smtp_error(550, "No such user");
        assert!(permanent.is_permanent());
        assert!(!permanent.is_transient());

        let transient = Error::smtp_error(451, "Try later");
        assert!(transient.is_transient());
        assert!(!transient.is_permanent());
    }

    #[test]
    fn io_errors_are_not_recoverable() {
        let err = Error::from(io::Error::new(io::ErrorKind::BrokenPipe, "gone"));
        assert!(!err.is_recoverable());
        assert!(Error::smtp_error(554, "rejected").is_recoverable());
    }

    #[test]
    fn display_includes_code() {
        let err = Error::smtp_error(535, "Authentication failed");
        assert_eq!(err.to_string(), "SMTP error 535: Authentication failed");
    }
}
