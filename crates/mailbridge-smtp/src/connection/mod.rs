//! SMTP connection management.

mod client;
mod stream;

pub use client::{Authenticated, Client, Connected};
pub use stream::{AsyncIo, CONNECT_TIMEOUT, SmtpStream, connect, connect_tls};

use crate::types::{AuthMechanism, Extension};
use std::collections::HashSet;

/// Server capabilities from the greeting and EHLO response.
#[derive(Debug, Clone, Default)]
pub struct ServerInfo {
    /// Server hostname from greeting.
    pub hostname: String,
    /// Supported extensions.
    pub extensions: HashSet<Extension>,
}

impl ServerInfo {
    /// Checks if the server supports an extension.
    #[must_use]
    pub fn supports(&self, ext: &Extension) -> bool {
        self.extensions.contains(ext)
    }

    /// Checks if STARTTLS is supported.
    #[must_use]
    pub fn supports_starttls(&self) -> bool {
        self.supports(&Extension::StartTls)
    }

    /// Returns the maximum message size, if advertised.
    #[must_use]
    pub fn max_message_size(&self) -> Option<usize> {
        self.extensions.iter().find_map(|ext| match ext {
            Extension::Size(size) => *size,
            _ => None,
        })
    }

    /// Returns supported authentication mechanisms.
    #[must_use]
    pub fn auth_mechanisms(&self) -> Vec<AuthMechanism> {
        self.extensions
            .iter()
            .find_map(|ext| match ext {
                Extension::Auth(mechanisms) => Some(mechanisms.clone()),
                _ => None,
            })
            .unwrap_or_default()
    }

    /// Picks the mechanism used for password authentication.
    ///
    /// PLAIN is preferred; LOGIN is used when it is the only one offered.
    /// Servers that advertise nothing are tried with PLAIN.
    #[must_use]
    pub fn preferred_password_mechanism(&self) -> Option<AuthMechanism> {
        let offered = self.auth_mechanisms();
        if offered.is_empty() || offered.contains(&AuthMechanism::Plain) {
            Some(AuthMechanism::Plain)
        } else if offered.contains(&AuthMechanism::Login) {
            Some(AuthMechanism::Login)
        } else {
            None
        }
    }

    pub(crate) fn set_extensions<'a>(&mut self, lines: impl Iterator<Item = &'a String>) {
        self.extensions = lines.map(|line| Extension::parse(line)).collect();
    }
}
