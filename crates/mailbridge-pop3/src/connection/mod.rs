//! POP3 connection management.

mod client;
mod stream;

pub use client::{Authorization, Client, Transaction};
pub use stream::{AsyncIo, CONNECT_TIMEOUT, Pop3Stream, connect, connect_tls};

/// Capabilities advertised in a `CAPA` response (RFC 2449).
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Capabilities {
    entries: Vec<String>,
}

impl Capabilities {
    /// Builds the capability set from the lines of a `CAPA` response.
    pub fn from_lines<I, S>(lines: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        Self {
            entries: lines
                .into_iter()
                .map(|line| line.as_ref().trim().to_ascii_uppercase())
                .filter(|line| !line.is_empty())
                .collect(),
        }
    }

    /// Checks if a capability keyword is present.
    #[must_use]
    pub fn supports(&self, keyword: &str) -> bool {
        self.entries.iter().any(|entry| {
            entry
                .split_whitespace()
                .next()
                .is_some_and(|name| name.eq_ignore_ascii_case(keyword))
        })
    }

    /// Checks if STLS is supported.
    #[must_use]
    pub fn supports_stls(&self) -> bool {
        self.supports("STLS")
    }
}
