//! # mailbridge-pop3
//!
//! Async POP3 client (RFC 1939) used by the MailBridge receiver.
//!
//! ## Features
//!
//! - **Two-state session**: [`Authorization`] until `USER`/`PASS` succeed,
//!   then [`Transaction`] where the maildrop can be read
//! - **TLS**: implicit TLS (port 995) and the STLS upgrade (RFC 2595)
//! - **Commands**: STAT, LIST, RETR, DELE, NOOP, RSET, QUIT, CAPA
//! - **Multi-line responses** with dot-unstuffing; message bodies are returned
//!   as raw bytes so non-UTF-8 mail survives intact
//!
//! ## Quick Start
//!
//! ```ignore
//! use mailbridge_pop3::Client;
//! use mailbridge_pop3::connection::connect_tls;
//!
//! let stream = connect_tls("pop.example.com", 995).await?;
//! let client = Client::from_stream(stream).await?;
//! let mut client = client.login("user@example.com", "secret").await?;
//!
//! let stat = client.stat().await?;
//! if stat.count > 0 {
//!     let raw = client.retr(stat.count).await?;
//!     println!("{}", String::from_utf8_lossy(&raw));
//! }
//! client.quit().await?;
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![forbid(unsafe_code)]

pub mod command;
pub mod connection;
mod error;
pub mod parser;
pub mod types;

pub use connection::{Authorization, CONNECT_TIMEOUT, Capabilities, Client, Pop3Stream, Transaction};
pub use error::{Error, Result};
pub use types::{ScanListing, Stat};
