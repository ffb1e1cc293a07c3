//! # mailbridge-smtp
//!
//! Async SMTP submission client (RFC 5321) used by the MailBridge sender.
//!
//! ## Features
//!
//! - **Two-state session**: a [`Client`] is either [`Connected`] (greeted,
//!   optionally upgraded) or [`Authenticated`]; mail can only be submitted from
//!   the authenticated state
//! - **TLS**: implicit TLS (port 465) and STARTTLS upgrade
//! - **Authentication**: AUTH PLAIN and AUTH LOGIN
//! - **Envelope submission**: `MAIL FROM` / `RCPT TO` / `DATA` with dot-stuffing
//!   and `RSET` recovery when the server rejects part of a transaction
//!
//! ## Quick Start
//!
//! ```ignore
//! use mailbridge_smtp::{Address, Client, Envelope};
//! use mailbridge_smtp::connection::connect_tls;
//!
//! let stream = connect_tls("smtp.example.com", 465).await?;
//! let client = Client::from_stream(stream).await?;
//! let client = client.ehlo("localhost").await?;
//! let mut client = client.authenticate("user@example.com", "secret").await?;
//!
//! let envelope = Envelope::new(
//!     Address::new("user@example.com")?,
//!     vec![Address::new("friend@example.com")?],
//! );
//! client.send_mail(&envelope, b"Subject: Hi\r\n\r\nHello\r\n").await?;
//! client.quit().await?;
//! ```
//!
//! ## Modules
//!
//! - [`command`]: SMTP command serialization
//! - [`connection`]: Streams, dialing and the session client
//! - [`parser`]: Reply parser
//! - [`types`]: Addresses, envelopes, extensions and replies

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![forbid(unsafe_code)]

pub mod command;
pub mod connection;
mod error;
pub mod parser;
pub mod types;

pub use connection::{
    Authenticated, Client, Connected, ServerInfo, SmtpStream, CONNECT_TIMEOUT,
};
pub use error::{Error, Result};
pub use types::{Address, AuthMechanism, Envelope, Extension, Reply, ReplyCode};
