//! # mailbridge-core
//!
//! Core logic for the `MailBridge` email agent.
//!
//! This crate provides:
//! - A body codec: Base64, optionally remapped through a substitution table
//! - Table agreement from a shared secret, plus table rotation
//! - `MailSender`, an SMTP sender with attachments and a body encode hook
//! - `MailReceiver`, a POP3 receiver listing newest-first with a body decode hook
//! - Account, provider, and settings models
//!
//! ```no_run
//! use mailbridge_core::{Account, MailReceiver, ReceiveError};
//!
//! # async fn run() -> Result<(), ReceiveError> {
//! let account = Account::with_email("user@qq.com").with_password("auth-code");
//! let mut receiver = MailReceiver::new(account.pop3);
//! let listing = receiver
//!     .session(async |r| r.list_messages(Some(10), None).await)
//!     .await?;
//! for message in &listing.messages {
//!     println!("{} {}", message.index, message.subject);
//! }
//! # Ok(())
//! # }
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![forbid(unsafe_code)]

pub mod account;
pub mod codec;
mod error;
pub mod negotiator;
pub mod service;
pub mod settings;

pub use account::{
    Account, Provider, Security, ServerConfig, ValidationError, ValidationResult, validate_account,
};
pub use codec::{Codec, CodecConfig, CodecError, SubstitutionTable, TextTransform};
pub use error::{Error, Result};
pub use negotiator::{NegotiationRequest, Negotiator};
pub use service::{
    Listing, MailReceiver, MailSender, OutgoingMessage, ReceiveError, RetrievedMessage, SendError,
};
pub use settings::{Settings, SettingsError};
