//! Mail services.
//!
//! Each client owns one server session at a time. Body transforms are passed
//! into each call rather than stored on the client.

mod receiver;
mod sender;

pub use receiver::{Listing, MailReceiver, ReceiveError, RetrievedMessage};
pub use sender::{MailSender, OutgoingMessage, SendError};
