//! # mailbridge-mime
//!
//! MIME message parsing and composition for email.
//!
//! ## Features
//!
//! - **Message parsing**: headers with folding, nested multipart bodies,
//!   Base64 and Quoted-Printable transfer encodings
//! - **Header decoding**: RFC 2047 encoded-words and mailbox parsing
//! - **Message composition**: `multipart/mixed` with a UTF-8 text part and
//!   base64 attachments
//!
//! ## Quick Start
//!
//! ### Parsing
//!
//! ```
//! use mailbridge_mime::Message;
//!
//! let raw = b"From: Alice <alice@example.com>\r\n\
//!             Subject: =?utf-8?B?5L2g5aW9?=\r\n\
//!             \r\n\
//!             Hello, World!";
//!
//! let message = Message::parse(raw);
//! assert_eq!(message.from().name, "Alice");
//! assert_eq!(message.subject(), "你好");
//! assert_eq!(message.text_body(), "Hello, World!");
//! ```
//!
//! ### Composing
//!
//! ```ignore
//! use mailbridge_mime::{Attachment, MessageBuilder};
//!
//! let raw = MessageBuilder::new()
//!     .from("sender@example.com")
//!     .to(["recipient@example.com"])
//!     .subject("Document")
//!     .text_body("Please find the attached document.")
//!     .attach(Attachment::from_file("document.pdf")?)
//!     .build();
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![forbid(unsafe_code)]

mod address;
mod builder;
mod content_type;
mod error;
mod header;
mod message;

pub mod encoding;

pub use address::Mailbox;
pub use builder::{Attachment, MessageBuilder};
pub use content_type::ContentType;
pub use error::{Error, Result};
pub use header::Headers;
pub use message::{MAX_NESTING, Message, Part, TransferEncoding};
