//! Outgoing message composition.

use crate::content_type::ContentType;
use crate::encoding::{encode_base64_wrapped, encode_rfc2047};
use crate::error::{Error, Result};
use crate::header::Headers;
use chrono::{DateTime, FixedOffset, Local};
use std::path::Path;

/// File content attached to an outgoing message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Attachment {
    /// File name announced in `Content-Disposition`.
    pub filename: String,
    /// Raw content.
    pub data: Vec<u8>,
}

impl Attachment {
    /// Creates an attachment from in-memory data.
    #[must_use]
    pub fn from_bytes(filename: impl Into<String>, data: Vec<u8>) -> Self {
        Self {
            filename: filename.into(),
            data,
        }
    }

    /// Reads an attachment from disk, naming it after the file's base name.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Attachment`] if the file cannot be read.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let data = std::fs::read(path).map_err(|source| Error::Attachment {
            path: path.to_path_buf(),
            source,
        })?;
        let filename = path
            .file_name()
            .map_or_else(|| path.display().to_string(), |n| n.to_string_lossy().into_owned());

        Ok(Self::from_bytes(filename, data))
    }
}

/// Builds a `multipart/mixed` message: one UTF-8 text part followed by
/// base64 attachments.
///
/// ```
/// use mailbridge_mime::MessageBuilder;
///
/// let raw = MessageBuilder::new()
///     .from("sender@example.com")
///     .to(["recipient@example.com"])
///     .subject("Hello")
///     .text_body("Hi there")
///     .build();
/// assert!(raw.contains("MIME-Version: 1.0"));
/// ```
#[derive(Debug, Clone, Default)]
pub struct MessageBuilder {
    from: String,
    to: Vec<String>,
    cc: Vec<String>,
    subject: String,
    body: String,
    attachments: Vec<Attachment>,
    date: Option<DateTime<FixedOffset>>,
    boundary: Option<String>,
}

impl MessageBuilder {
    /// Creates an empty builder.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the `From` address.
    #[must_use]
    pub fn from(mut self, from: impl Into<String>) -> Self {
        self.from = from.into();
        self
    }

    /// Adds `To` recipients.
    #[must_use]
    pub fn to<I, S>(mut self, to: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.to.extend(to.into_iter().map(Into::into));
        self
    }

    /// Adds `Cc` recipients; the header is omitted while this stays empty.
    #[must_use]
    pub fn cc<I, S>(mut self, cc: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.cc.extend(cc.into_iter().map(Into::into));
        self
    }

    /// Sets the subject.
    #[must_use]
    pub fn subject(mut self, subject: impl Into<String>) -> Self {
        self.subject = subject.into();
        self
    }

    /// Sets the plain-text body.
    #[must_use]
    pub fn text_body(mut self, body: impl Into<String>) -> Self {
        self.body = body.into();
        self
    }

    /// Appends an attachment.
    #[must_use]
    pub fn attach(mut self, attachment: Attachment) -> Self {
        self.attachments.push(attachment);
        self
    }

    /// Fixes the `Date` header instead of using the local clock.
    #[must_use]
    pub const fn date(mut self, date: DateTime<FixedOffset>) -> Self {
        self.date = Some(date);
        self
    }

    /// Fixes the multipart boundary instead of generating a random one.
    #[must_use]
    pub fn boundary(mut self, boundary: impl Into<String>) -> Self {
        self.boundary = Some(boundary.into());
        self
    }

    /// Renders the message with CRLF line endings.
    #[must_use]
    pub fn build(self) -> String {
        let boundary = self.boundary.unwrap_or_else(random_boundary);
        let date = self.date.unwrap_or_else(|| Local::now().fixed_offset());

        let mut headers = Headers::new();
        headers.add("From", self.from);
        headers.add("To", self.to.join(", "));
        if !self.cc.is_empty() {
            headers.add("Cc", self.cc.join(", "));
        }
        headers.add("Subject", encode_rfc2047(&self.subject));
        headers.add("Date", date.to_rfc2822());
        headers.add("MIME-Version", "1.0");
        headers.add(
            "Content-Type",
            ContentType::multipart_mixed(boundary.as_str()).to_string(),
        );

        let mut out = headers.to_string();
        out.push_str("\r\n");

        let mut text = Headers::new();
        text.add("Content-Type", ContentType::text_plain().to_string());
        text.add("MIME-Version", "1.0");
        text.add("Content-Transfer-Encoding", "base64");
        push_part(&mut out, &boundary, &text, self.body.as_bytes());

        for attachment in &self.attachments {
            let mut part = Headers::new();
            part.add(
                "Content-Type",
                ContentType::application_octet_stream().to_string(),
            );
            part.add("MIME-Version", "1.0");
            part.add("Content-Transfer-Encoding", "base64");
            part.add(
                "Content-Disposition",
                format!(
                    "attachment; filename=\"{}\"",
                    encode_rfc2047(&attachment.filename).replace('"', "\\\"")
                ),
            );
            push_part(&mut out, &boundary, &part, &attachment.data);
        }

        out.push_str(&format!("--{boundary}--\r\n"));
        out
    }
}

fn push_part(out: &mut String, boundary: &str, headers: &Headers, data: &[u8]) {
    out.push_str(&format!("--{boundary}\r\n"));
    out.push_str(&headers.to_string());
    out.push_str("\r\n");
    out.push_str(&encode_base64_wrapped(data));
    out.push_str("\r\n");
}

fn random_boundary() -> String {
    format!("==============={:019}==", rand::random::<u64>() % 10_000_000_000_000_000_000)
}
