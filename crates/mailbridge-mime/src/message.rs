//! MIME message structure and parsing.

use crate::address::Mailbox;
use crate::content_type::ContentType;
use crate::encoding::{decode_base64, decode_charset, decode_quoted_printable};
use crate::error::Result;
use crate::header::Headers;
use std::fmt;

/// Deepest multipart nesting that is split into child parts. Entities below
/// this level are kept as opaque bodies.
pub const MAX_NESTING: usize = 64;

/// Transfer encoding types.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransferEncoding {
    /// 7-bit ASCII.
    SevenBit,
    /// 8-bit binary.
    EightBit,
    /// Base64 encoding.
    Base64,
    /// Quoted-Printable encoding.
    QuotedPrintable,
    /// Binary (no encoding).
    Binary,
}

impl TransferEncoding {
    /// Parses transfer encoding from string.
    #[must_use]
    pub fn parse(s: &str) -> Self {
        match s.trim().to_lowercase().as_str() {
            "8bit" => Self::EightBit,
            "base64" => Self::Base64,
            "quoted-printable" => Self::QuotedPrintable,
            "binary" => Self::Binary,
            _ => Self::SevenBit,
        }
    }
}

impl fmt::Display for TransferEncoding {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::SevenBit => write!(f, "7bit"),
            Self::EightBit => write!(f, "8bit"),
            Self::Base64 => write!(f, "base64"),
            Self::QuotedPrintable => write!(f, "quoted-printable"),
            Self::Binary => write!(f, "binary"),
        }
    }
}

/// One entity of a MIME tree: headers, raw body, and child parts when the
/// entity is multipart.
#[derive(Debug, Clone, Default)]
pub struct Part {
    /// Part headers.
    pub headers: Headers,
    /// Raw body bytes, still transfer-encoded.
    pub body: Vec<u8>,
    /// Child parts (empty unless multipart).
    pub parts: Vec<Part>,
}

impl Part {
    /// Parses an entity from raw bytes.
    ///
    /// Parsing is lenient: a multipart entity without a boundary, or a
    /// malformed content type, is kept as a single opaque body. So is a
    /// multipart entity nested deeper than [`MAX_NESTING`].
    #[must_use]
    pub fn parse(raw: &[u8]) -> Self {
        Self::parse_at(raw, 0)
    }

    fn parse_at(raw: &[u8], depth: usize) -> Self {
        let (head, body) = split_head(raw);
        let headers = Headers::parse(&String::from_utf8_lossy(head));
        let mut part = Self {
            headers,
            body: body.to_vec(),
            parts: Vec::new(),
        };

        let content_type = part.content_type();
        if content_type.is_multipart()
            && depth < MAX_NESTING
            && let Some(boundary) = content_type.boundary()
        {
            part.parts = split_multipart(body, boundary)
                .into_iter()
                .map(|raw| Self::parse_at(raw, depth + 1))
                .collect();
        }
        part
    }

    /// Gets the content type, defaulting to `text/plain` when absent or invalid.
    #[must_use]
    pub fn content_type(&self) -> ContentType {
        self.headers
            .get("content-type")
            .and_then(|value| ContentType::parse(value).ok())
            .unwrap_or_else(ContentType::text_plain)
    }

    /// Gets the transfer encoding.
    #[must_use]
    pub fn transfer_encoding(&self) -> TransferEncoding {
        self.headers
            .get("content-transfer-encoding")
            .map_or(TransferEncoding::SevenBit, TransferEncoding::parse)
    }

    /// Checks if the entity is declared `multipart/*`, whether or not any
    /// child parts were found.
    #[must_use]
    pub fn is_multipart(&self) -> bool {
        self.content_type().is_multipart()
    }

    /// Decodes the body according to the transfer encoding.
    ///
    /// # Errors
    ///
    /// Returns an error if the body is not valid for its declared encoding.
    pub fn decode_body(&self) -> Result<Vec<u8>> {
        match self.transfer_encoding() {
            TransferEncoding::Base64 => decode_base64(&String::from_utf8_lossy(&self.body)),
            TransferEncoding::QuotedPrintable => decode_quoted_printable(&self.body),
            _ => Ok(self.body.clone()),
        }
    }

    /// Decodes the body as text in its declared charset (UTF-8 if none),
    /// replacing invalid sequences.
    ///
    /// A body that fails transfer decoding is returned as-is.
    #[must_use]
    pub fn body_text_lossy(&self) -> String {
        let bytes = self.decode_body().unwrap_or_else(|_| self.body.clone());
        let content_type = self.content_type();
        decode_charset(&bytes, content_type.charset().unwrap_or("utf-8"))
    }

    /// Visits this entity and every descendant, depth first.
    pub fn walk(&self) -> impl Iterator<Item = &Self> {
        let mut stack = vec![self];
        std::iter::from_fn(move || {
            let part = stack.pop()?;
            stack.extend(part.parts.iter().rev());
            Some(part)
        })
    }
}

/// Parsed RFC 5322 message.
#[derive(Debug, Clone, Default)]
pub struct Message {
    root: Part,
}

impl Message {
    /// Parses a raw message.
    #[must_use]
    pub fn parse(raw: &[u8]) -> Self {
        Self {
            root: Part::parse(raw),
        }
    }

    /// Top-level headers.
    #[must_use]
    pub const fn headers(&self) -> &Headers {
        &self.root.headers
    }

    /// The top-level entity.
    #[must_use]
    pub const fn root(&self) -> &Part {
        &self.root
    }

    /// Checks if this is a multipart message.
    #[must_use]
    pub fn is_multipart(&self) -> bool {
        self.root.is_multipart()
    }

    /// First mailbox of the `From` header.
    #[must_use]
    pub fn from(&self) -> Mailbox {
        self.headers().get("from").map(Mailbox::parse).unwrap_or_default()
    }

    /// First mailbox of the `To` header.
    #[must_use]
    pub fn to(&self) -> Mailbox {
        self.headers().get("to").map(Mailbox::parse).unwrap_or_default()
    }

    /// Decoded `Subject` header, empty if absent.
    #[must_use]
    pub fn subject(&self) -> String {
        self.headers().get_decoded("subject").unwrap_or_default()
    }

    /// Raw `Date` header, empty if absent.
    #[must_use]
    pub fn date(&self) -> &str {
        self.headers().get("date").unwrap_or_default()
    }

    /// Extracts the plain-text body.
    ///
    /// For messages declared multipart this is the first `text/plain` entity
    /// found in a depth-first walk, or an empty string if there is none. A
    /// single-part message yields its payload, whatever its content type.
    #[must_use]
    pub fn text_body(&self) -> String {
        if !self.root.is_multipart() {
            return self.root.body_text_lossy();
        }

        self.root
            .walk()
            .find(|part| !part.is_multipart() && part.content_type().is("text", "plain"))
            .map(Part::body_text_lossy)
            .unwrap_or_default()
    }
}

/// Splits a raw entity at the first empty line.
fn split_head(raw: &[u8]) -> (&[u8], &[u8]) {
    let mut line_start = 0;
    while line_start < raw.len() {
        let line_end = raw[line_start..]
            .iter()
            .position(|&b| b == b'\n')
            .map_or(raw.len(), |p| line_start + p + 1);
        let line = &raw[line_start..line_end];
        if line == b"\r\n" || line == b"\n" {
            return (&raw[..line_start], &raw[line_end..]);
        }
        line_start = line_end;
    }
    (raw, &[])
}

/// Returns the raw bytes of each body part between boundary delimiters.
///
/// The line break before a delimiter belongs to the delimiter. A missing
/// close delimiter ends the last part at the end of input.
fn split_multipart<'a>(body: &'a [u8], boundary: &str) -> Vec<&'a [u8]> {
    let delimiter = format!("--{boundary}");
    let mut parts = Vec::new();
    let mut current: Option<usize> = None;
    let mut line_start = 0;

    while line_start < body.len() {
        let line_end = body[line_start..]
            .iter()
            .position(|&b| b == b'\n')
            .map_or(body.len(), |p| line_start + p + 1);
        let line = trim_line_end(&body[line_start..line_end]);

        if let Some(rest) = line.strip_prefix(delimiter.as_bytes()) {
            let rest = trim_line_end(rest);
            let is_close = rest.starts_with(b"--");
            if rest.is_empty() || is_close {
                if let Some(start) = current.take() {
                    parts.push(strip_trailing_newline(&body[start..line_start]));
                }
                if is_close {
                    return parts;
                }
                current = Some(line_end);
            }
        }
        line_start = line_end;
    }

    if let Some(start) = current {
        parts.push(&body[start..]);
    }
    parts
}

fn trim_line_end(line: &[u8]) -> &[u8] {
    let end = line
        .iter()
        .rposition(|b| !matches!(b, b'\r' | b'\n' | b' ' | b'\t'))
        .map_or(0, |p| p + 1);
    &line[..end]
}

fn strip_trailing_newline(part: &[u8]) -> &[u8] {
    let part = part.strip_suffix(b"\n").unwrap_or(part);
    part.strip_suffix(b"\r").unwrap_or(part)
}
