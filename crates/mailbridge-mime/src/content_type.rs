//! MIME content type handling.

use crate::error::{Error, Result};
use std::fmt;

/// MIME content type with parameters.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ContentType {
    /// Main type (e.g., "text", "application", "multipart").
    pub main_type: String,
    /// Subtype (e.g., "plain", "octet-stream", "mixed").
    pub sub_type: String,
    /// Parameters in header order, names lower-cased.
    pub parameters: Vec<(String, String)>,
}

impl ContentType {
    /// Creates a new content type.
    #[must_use]
    pub fn new(main_type: impl Into<String>, sub_type: impl Into<String>) -> Self {
        Self {
            main_type: main_type.into(),
            sub_type: sub_type.into(),
            parameters: Vec::new(),
        }
    }

    /// Creates a `text/plain; charset="utf-8"` content type.
    #[must_use]
    pub fn text_plain() -> Self {
        Self::new("text", "plain").with_parameter("charset", "utf-8")
    }

    /// Creates an `application/octet-stream` content type.
    #[must_use]
    pub fn application_octet_stream() -> Self {
        Self::new("application", "octet-stream")
    }

    /// Creates a multipart/mixed content type with boundary.
    #[must_use]
    pub fn multipart_mixed(boundary: impl Into<String>) -> Self {
        Self::new("multipart", "mixed").with_parameter("boundary", boundary)
    }

    /// Adds or replaces a parameter.
    #[must_use]
    pub fn with_parameter(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        let key = key.into().to_ascii_lowercase();
        self.parameters.retain(|(k, _)| *k != key);
        self.parameters.push((key, value.into()));
        self
    }

    /// Returns a parameter value by (case-insensitive) name.
    #[must_use]
    pub fn parameter(&self, name: &str) -> Option<&str> {
        self.parameters
            .iter()
            .find(|(k, _)| k.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }

    /// Returns the charset parameter if present.
    #[must_use]
    pub fn charset(&self) -> Option<&str> {
        self.parameter("charset")
    }

    /// Returns the boundary parameter if present.
    #[must_use]
    pub fn boundary(&self) -> Option<&str> {
        self.parameter("boundary")
    }

    /// Checks if this is a multipart content type.
    #[must_use]
    pub fn is_multipart(&self) -> bool {
        self.main_type.eq_ignore_ascii_case("multipart")
    }

    /// Checks for an exact `type/subtype` match, ignoring case.
    #[must_use]
    pub fn is(&self, main_type: &str, sub_type: &str) -> bool {
        self.main_type.eq_ignore_ascii_case(main_type) && self.sub_type.eq_ignore_ascii_case(sub_type)
    }

    /// Parses a content type string.
    ///
    /// Format: `type/subtype; param1=value1; param2="quoted; value"`
    ///
    /// # Errors
    ///
    /// Returns an error if the type or subtype is missing.
    pub fn parse(s: &str) -> Result<Self> {
        let mut parts = split_parameters(s).into_iter();

        let type_str = parts.next().unwrap_or_default();
        let (main_type, sub_type) = type_str
            .split_once('/')
            .map(|(m, s)| (m.trim(), s.trim()))
            .filter(|(m, s)| !m.is_empty() && !s.is_empty())
            .ok_or_else(|| Error::InvalidContentType(s.trim().to_string()))?;

        let mut content_type = Self::new(main_type.to_lowercase(), sub_type.to_lowercase());
        for param in parts {
            if let Some((key, value)) = param.split_once('=') {
                let value = value.trim();
                let value = value
                    .strip_prefix('"')
                    .and_then(|v| v.strip_suffix('"'))
                    .unwrap_or(value);
                content_type = content_type.with_parameter(key.trim(), value);
            }
        }

        Ok(content_type)
    }
}

/// Splits on `;` outside of double quotes.
fn split_parameters(s: &str) -> Vec<&str> {
    let mut parts = Vec::new();
    let mut in_quotes = false;
    let mut start = 0;
    for (i, ch) in s.char_indices() {
        match ch {
            '"' => in_quotes = !in_quotes,
            ';' if !in_quotes => {
                parts.push(s[start..i].trim());
                start = i + 1;
            }
            _ => {}
        }
    }
    parts.push(s[start..].trim());
    parts
}

impl fmt::Display for ContentType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.main_type, self.sub_type)?;

        for (key, value) in &self.parameters {
            if value.contains(|c: char| c.is_whitespace() || "()<>@,;:\\\"/[]?=".contains(c)) {
                write!(f, "; {key}=\"{value}\"")?;
            } else {
                write!(f, "; {key}={value}")?;
            }
        }

        Ok(())
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn parse_with_charset() {
        let ct = ContentType::parse("Text/Plain; Charset=UTF-8").unwrap();
        assert!(ct.is("text", "plain"));
        assert_eq!(ct.charset(), Some("UTF-8"));
    }

    #[test]
    fn parse_quoted_boundary_with_separator() {
        let ct = ContentType::parse("multipart/mixed; boundary=\"----=_Part;123\"").unwrap();
        assert!(ct.is_multipart());
        assert_eq!(ct.boundary(), Some("----=_Part;123"));
    }

    #[test]
    fn parse_rejects_missing_subtype() {
        assert!(ContentType::parse("text").is_err());
        assert!(ContentType::parse("").is_err());
        assert!(ContentType::parse("text/").is_err());
    }

    #[test]
    fn display_quotes_special_values() {
        assert_eq!(
            ContentType::text_plain().to_string(),
            "text/plain; charset=utf-8"
        );
        assert_eq!(
            ContentType::multipart_mixed("==b1==").to_string(),
            "multipart/mixed; boundary=\"==b1==\""
        );
        assert_eq!(
            ContentType::application_octet_stream().to_string(),
            "application/octet-stream"
        );
    }
}
