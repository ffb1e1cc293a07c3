//! Mailbox address parsing (RFC 5322 `From`/`To` values).

use crate::encoding::decode_rfc2047;
use std::fmt;

/// A display name and address pair.
///
/// Either part may be empty when the header does not carry it.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Mailbox {
    /// Display name, with RFC 2047 encoded-words decoded.
    pub name: String,
    /// Address (`local@domain`).
    pub address: String,
}

impl Mailbox {
    /// Creates a mailbox from its parts.
    #[must_use]
    pub fn new(name: impl Into<String>, address: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            address: address.into(),
        }
    }

    /// Parses the first mailbox of an address header value.
    ///
    /// Accepts `Name <addr>`, `"Quoted, Name" <addr>`, `addr (Comment)` and a
    /// bare `addr`. Anything unparseable yields the trimmed text as address.
    #[must_use]
    pub fn parse(value: &str) -> Self {
        let first = first_address(value.trim());

        if let Some(open) = first.rfind('<')
            && let Some(close) = first[open..].find('>')
        {
            let address = first[open + 1..open + close].trim();
            return Self::new(display_name(&first[..open]), address);
        }

        if let Some(open) = first.find('(')
            && let Some(close) = first.rfind(')')
            && close > open
        {
            let address = first[..open].trim();
            return Self::new(display_name(&first[open + 1..close]), address);
        }

        Self::new("", first.trim())
    }

    /// Parses every mailbox of an address list.
    #[must_use]
    pub fn parse_list(value: &str) -> Vec<Self> {
        split_outside_quotes(value)
            .into_iter()
            .filter(|part| !part.trim().is_empty())
            .map(Self::parse)
            .collect()
    }
}

impl fmt::Display for Mailbox {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.name.is_empty() {
            f.write_str(&self.address)
        } else {
            write!(f, "{} <{}>", self.name, self.address)
        }
    }
}

fn first_address(value: &str) -> &str {
    split_outside_quotes(value).into_iter().next().unwrap_or("")
}

/// Splits on commas that are not inside quotes or angle brackets.
fn split_outside_quotes(value: &str) -> Vec<&str> {
    let mut parts = Vec::new();
    let mut in_quotes = false;
    let mut in_angle = false;
    let mut escaped = false;
    let mut start = 0;

    for (i, ch) in value.char_indices() {
        if escaped {
            escaped = false;
            continue;
        }
        match ch {
            '\\' if in_quotes => escaped = true,
            '"' => in_quotes = !in_quotes,
            '<' if !in_quotes => in_angle = true,
            '>' if !in_quotes => in_angle = false,
            ',' if !in_quotes && !in_angle => {
                parts.push(&value[start..i]);
                start = i + 1;
            }
            _ => {}
        }
    }
    parts.push(&value[start..]);
    parts
}

fn display_name(raw: &str) -> String {
    let raw = raw.trim();
    let unquoted = raw
        .strip_prefix('"')
        .and_then(|r| r.strip_suffix('"'))
        .map_or_else(|| raw.to_string(), |r| r.replace("\\\"", "\"").replace("\\\\", "\\"));
    decode_rfc2047(unquoted.trim())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn name_and_angle_address() {
        let mailbox = Mailbox::parse("Alice Smith <alice@example.com>");
        assert_eq!(mailbox, Mailbox::new("Alice Smith", "alice@example.com"));
        assert_eq!(mailbox.to_string(), "Alice Smith <alice@example.com>");
    }

    #[test]
    fn quoted_name_with_comma() {
        let mailbox = Mailbox::parse("\"Doe, John\" <john@example.com>, other@example.com");
        assert_eq!(mailbox, Mailbox::new("Doe, John", "john@example.com"));
    }

    #[test]
    fn encoded_name() {
        let mailbox = Mailbox::parse("=?utf-8?B?5byg5LiJ?= <zhang@example.com>");
        assert_eq!(mailbox.name, "张三");
        assert_eq!(mailbox.address, "zhang@example.com");
    }

    #[test]
    fn bare_and_commented_addresses() {
        assert_eq!(
            Mailbox::parse("bob@example.com"),
            Mailbox::new("", "bob@example.com")
        );
        assert_eq!(
            Mailbox::parse("bob@example.com (Bob)"),
            Mailbox::new("Bob", "bob@example.com")
        );
        assert_eq!(Mailbox::parse("<bob@example.com>").name, "");
        assert_eq!(Mailbox::parse(""), Mailbox::default());
        assert_eq!(Mailbox::parse("bob@example.com").to_string(), "bob@example.com");
    }

    #[test]
    fn address_lists() {
        let list = Mailbox::parse_list("a@example.com, \"B, Jr\" <b@example.com>,");
        assert_eq!(list.len(), 2);
        assert_eq!(list[1].name, "B, Jr");
    }
}
