//! POP3 response parsing.
//!
//! Every response starts with a status line, `+OK` or `-ERR` followed by
//! optional text. Multi-line responses then carry lines up to a lone `.`,
//! with any line that begins with `.` byte-stuffed by the server.

use crate::error::{Error, Result};
use crate::types::{ScanListing, Stat};

/// Parses a status line, returning the text after `+OK`.
///
/// # Errors
///
/// Returns [`Error::Negative`] for `-ERR` and [`Error::Protocol`] for
/// anything else.
pub fn parse_status(line: &str) -> Result<&str> {
    if let Some(rest) = line.strip_prefix("+OK") {
        return Ok(rest.trim_start());
    }
    if let Some(rest) = line.strip_prefix("-ERR") {
        return Err(Error::Negative(rest.trim_start().to_string()));
    }
    Err(Error::Protocol(format!("Unexpected status line: {line}")))
}

/// Parses the text of a `STAT` reply: `<count> <size>`.
///
/// # Errors
///
/// Returns [`Error::Protocol`] if either number is missing or malformed.
pub fn parse_stat(text: &str) -> Result<Stat> {
    let mut parts = text.split_whitespace();
    let count = parse_number(parts.next(), text)?;
    let size = parse_number(parts.next(), text)?;
    Ok(Stat { count, size })
}

/// Parses a scan listing line: `<index> <size>`.
///
/// # Errors
///
/// Returns [`Error::Protocol`] if either number is missing or malformed.
pub fn parse_scan_listing(line: &str) -> Result<ScanListing> {
    let mut parts = line.split_whitespace();
    let index = parse_number(parts.next(), line)?;
    let size = parse_number(parts.next(), line)?;
    Ok(ScanListing { index, size })
}

fn parse_number<T: std::str::FromStr>(field: Option<&str>, line: &str) -> Result<T> {
    field
        .and_then(|value| value.parse().ok())
        .ok_or_else(|| Error::Protocol(format!("Malformed listing: {line}")))
}

/// Classifies one raw line of a multi-line body.
///
/// Returns `None` for the terminating `.`, otherwise the line with the
/// trailing CRLF removed and one leading stuffed dot stripped.
#[must_use]
pub fn unstuff_line(raw: &[u8]) -> Option<&[u8]> {
    let line = raw
        .strip_suffix(b"\n")
        .map_or(raw, |l| l.strip_suffix(b"\r").unwrap_or(l));
    if line == b"." {
        return None;
    }
    Some(line.strip_prefix(b".").unwrap_or(line))
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn ok_status() {
        assert_eq!(parse_status("+OK 2 320").unwrap(), "2 320");
        assert_eq!(parse_status("+OK").unwrap(), "");
    }

    #[test]
    fn err_status() {
        let err = parse_status("-ERR no such message").unwrap_err();
        assert!(matches!(err, Error::Negative(ref m) if m == "no such message"));
    }

    #[test]
    fn garbage_status() {
        assert!(matches!(
            parse_status("* OK imap"),
            Err(Error::Protocol(_))
        ));
    }

    #[test]
    fn stat_reply() {
        assert_eq!(parse_stat("2 320").unwrap(), Stat { count: 2, size: 320 });
        assert!(parse_stat("two 320").is_err());
        assert!(parse_stat("2").is_err());
    }

    #[test]
    fn scan_listing() {
        assert_eq!(
            parse_scan_listing("3 1205").unwrap(),
            ScanListing {
                index: 3,
                size: 1205
            }
        );
        assert!(parse_scan_listing("").is_err());
    }

    #[test]
    fn unstuffing() {
        assert_eq!(unstuff_line(b".\r\n"), None);
        assert_eq!(unstuff_line(b"."), None);
        assert_eq!(unstuff_line(b"..hidden\r\n"), Some(&b".hidden"[..]));
        assert_eq!(unstuff_line(b"plain\r\n"), Some(&b"plain"[..]));
        assert_eq!(unstuff_line(b"bare lf\n"), Some(&b"bare lf"[..]));
        assert_eq!(unstuff_line(b"\r\n"), Some(&b""[..]));
    }
}
