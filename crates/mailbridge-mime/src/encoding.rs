//! MIME encoding and decoding utilities.
//!
//! Supports Base64, Quoted-Printable, and RFC 2047 header encoding.

use crate::error::{Error, Result};
use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use encoding_rs::{Encoding, UTF_8};

/// Maximum line length for encoded bodies (RFC 2045).
const MAX_LINE_LENGTH: usize = 76;

/// Raw bytes carried by one RFC 2047 encoded-word, keeping it under 75 columns.
const ENCODED_WORD_CHUNK: usize = 45;

/// Encodes data as Base64.
#[must_use]
pub fn encode_base64(data: &[u8]) -> String {
    STANDARD.encode(data)
}

/// Encodes data as Base64 wrapped at 76 columns with CRLF line breaks.
#[must_use]
pub fn encode_base64_wrapped(data: &[u8]) -> String {
    let encoded = STANDARD.encode(data);
    let lines: Vec<&str> = encoded
        .as_bytes()
        .chunks(MAX_LINE_LENGTH)
        .filter_map(|chunk| std::str::from_utf8(chunk).ok())
        .collect();
    lines.join("\r\n")
}

/// Decodes Base64 data, ignoring embedded whitespace and line breaks.
///
/// # Errors
///
/// Returns an error if the input is not valid Base64.
pub fn decode_base64(data: &str) -> Result<Vec<u8>> {
    let cleaned: String = data.chars().filter(|c| !c.is_whitespace()).collect();
    STANDARD.decode(cleaned).map_err(Into::into)
}

/// Decodes Quoted-Printable data (RFC 2045) to raw bytes.
///
/// # Errors
///
/// Returns an error if the input contains an invalid escape sequence.
pub fn decode_quoted_printable(data: &[u8]) -> Result<Vec<u8>> {
    let mut result = Vec::with_capacity(data.len());
    let mut i = 0;

    while i < data.len() {
        let byte = data[i];
        if byte != b'=' {
            result.push(byte);
            i += 1;
            continue;
        }

        match data.get(i + 1..) {
            Some([b'\r', b'\n', ..]) => i += 3,
            Some([b'\n', ..]) => i += 2,
            Some([hi, lo, ..]) => {
                let value = hex_value(*hi)
                    .zip(hex_value(*lo))
                    .map(|(h, l)| (h << 4) | l)
                    .ok_or_else(|| {
                        Error::InvalidEncoding(format!(
                            "Invalid escape ={}{}",
                            char::from(*hi),
                            char::from(*lo)
                        ))
                    })?;
                result.push(value);
                i += 3;
            }
            _ => {
                return Err(Error::InvalidEncoding(
                    "Incomplete escape sequence".to_string(),
                ));
            }
        }
    }

    Ok(result)
}

const fn hex_value(byte: u8) -> Option<u8> {
    match byte {
        b'0'..=b'9' => Some(byte - b'0'),
        b'a'..=b'f' => Some(byte - b'a' + 10),
        b'A'..=b'F' => Some(byte - b'A' + 10),
        _ => None,
    }
}

/// Encodes a header value using RFC 2047 B-encoding when it is not plain ASCII.
///
/// Long values are split over several encoded-words on character boundaries,
/// separated by folding whitespace.
#[must_use]
pub fn encode_rfc2047(text: &str) -> String {
    if text.chars().all(|c| c.is_ascii() && !c.is_ascii_control()) && !text.contains("=?") {
        return text.to_string();
    }

    let mut words = Vec::new();
    let mut chunk = String::new();
    for ch in text.chars() {
        if chunk.len() + ch.len_utf8() > ENCODED_WORD_CHUNK {
            words.push(format!("=?utf-8?B?{}?=", encode_base64(chunk.as_bytes())));
            chunk.clear();
        }
        chunk.push(ch);
    }
    if !chunk.is_empty() {
        words.push(format!("=?utf-8?B?{}?=", encode_base64(chunk.as_bytes())));
    }
    words.join("\r\n ")
}

/// Decodes every RFC 2047 encoded-word in a header value.
///
/// Whitespace between adjacent encoded-words is dropped. Words that cannot be
/// decoded are kept literally, and text in an unsupported charset is read as
/// UTF-8 with invalid sequences replaced.
#[must_use]
pub fn decode_rfc2047(text: &str) -> String {
    let mut result = String::with_capacity(text.len());
    let mut rest = text;
    let mut pending_space = "";
    let mut after_word = false;

    while !rest.is_empty() {
        let Some(start) = rest.find("=?") else {
            result.push_str(pending_space);
            result.push_str(rest);
            return result;
        };

        let (before, candidate) = rest.split_at(start);
        if let Some((decoded, consumed)) = decode_encoded_word(candidate) {
            if !(after_word && before.trim().is_empty()) {
                result.push_str(pending_space);
                result.push_str(before);
            }
            result.push_str(&decoded);
            after_word = true;
            rest = &candidate[consumed..];

            let trimmed = rest.trim_start();
            pending_space = &rest[..rest.len() - trimmed.len()];
            rest = trimmed;
        } else {
            result.push_str(pending_space);
            result.push_str(before);
            result.push_str("=?");
            pending_space = "";
            after_word = false;
            rest = &candidate[2..];
        }
    }

    if !after_word {
        result.push_str(pending_space);
    }
    result
}

/// Decodes one encoded-word at the start of `text`, returning the text and
/// the number of bytes consumed.
fn decode_encoded_word(text: &str) -> Option<(String, usize)> {
    let inner = text.strip_prefix("=?")?;
    let (charset, inner) = inner.split_once('?')?;
    let (encoding, inner) = inner.split_once('?')?;
    let end = inner.find("?=")?;
    let payload = &inner[..end];
    if payload.contains(char::is_whitespace) {
        return None;
    }

    let bytes = match encoding {
        "B" | "b" => decode_base64(payload).ok()?,
        "Q" | "q" => decode_quoted_printable(payload.replace('_', " ").as_bytes()).ok()?,
        _ => return None,
    };

    // "=?" + charset + "?" + encoding + "?" + payload + "?="
    let consumed = 2 + charset.len() + 1 + encoding.len() + 1 + end + 2;
    Some((decode_charset(&bytes, charset), consumed))
}

/// Converts bytes in the given charset to a string.
///
/// Charset labels are resolved through the WHATWG registry, so aliases such
/// as `gb2312`, `gbk` or `latin1` work. Unknown labels are read as UTF-8.
/// Invalid sequences are replaced in either case.
#[must_use]
pub fn decode_charset(bytes: &[u8], charset: &str) -> String {
    // RFC 2231 allows a language suffix: utf-8*en
    let label = charset.split('*').next().unwrap_or(charset).trim();
    let encoding = Encoding::for_label(label.as_bytes()).unwrap_or(UTF_8);
    let (text, _) = encoding.decode_without_bom_handling(bytes);
    text.into_owned()
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn base64_ignores_line_breaks() {
        assert_eq!(decode_base64("SGVs\r\nbG8s IFdv\ncmxkIQ==").unwrap(), b"Hello, World!");
        assert!(decode_base64("not base64!").is_err());
    }

    #[test]
    fn base64_wrapping() {
        let wrapped = encode_base64_wrapped(&[0u8; 100]);
        let lines: Vec<&str> = wrapped.split("\r\n").collect();
        assert_eq!(lines.len(), 2);
        assert_eq!(lines[0].len(), 76);
        assert_eq!(decode_base64(&wrapped).unwrap(), vec![0u8; 100]);
    }

    #[test]
    fn quoted_printable() {
        assert_eq!(decode_quoted_printable(b"H=C3=A9llo").unwrap(), "Héllo".as_bytes());
        assert_eq!(decode_quoted_printable(b"Hello=\r\nWorld").unwrap(), b"HelloWorld");
        assert_eq!(decode_quoted_printable(b"soft=\nbreak").unwrap(), b"softbreak");
        assert!(decode_quoted_printable(b"bad=ZZ").is_err());
        assert!(decode_quoted_printable(b"cut=4").is_err());
    }

    #[test]
    fn rfc2047_encode_only_when_needed() {
        assert_eq!(encode_rfc2047("Hello"), "Hello");

        let encoded = encode_rfc2047("Héllo");
        assert_eq!(encoded, "=?utf-8?B?SMOpbGxv?=");
        assert_eq!(decode_rfc2047(&encoded), "Héllo");
    }

    #[test]
    fn rfc2047_long_values_split_on_char_boundaries() {
        let subject = "测试".repeat(20);
        let encoded = encode_rfc2047(&subject);
        assert!(encoded.contains("\r\n "));
        assert!(encoded.lines().all(|line| line.trim().len() <= 75));
        assert_eq!(decode_rfc2047(&encoded), subject);
    }

    #[test]
    fn rfc2047_mixed_words() {
        assert_eq!(
            decode_rfc2047("Re: =?utf-8?Q?caf=C3=A9_au_lait?= today"),
            "Re: café au lait today"
        );
        assert_eq!(
            decode_rfc2047("=?utf-8?B?5L2g?= =?utf-8?B?5aW9?="),
            "你好"
        );
        assert_eq!(decode_rfc2047("=?iso-8859-1?Q?Andr=E9?="), "André");
    }

    #[test]
    fn rfc2047_broken_words_stay_literal() {
        assert_eq!(decode_rfc2047("=?utf-8?X?abc?="), "=?utf-8?X?abc?=");
        assert_eq!(decode_rfc2047("price =? unknown"), "price =? unknown");
        assert_eq!(decode_rfc2047("plain text"), "plain text");
    }

    #[test]
    fn unknown_charset_is_read_lossily() {
        assert_eq!(decode_charset(b"ok\xff", "x-unknown"), "ok\u{fffd}");
        assert_eq!(decode_charset("é".as_bytes(), "UTF-8"), "é");
    }

    #[test]
    fn chinese_legacy_charsets() {
        assert_eq!(decode_charset(b"\xc4\xe3\xba\xc3", "GB2312"), "你好");
        assert_eq!(decode_charset(b"\xc4\xe3\xba\xc3", "gbk"), "你好");
        assert_eq!(decode_rfc2047("=?gb2312?B?xOO6ww==?="), "你好");
        assert_eq!(decode_rfc2047("=?GB18030?Q?=C4=E3=BA=C3?= ok"), "你好 ok");
    }

    proptest! {
        #[test]
        fn header_decoding_never_panics(input in ".{0,64}") {
            let _ = decode_rfc2047(&input);
        }

        #[test]
        fn encoded_subjects_decode_back(subject in "\\PC{0,80}") {
            prop_assert_eq!(decode_rfc2047(&encode_rfc2047(&subject)), subject);
        }
    }
}
