//! Base64 substitution tables.

use super::CodecError;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// The standard Base64 alphabet (RFC 4648).
pub const STANDARD_ALPHABET: &str =
    "ABCDEFGHIJKLMNOPQRSTUVWXYZabcdefghijklmnopqrstuvwxyz0123456789+/";

/// Number of characters in a Base64 alphabet.
pub const TABLE_LEN: usize = 64;

/// A 64-character alphabet replacing the standard Base64 one position for position.
///
/// Every character is distinct and `=` is reserved for padding, so encoded
/// text always maps back unambiguously.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct SubstitutionTable {
    chars: Vec<char>,
}

impl SubstitutionTable {
    /// The identity table (the standard alphabet itself).
    #[must_use]
    pub fn standard() -> Self {
        Self {
            chars: STANDARD_ALPHABET.chars().collect(),
        }
    }

    /// Builds a table from exactly 64 distinct characters.
    ///
    /// # Errors
    ///
    /// Returns a [`CodecError`] if the length is not 64, a character repeats,
    /// or `=` is present.
    pub fn from_chars(chars: Vec<char>) -> Result<Self, CodecError> {
        if chars.len() != TABLE_LEN {
            return Err(CodecError::InvalidTableLength(chars.len()));
        }
        if chars.contains(&'=') {
            return Err(CodecError::PaddingInTable);
        }
        for (i, c) in chars.iter().enumerate() {
            if chars[..i].contains(c) {
                return Err(CodecError::DuplicateCharacter(*c));
            }
        }
        Ok(Self { chars })
    }

    /// Character that stands in for the standard alphabet position `index`.
    #[must_use]
    pub fn char_at(&self, index: usize) -> Option<char> {
        self.chars.get(index).copied()
    }

    /// Standard alphabet position represented by `c`, if it is in the table.
    #[must_use]
    pub fn position(&self, c: char) -> Option<usize> {
        self.chars.iter().position(|&t| t == c)
    }

    /// The table's characters in order.
    #[must_use]
    pub fn chars(&self) -> &[char] {
        &self.chars
    }

    /// Checks if this is the standard alphabet.
    #[must_use]
    pub fn is_standard(&self) -> bool {
        self.chars.iter().copied().eq(STANDARD_ALPHABET.chars())
    }
}

impl Default for SubstitutionTable {
    fn default() -> Self {
        Self::standard()
    }
}

impl FromStr for SubstitutionTable {
    type Err = CodecError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::from_chars(s.chars().collect())
    }
}

impl TryFrom<String> for SubstitutionTable {
    type Error = CodecError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<SubstitutionTable> for String {
    fn from(table: SubstitutionTable) -> Self {
        table.chars.into_iter().collect()
    }
}

impl fmt::Display for SubstitutionTable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.chars.iter().try_for_each(|c| write!(f, "{c}"))
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn standard_is_identity() {
        let table = SubstitutionTable::standard();
        assert!(table.is_standard());
        assert_eq!(table.to_string(), STANDARD_ALPHABET);
        assert_eq!(table.char_at(0), Some('A'));
        assert_eq!(table.position('/'), Some(63));
        assert_eq!(table.char_at(64), None);
    }

    #[test]
    fn rejects_wrong_length() {
        assert!(matches!(
            "ABC".parse::<SubstitutionTable>(),
            Err(CodecError::InvalidTableLength(3))
        ));
        let long = format!("{STANDARD_ALPHABET}!");
        assert!(matches!(
            long.parse::<SubstitutionTable>(),
            Err(CodecError::InvalidTableLength(65))
        ));
    }

    #[test]
    fn length_counts_characters_not_bytes() {
        let table: String = STANDARD_ALPHABET.replacen('A', "é", 1);
        assert_eq!(table.len(), 65);
        let parsed: SubstitutionTable = table.parse().unwrap();
        assert_eq!(parsed.char_at(0), Some('é'));
    }

    #[test]
    fn rejects_duplicates_and_padding() {
        let dup = STANDARD_ALPHABET.replacen('B', "A", 1);
        assert!(matches!(
            dup.parse::<SubstitutionTable>(),
            Err(CodecError::DuplicateCharacter('A'))
        ));

        let padded = STANDARD_ALPHABET.replacen('+', "=", 1);
        assert!(matches!(
            padded.parse::<SubstitutionTable>(),
            Err(CodecError::PaddingInTable)
        ));
    }

    #[test]
    fn serde_as_plain_string() {
        let table = SubstitutionTable::standard();
        let json = serde_json::to_string(&table).unwrap();
        assert_eq!(json, format!("\"{STANDARD_ALPHABET}\""));

        let back: SubstitutionTable = serde_json::from_str(&json).unwrap();
        assert_eq!(back, table);
        assert!(serde_json::from_str::<SubstitutionTable>("\"short\"").is_err());
    }
}
