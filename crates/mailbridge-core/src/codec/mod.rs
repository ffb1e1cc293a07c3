//! Body text codec: Base64, optionally remapped through a substitution table.
//!
//! In standard mode a body is plain Base64 of its UTF-8 bytes. In custom mode
//! every alphabet character of that Base64 text is replaced by the character
//! at the same position of a [`SubstitutionTable`]; padding passes through.
//!
//! ```
//! use mailbridge_core::codec::Codec;
//! use mailbridge_core::negotiator::derive_table;
//!
//! let codec = Codec::with_table(derive_table("shared"));
//! let encoded = codec.encode("你好, world");
//! assert_eq!(codec.decode(&encoded).unwrap(), "你好, world");
//! ```

mod table;
mod transform;

pub use table::{STANDARD_ALPHABET, SubstitutionTable, TABLE_LEN};
pub use transform::{Decoder, Encoder, TextTransform, TransformError};

use crate::negotiator::{derive_table, generate_table};
use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use serde::{Deserialize, Serialize};

/// Errors from table configuration or decoding.
#[derive(Debug, thiserror::Error)]
pub enum CodecError {
    /// Table does not hold exactly 64 characters.
    #[error("Substitution table must have 64 characters, got {0}")]
    InvalidTableLength(usize),

    /// Table repeats a character.
    #[error("Substitution table repeats character {0:?}")]
    DuplicateCharacter(char),

    /// Table uses the padding character.
    #[error("Substitution table must not contain '='")]
    PaddingInTable,

    /// Text is not valid Base64 after reverse mapping.
    #[error("Invalid Base64 text: {0}")]
    InvalidBase64(#[from] base64::DecodeError),

    /// Decoded bytes are not UTF-8.
    #[error("Decoded text is not UTF-8: {0}")]
    InvalidUtf8(#[from] std::string::FromUtf8Error),
}

impl CodecError {
    /// Returns true for errors caused by a bad table rather than bad input.
    #[must_use]
    pub const fn is_configuration(&self) -> bool {
        matches!(
            self,
            Self::InvalidTableLength(_) | Self::DuplicateCharacter(_) | Self::PaddingInTable
        )
    }
}

/// Persisted codec settings: `{"use_custom": bool, "custom_table": string|null}`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CodecConfig {
    /// Whether a substitution table is active.
    pub use_custom: bool,
    /// The active table, if any.
    pub custom_table: Option<String>,
}

/// Encoder/decoder for message bodies.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Codec {
    table: Option<SubstitutionTable>,
}

impl Codec {
    /// A codec producing plain Base64.
    #[must_use]
    pub const fn standard() -> Self {
        Self { table: None }
    }

    /// A codec using a table given as a 64-character string.
    ///
    /// # Errors
    ///
    /// Returns a configuration error if the table is invalid.
    pub fn custom(table: &str) -> Result<Self, CodecError> {
        Ok(Self::with_table(table.parse()?))
    }

    /// A codec using an already validated table.
    #[must_use]
    pub const fn with_table(table: SubstitutionTable) -> Self {
        Self { table: Some(table) }
    }

    /// Checks if a substitution table is active.
    #[must_use]
    pub const fn is_custom(&self) -> bool {
        self.table.is_some()
    }

    /// The active table, if any.
    #[must_use]
    pub const fn table(&self) -> Option<&SubstitutionTable> {
        self.table.as_ref()
    }

    /// Encodes text as (optionally remapped) Base64 of its UTF-8 bytes.
    #[must_use]
    pub fn encode(&self, text: &str) -> String {
        let encoded = STANDARD.encode(text.as_bytes());
        let Some(table) = &self.table else {
            return encoded;
        };

        encoded
            .chars()
            .map(|c| {
                STANDARD_ALPHABET
                    .find(c)
                    .and_then(|index| table.char_at(index))
                    .unwrap_or(c)
            })
            .collect()
    }

    /// Decodes text produced by [`Codec::encode`] with the same table.
    ///
    /// Characters outside the table (such as `=`) pass through the reverse
    /// mapping unchanged; whitespace is ignored.
    ///
    /// # Errors
    ///
    /// Returns an error if the result is not valid Base64 or not UTF-8.
    pub fn decode(&self, encoded: &str) -> Result<String, CodecError> {
        let standard: String = encoded
            .chars()
            .map(|c| {
                self.table
                    .as_ref()
                    .and_then(|table| table.position(c))
                    .and_then(|index| STANDARD_ALPHABET.chars().nth(index))
                    .unwrap_or(c)
            })
            .filter(|c| !c.is_whitespace())
            .collect();

        let bytes = STANDARD.decode(standard)?;
        Ok(String::from_utf8(bytes)?)
    }

    /// Replaces the active table and switches to custom mode.
    ///
    /// The codec is left untouched if the new table is invalid.
    ///
    /// # Errors
    ///
    /// Returns a configuration error if the table is invalid.
    pub fn update_table(&mut self, table: &str) -> Result<(), CodecError> {
        let table = table.parse()?;
        self.table = Some(table);
        tracing::debug!("Codec table replaced");
        Ok(())
    }

    /// The active table as a string, or `None` in standard mode.
    #[must_use]
    pub fn export_table(&self) -> Option<String> {
        self.table.as_ref().map(ToString::to_string)
    }

    /// Exports the settings for persistence.
    #[must_use]
    pub fn to_config(&self) -> CodecConfig {
        CodecConfig {
            use_custom: self.is_custom(),
            custom_table: self.export_table(),
        }
    }

    /// Restores a codec from persisted settings.
    ///
    /// A stored table is ignored unless `use_custom` is set.
    ///
    /// # Errors
    ///
    /// Returns a configuration error if custom mode is set with a missing or
    /// invalid table.
    pub fn from_config(config: &CodecConfig) -> Result<Self, CodecError> {
        if !config.use_custom {
            return Ok(Self::standard());
        }
        match &config.custom_table {
            Some(table) => Self::custom(table),
            None => Err(CodecError::InvalidTableLength(0)),
        }
    }

    /// Adapter that encodes text when used as a [`TextTransform`].
    #[must_use]
    pub const fn encoder(&self) -> Encoder<'_> {
        Encoder(self)
    }

    /// Adapter that decodes text when used as a [`TextTransform`].
    #[must_use]
    pub const fn decoder(&self) -> Decoder<'_> {
        Decoder(self)
    }
}

/// Builds the codec selected by the user's settings.
///
/// Without custom mode no codec is used and bodies travel untouched. In custom
/// mode a non-empty shared secret yields the negotiated table; otherwise a
/// fresh random table is generated.
#[must_use]
pub fn create_codec(use_custom: bool, shared_secret: &str) -> Option<Codec> {
    if !use_custom {
        return None;
    }

    let table = if shared_secret.is_empty() {
        tracing::debug!("No shared secret, generating a random table");
        generate_table(None)
    } else {
        derive_table(shared_secret)
    };
    Some(Codec::with_table(table))
}

/// Encodes a body with the codec, or returns it unchanged without one.
#[must_use]
pub fn encode_body(body: &str, codec: Option<&Codec>) -> String {
    codec.map_or_else(|| body.to_string(), |c| c.encode(body))
}

/// Decodes a body with the codec, or returns it unchanged without one.
///
/// # Errors
///
/// Returns an error if the codec cannot decode the body.
pub fn decode_body(body: &str, codec: Option<&Codec>) -> Result<String, CodecError> {
    codec.map_or_else(|| Ok(body.to_string()), |c| c.decode(body))
}
