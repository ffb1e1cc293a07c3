//! Body transform hooks.

use super::Codec;

/// Error returned by a failing transform.
pub type TransformError = Box<dyn std::error::Error + Send + Sync>;

/// A `text -> text` function applied to a message body before sending or
/// after retrieval.
///
/// Closures of the right shape implement it directly:
///
/// ```
/// use mailbridge_core::codec::{TextTransform, TransformError};
///
/// let upper = |text: &str| -> Result<String, TransformError> { Ok(text.to_uppercase()) };
/// assert_eq!(upper.apply("hi").unwrap(), "HI");
/// ```
pub trait TextTransform {
    /// Transforms the text.
    ///
    /// # Errors
    ///
    /// Returns an error if the text cannot be transformed.
    fn apply(&self, text: &str) -> Result<String, TransformError>;
}

impl<F> TextTransform for F
where
    F: Fn(&str) -> Result<String, TransformError>,
{
    fn apply(&self, text: &str) -> Result<String, TransformError> {
        self(text)
    }
}

/// Transform that encodes with a [`Codec`].
#[derive(Debug, Clone, Copy)]
pub struct Encoder<'a>(pub(super) &'a Codec);

impl TextTransform for Encoder<'_> {
    fn apply(&self, text: &str) -> Result<String, TransformError> {
        Ok(self.0.encode(text))
    }
}

/// Transform that decodes with a [`Codec`].
#[derive(Debug, Clone, Copy)]
pub struct Decoder<'a>(pub(super) &'a Codec);

impl TextTransform for Decoder<'_> {
    fn apply(&self, text: &str) -> Result<String, TransformError> {
        Ok(self.0.decode(text)?)
    }
}
