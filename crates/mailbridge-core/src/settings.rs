//! Application settings consumed by the mail clients.

use crate::codec::{Codec, create_codec};
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Lowest accepted `max_messages`.
pub const MIN_MESSAGES: usize = 1;
/// Highest accepted `max_messages`.
pub const MAX_MESSAGES: usize = 1000;

/// Invalid settings value.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SettingsError {
    /// `max_messages` outside 1..=1000.
    #[error("max_messages must be between {MIN_MESSAGES} and {MAX_MESSAGES}, got {0}")]
    MaxMessagesOutOfRange(usize),

    /// `receive_interval` of zero.
    #[error("receive_interval must be at least one second")]
    ZeroInterval,

    /// Unknown key passed to [`Settings::set`].
    #[error("Unknown setting: {0}")]
    UnknownKey(String),

    /// Value that does not parse for its key.
    #[error("Invalid value {value:?} for {key}")]
    InvalidValue {
        /// Setting name.
        key: String,
        /// Rejected value.
        value: String,
    },
}

/// User settings.
///
/// Older configuration files use `max_emails` and `use_custom_encoder`;
/// both names are accepted when reading.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    /// Poll the mailbox periodically.
    pub auto_receive: bool,
    /// Seconds between polls.
    pub receive_interval: u64,
    /// Messages fetched per listing.
    #[serde(alias = "max_emails")]
    pub max_messages: usize,
    /// Encode bodies with a substitution table.
    #[serde(alias = "use_custom_encoder")]
    pub use_custom_codec: bool,
    /// Secret the table is derived from.
    pub shared_secret: String,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            auto_receive: false,
            receive_interval: 300,
            max_messages: 50,
            use_custom_codec: false,
            shared_secret: String::new(),
        }
    }
}

impl Settings {
    /// Names accepted by [`Settings::set`].
    pub const KEYS: [&'static str; 5] = [
        "auto_receive",
        "receive_interval",
        "max_messages",
        "use_custom_codec",
        "shared_secret",
    ];

    /// Checks value ranges.
    ///
    /// # Errors
    ///
    /// Returns the first out-of-range value found.
    pub fn validate(&self) -> Result<(), SettingsError> {
        if self.max_messages < MIN_MESSAGES || self.max_messages > MAX_MESSAGES {
            return Err(SettingsError::MaxMessagesOutOfRange(self.max_messages));
        }
        if self.receive_interval == 0 {
            return Err(SettingsError::ZeroInterval);
        }
        Ok(())
    }

    /// Poll interval as a duration.
    #[must_use]
    pub const fn receive_interval(&self) -> Duration {
        Duration::from_secs(self.receive_interval)
    }

    /// Codec selected by these settings, if any.
    ///
    /// Custom mode without a shared secret yields a random table, so two
    /// calls then disagree.
    #[must_use]
    pub fn codec(&self) -> Option<Codec> {
        create_codec(self.use_custom_codec, &self.shared_secret)
    }

    /// Sets one value from its textual form, then validates.
    ///
    /// The settings are unchanged if the key is unknown or the value is
    /// rejected.
    ///
    /// # Errors
    ///
    /// Returns an error for unknown keys and invalid or out-of-range values.
    pub fn set(&mut self, key: &str, value: &str) -> Result<(), SettingsError> {
        let invalid = || SettingsError::InvalidValue {
            key: key.to_string(),
            value: value.to_string(),
        };

        let mut updated = self.clone();
        match key {
            "auto_receive" => updated.auto_receive = value.parse().map_err(|_| invalid())?,
            "receive_interval" => updated.receive_interval = value.parse().map_err(|_| invalid())?,
            "max_messages" | "max_emails" => {
                updated.max_messages = value.parse().map_err(|_| invalid())?;
            }
            "use_custom_codec" | "use_custom_encoder" => {
                updated.use_custom_codec = value.parse().map_err(|_| invalid())?;
            }
            "shared_secret" => updated.shared_secret = value.to_string(),
            _ => return Err(SettingsError::UnknownKey(key.to_string())),
        }

        updated.validate()?;
        *self = updated;
        Ok(())
    }
}
