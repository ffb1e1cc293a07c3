//! Persistent application configuration.
//!
//! Stored as pretty JSON at `<config dir>/mailbridge/config.json`.

use mailbridge_core::{Account, Error, Result, Settings, validate_account};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Accounts, current account, and settings.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    /// Configured accounts, in insertion order.
    pub accounts: Vec<Account>,
    /// Name of the account used when none is given.
    pub current_account: Option<String>,
    /// User settings.
    pub settings: Settings,
}

impl AppConfig {
    /// Default location of the configuration file.
    pub fn default_path() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("mailbridge")
            .join("config.json")
    }

    /// Loads the configuration, falling back to defaults if the file is
    /// missing or unreadable.
    pub async fn load(path: &Path) -> Self {
        if !path.exists() {
            return Self::default();
        }

        let loaded = match tokio::fs::read_to_string(path).await {
            Ok(contents) => serde_json::from_str(&contents).map_err(Error::from),
            Err(e) => Err(Error::from(e)),
        };
        loaded.unwrap_or_else(|e| {
            tracing::warn!(path = %path.display(), error = %e, "Failed to load config, using defaults");
            Self::default()
        })
    }

    /// Writes the configuration, creating parent directories.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be written.
    pub async fn save(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent()
            && !parent.as_os_str().is_empty()
        {
            tokio::fs::create_dir_all(parent).await?;
        }
        let contents = serde_json::to_string_pretty(self)?;
        tokio::fs::write(path, contents).await?;

        tracing::debug!(path = %path.display(), "Config saved");
        Ok(())
    }

    /// Adds an account; the first account becomes current.
    ///
    /// # Errors
    ///
    /// Returns an error if the account is incomplete or its name is taken.
    pub fn add_account(&mut self, account: Account) -> Result<()> {
        validate(&account)?;
        if self.accounts.iter().any(|a| a.name == account.name) {
            return Err(Error::Config(format!(
                "Account '{}' already exists",
                account.name
            )));
        }

        if self.accounts.is_empty() {
            self.current_account = Some(account.name.clone());
        }
        self.accounts.push(account);
        Ok(())
    }

    /// Removes an account. If it was current, the first remaining account
    /// becomes current.
    ///
    /// # Errors
    ///
    /// Returns an error if no account has that name.
    pub fn remove_account(&mut self, name: &str) -> Result<()> {
        let index = self.position(name)?;
        self.accounts.remove(index);

        if self.current_account.as_deref() == Some(name) {
            self.current_account = self.accounts.first().map(|a| a.name.clone());
        }
        Ok(())
    }

    /// Gets an account by name, or the current account.
    pub fn account(&self, name: Option<&str>) -> Option<&Account> {
        let name = name.or(self.current_account.as_deref())?;
        self.accounts.iter().find(|a| a.name == name)
    }

    /// Names of all accounts.
    pub fn account_names(&self) -> Vec<&str> {
        self.accounts.iter().map(|a| a.name.as_str()).collect()
    }

    /// Makes an account current.
    ///
    /// # Errors
    ///
    /// Returns an error if no account has that name.
    pub fn set_current(&mut self, name: &str) -> Result<()> {
        self.position(name)?;
        self.current_account = Some(name.to_string());
        Ok(())
    }

    /// Replaces an account, following a rename in the current account.
    ///
    /// # Errors
    ///
    /// Returns an error if no account has that name or the new data is invalid.
    pub fn update_account(&mut self, name: &str, account: Account) -> Result<()> {
        let index = self.position(name)?;
        validate(&account)?;
        if account.name != name && self.accounts.iter().any(|a| a.name == account.name) {
            return Err(Error::Config(format!(
                "Account '{}' already exists",
                account.name
            )));
        }

        if self.current_account.as_deref() == Some(name) {
            self.current_account = Some(account.name.clone());
        }
        self.accounts[index] = account;
        Ok(())
    }

    fn position(&self, name: &str) -> Result<usize> {
        self.accounts
            .iter()
            .position(|a| a.name == name)
            .ok_or_else(|| Error::AccountNotFound(name.to_string()))
    }
}

fn validate(account: &Account) -> Result<()> {
    validate_account(account).map_err(|errors| {
        Error::Config(
            errors
                .iter()
                .map(ToString::to_string)
                .collect::<Vec<_>>()
                .join("; "),
        )
    })
}
