//! Account model types.

use super::provider::Provider;
use serde::{Deserialize, Serialize};

/// Security/encryption mode for connections.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum Security {
    /// No encryption (not recommended).
    None,
    /// Implicit TLS (connect directly with TLS).
    #[default]
    Tls,
    /// STARTTLS (STLS for POP3) upgrade after plaintext connect.
    StartTls,
}

impl Security {
    /// Get display name for the security mode.
    #[must_use]
    pub const fn display_name(&self) -> &'static str {
        match self {
            Self::None => "None (insecure)",
            Self::Tls => "SSL/TLS",
            Self::StartTls => "STARTTLS",
        }
    }
}

/// Connection settings for one mail server.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ServerConfig {
    /// Server hostname.
    pub host: String,
    /// Server port.
    pub port: u16,
    /// Security mode.
    #[serde(default)]
    pub security: Security,
    /// Username for authentication.
    pub username: String,
    /// Password or app-specific authorization code.
    pub password: String,
}

impl ServerConfig {
    /// Creates a config with empty credentials.
    #[must_use]
    pub fn new(host: impl Into<String>, port: u16, security: Security) -> Self {
        Self {
            host: host.into(),
            port,
            security,
            ..Self::default()
        }
    }

    /// Sets the credentials.
    #[must_use]
    pub fn with_credentials(mut self, username: impl Into<String>, password: impl Into<String>) -> Self {
        self.username = username.into();
        self.password = password.into();
        self
    }

    /// Default SMTP port for the security mode.
    #[must_use]
    pub const fn smtp_default_port(security: Security) -> u16 {
        match security {
            Security::None => 25,
            Security::StartTls => 587,
            Security::Tls => 465,
        }
    }

    /// Default POP3 port for the security mode.
    #[must_use]
    pub const fn pop3_default_port(security: Security) -> u16 {
        match security {
            Security::None | Security::StartTls => 110,
            Security::Tls => 995,
        }
    }
}

/// Email account configuration.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Account {
    /// Display name, unique among configured accounts.
    pub name: String,
    /// Email address.
    pub email: String,
    /// Submission server.
    pub smtp: ServerConfig,
    /// Mailbox server.
    pub pop3: ServerConfig,
}

impl Account {
    /// Create a new empty account.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Create account with the known provider's servers filled in.
    ///
    /// Unknown providers get empty hosts and the implicit TLS ports. Both
    /// usernames are set to the email address.
    #[must_use]
    pub fn with_email(email: &str) -> Self {
        let provider = Provider::detect(email);
        let (smtp_host, pop3_host) = provider
            .servers()
            .map_or(("", ""), |servers| (servers.smtp_host, servers.pop3_host));

        let mut account = Self {
            name: email.to_string(),
            email: email.to_string(),
            smtp: ServerConfig::new(
                smtp_host,
                ServerConfig::smtp_default_port(Security::Tls),
                Security::Tls,
            ),
            pop3: ServerConfig::new(
                pop3_host,
                ServerConfig::pop3_default_port(Security::Tls),
                Security::Tls,
            ),
        };

        account.smtp.username = email.to_string();
        account.pop3.username = email.to_string();
        account
    }

    /// Uses one password (or authorization code) for both servers.
    #[must_use]
    pub fn with_password(mut self, password: &str) -> Self {
        self.smtp.password = password.to_string();
        self.pop3.password = password.to_string();
        self
    }

    /// Provider detected from the email address.
    #[must_use]
    pub fn provider(&self) -> Provider {
        Provider::detect(&self.email)
    }
}
