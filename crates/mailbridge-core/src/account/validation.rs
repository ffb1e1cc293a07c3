//! Account validation.
//!
//! Every problem is collected so the caller can report them together.

use super::model::{Account, ServerConfig};
use super::provider::Provider;
use std::fmt;

/// The server of an account a problem concerns.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Protocol {
    /// Outgoing server.
    Smtp,
    /// Incoming server.
    Pop3,
}

impl fmt::Display for Protocol {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Smtp => "SMTP",
            Self::Pop3 => "POP3",
        })
    }
}

/// A problem with an account's configuration.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ValidationError {
    /// Account name is empty.
    #[error("Account name is required")]
    MissingName,

    /// Email address is empty or malformed.
    #[error("Invalid email address '{0}'")]
    InvalidEmail(String),

    /// Server host is empty.
    #[error("{0} server is required")]
    MissingHost(Protocol),

    /// Server port is zero.
    #[error("{0} port must be 1-65535")]
    InvalidPort(Protocol),

    /// Username or password is empty.
    #[error("{0} username and password are required")]
    MissingCredentials(Protocol),

    /// The SMTP username doubles as the `From` address and must be one.
    #[error("SMTP username '{0}' is not an email address")]
    InvalidSender(String),

    /// A server belongs to a different known provider than the address.
    #[error("{protocol} server {host} belongs to {server_provider}, not {provider}")]
    ProviderMismatch {
        /// Server concerned.
        protocol: Protocol,
        /// Configured host.
        host: String,
        /// Provider detected from the email address.
        provider: Provider,
        /// Provider that owns the host.
        server_provider: Provider,
    },
}

/// Result of validating an account.
pub type ValidationResult = Result<(), Vec<ValidationError>>;

/// Validates an account, collecting every problem.
///
/// # Errors
///
/// Returns all problems found, SMTP before POP3.
pub fn validate_account(account: &Account) -> ValidationResult {
    let mut errors = Vec::new();

    if account.name.trim().is_empty() {
        errors.push(ValidationError::MissingName);
    }
    if !is_valid_email(&account.email) {
        errors.push(ValidationError::InvalidEmail(account.email.clone()));
    }

    let provider = account.provider();
    check_server(Protocol::Smtp, &account.smtp, provider, &mut errors);
    check_server(Protocol::Pop3, &account.pop3, provider, &mut errors);

    let sender = account.smtp.username.trim();
    if !sender.is_empty() && !is_valid_email(sender) {
        errors.push(ValidationError::InvalidSender(sender.to_string()));
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

fn check_server(
    protocol: Protocol,
    server: &ServerConfig,
    provider: Provider,
    errors: &mut Vec<ValidationError>,
) {
    let host = server.host.trim();
    if host.is_empty() {
        errors.push(ValidationError::MissingHost(protocol));
    } else if provider != Provider::Custom
        && let Some(server_provider) = Provider::serving(host)
        && server_provider != provider
    {
        errors.push(ValidationError::ProviderMismatch {
            protocol,
            host: host.to_string(),
            provider,
            server_provider,
        });
    }

    if server.port == 0 {
        errors.push(ValidationError::InvalidPort(protocol));
    }
    if server.username.trim().is_empty() || server.password.is_empty() {
        errors.push(ValidationError::MissingCredentials(protocol));
    }
}

/// Checks for `local@domain.tld` with exactly one `@` and no empty labels.
#[must_use]
pub fn is_valid_email(email: &str) -> bool {
    let Some((local, domain)) = email.trim().split_once('@') else {
        return false;
    };

    !local.is_empty()
        && !domain.contains('@')
        && domain.contains('.')
        && domain.split('.').all(|label| !label.is_empty())
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn email_shapes() {
        assert!(is_valid_email("user@example.com"));
        assert!(is_valid_email("user.name@sub.example.com"));
        for bad in ["", "user", "@example.com", "user@", "user@example", "user@@example.com"] {
            assert!(!is_valid_email(bad), "{bad}");
        }
    }

    #[test]
    fn empty_account_reports_every_problem() {
        let errors = validate_account(&Account::new()).unwrap_err();
        assert_eq!(errors[0], ValidationError::MissingName);
        assert_eq!(errors[1], ValidationError::InvalidEmail(String::new()));
        assert!(errors.contains(&ValidationError::MissingHost(Protocol::Pop3)));
        assert!(errors.contains(&ValidationError::InvalidPort(Protocol::Smtp)));
        assert!(errors.contains(&ValidationError::MissingCredentials(Protocol::Pop3)));
    }

    #[test]
    fn known_provider_needs_only_password() {
        let account = Account::with_email("test@qq.com");
        assert_eq!(
            validate_account(&account).unwrap_err(),
            vec![
                ValidationError::MissingCredentials(Protocol::Smtp),
                ValidationError::MissingCredentials(Protocol::Pop3),
            ]
        );
        assert!(validate_account(&account.with_password("secret")).is_ok());
    }

    #[test]
    fn custom_provider_needs_hosts() {
        let account = Account::with_email("me@example.org").with_password("pw");
        let errors = validate_account(&account).unwrap_err();
        assert_eq!(
            errors,
            vec![
                ValidationError::MissingHost(Protocol::Smtp),
                ValidationError::MissingHost(Protocol::Pop3)
            ]
        );
        assert_eq!(errors[1].to_string(), "POP3 server is required");
    }

    #[test]
    fn server_of_another_provider_is_flagged() {
        let mut account = Account::with_email("me@qq.com").with_password("code");
        account.pop3.host = "pop.163.com".into();

        let errors = validate_account(&account).unwrap_err();
        assert_eq!(
            errors,
            vec![ValidationError::ProviderMismatch {
                protocol: Protocol::Pop3,
                host: "pop.163.com".into(),
                provider: Provider::Qq,
                server_provider: Provider::Netease163,
            }]
        );
        assert_eq!(
            errors[0].to_string(),
            "POP3 server pop.163.com belongs to 163, not qq"
        );
    }

    #[test]
    fn custom_domains_may_use_any_server() {
        let mut account = Account::with_email("me@company.example").with_password("pw");
        account.smtp.host = "smtp.gmail.com".into();
        account.pop3.host = "pop.gmail.com".into();
        assert!(validate_account(&account).is_ok());

        let mut relay = Account::with_email("me@qq.com").with_password("code");
        relay.smtp.host = "relay.internal".into();
        assert!(validate_account(&relay).is_ok());
    }

    #[test]
    fn smtp_username_must_be_an_address() {
        let mut account = Account::with_email("me@qq.com").with_password("code");
        account.smtp.username = "me".into();
        assert_eq!(
            validate_account(&account).unwrap_err(),
            vec![ValidationError::InvalidSender("me".into())]
        );
    }
}
