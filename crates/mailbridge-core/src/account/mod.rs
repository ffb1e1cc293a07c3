//! Account management module.
//!
//! Provides account configuration, provider detection, and validation.

mod model;
mod provider;
mod validation;

pub use model::{Account, Security, ServerConfig};
pub use provider::{Provider, ProviderServers};
pub use validation::{Protocol, ValidationError, ValidationResult, is_valid_email, validate_account};
