//! Configuration for building a [`Signing`](crate::signing::Signing) context.
//!
//! Settings are read from a TOML document and merged with environment
//! variables prefixed with `MAPLETREE__`. For example,
//! `MAPLETREE__SIGNING__SECRET_KEY` overrides `signing.secret_key` and
//! `MAPLETREE__SIGNING__HASH_ALGORITHM` overrides `signing.hash_algorithm`.
//!
//! ```toml
//! [signing]
//! secret_key = "change-me"
//! hash_algorithm = "sha256"
//! ```

use core::fmt;

use config::{Config, Environment, File, FileFormat};
use error_stack::{Report, ResultExt};
use serde::Deserialize;
use validator::Validate;

use crate::error::SigningError;
use crate::hash::HashAlgorithm;

/// Prefix for environment variable overrides.
pub const ENVIRONMENT_VARIABLE_PREFIX: &str = "MAPLETREE";

/// Separator between nested keys in environment variable names.
pub const ENVIRONMENT_VARIABLE_SEPARATOR: &str = "__";

#[derive(Clone, Deserialize, Validate)]
pub struct SigningSettings {
    #[validate(length(min = 1))]
    pub secret_key: String,
    #[serde(default)]
    pub hash_algorithm: HashAlgorithm,
}

impl fmt::Debug for SigningSettings {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SigningSettings")
            .field("secret_key", &"[REDACTED]")
            .field("hash_algorithm", &self.hash_algorithm)
            .finish()
    }
}

#[derive(Debug, Clone, Deserialize, Validate)]
pub struct Settings {
    #[validate(nested)]
    pub signing: SigningSettings,
}

impl Settings {
    /// Parse settings from a TOML string, applying environment overrides.
    ///
    /// # Errors
    ///
    /// Returns [`SigningError::Configuration`] if the TOML cannot be parsed,
    /// a required field is missing, or validation fails.
    pub fn from_toml(toml_str: &str) -> Result<Self, Report<SigningError>> {
        let environment = Environment::default()
            .prefix(ENVIRONMENT_VARIABLE_PREFIX)
            .separator(ENVIRONMENT_VARIABLE_SEPARATOR);

        let toml = File::from_str(toml_str, FileFormat::Toml);
        let config = Config::builder()
            .add_source(toml)
            .add_source(environment)
            .build()
            .change_context(SigningError::Configuration {
                message: "Failed to build configuration".into(),
            })?;

        let settings: Self = config
            .try_deserialize()
            .change_context(SigningError::Configuration {
                message: "Failed to deserialize configuration".into(),
            })?;

        settings
            .validate()
            .change_context(SigningError::Configuration {
                message: "Settings validation failed".into(),
            })?;

        log::debug!(
            "Loaded signing settings (hash algorithm: {})",
            settings.signing.hash_algorithm
        );

        Ok(settings)
    }
}
