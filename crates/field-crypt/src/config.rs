//! Configuration loading and validation for the `field-crypt` binary.
//!
//! All values are read from `FIELD_CRYPT_*` environment variables at startup.
//! The process exits with a clear error message if any value is invalid.

use anyhow::{Context, Result};
use serde::Deserialize;

use crate::crypto::Transformation;
use crate::key::{EnvKeySource, FileKeySource, KeySource};

/// Validated `field-crypt` configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    /// Where the key comes from: `"env"` or `"file"`.
    #[serde(default = "default_key_source")]
    pub key_source: String,

    /// Environment variable holding the Base64 key when `key_source = "env"`.
    #[serde(default = "default_key_env_var")]
    pub key_env_var: String,

    /// Path of the Base64 key file when `key_source = "file"`.
    #[serde(default = "default_key_file")]
    pub key_file: String,

    /// Generate and write a key file if none exists yet.
    #[serde(default)]
    pub create_key_if_missing: bool,

    /// Cipher construction, e.g. `"aes-256-cbc-hmac-sha256"`.
    #[serde(default = "default_transformation")]
    pub transformation: String,

    /// Tracing log level (e.g. `"info"`, `"debug"`).
    #[serde(default = "default_log_level")]
    pub log_level: String,
}

fn default_key_source() -> String {
    "file".into()
}
fn default_key_env_var() -> String {
    "FIELD_ENCRYPTION_KEY".into()
}
fn default_key_file() -> String {
    "field-crypt.key".into()
}
fn default_transformation() -> String {
    Transformation::default().as_str().into()
}
fn default_log_level() -> String {
    "info".into()
}

impl Default for Config {
    fn default() -> Self {
        Self {
            key_source: default_key_source(),
            key_env_var: default_key_env_var(),
            key_file: default_key_file(),
            create_key_if_missing: false,
            transformation: default_transformation(),
            log_level: default_log_level(),
        }
    }
}

impl Config {
    /// Load and validate configuration from `FIELD_CRYPT_*` environment variables.
    ///
    /// # Errors
    ///
    /// Returns an error if a variable cannot be parsed or fails validation.
    pub fn from_env() -> Result<Self> {
        let cfg = config::Config::builder()
            .add_source(config::Environment::with_prefix("FIELD_CRYPT"))
            .build()
            .context("failed to build configuration from environment")?;

        let c: Config = cfg
            .try_deserialize()
            .context("failed to deserialise configuration")?;

        c.validate()?;
        Ok(c)
    }

    /// The configured transformation.
    pub fn transformation(&self) -> Result<Transformation> {
        self.transformation
            .parse()
            .context("FIELD_CRYPT_TRANSFORMATION is not a supported transformation")
    }

    /// Build the configured key source.
    pub fn build_key_source(&self) -> Result<Box<dyn KeySource>> {
        match self.key_source.trim() {
            "env" => Ok(Box::new(EnvKeySource::new(self.key_env_var.clone()))),
            "file" => Ok(Box::new(FileKeySource::new(
                self.key_file.clone(),
                self.create_key_if_missing,
            ))),
            other => anyhow::bail!("FIELD_CRYPT_KEY_SOURCE must be \"env\" or \"file\", got {other:?}"),
        }
    }

    /// Validate all fields, returning a descriptive error on the first failure.
    fn validate(&self) -> Result<()> {
        match self.key_source.trim() {
            "env" => ensure_non_empty(&self.key_env_var, "FIELD_CRYPT_KEY_ENV_VAR")?,
            "file" => ensure_non_empty(&self.key_file, "FIELD_CRYPT_KEY_FILE")?,
            other => anyhow::bail!("FIELD_CRYPT_KEY_SOURCE must be \"env\" or \"file\", got {other:?}"),
        }
        self.transformation()?;
        Ok(())
    }
}

fn ensure_non_empty(value: &str, name: &str) -> Result<()> {
    if value.trim().is_empty() {
        anyhow::bail!("{name} is required and must not be empty");
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_correct() {
        let cfg = Config::default();
        assert_eq!(cfg.key_source, "file");
        assert_eq!(cfg.key_env_var, "FIELD_ENCRYPTION_KEY");
        assert_eq!(cfg.key_file, "field-crypt.key");
        assert!(!cfg.create_key_if_missing);
        assert_eq!(cfg.transformation, "aes-256-cbc-hmac-sha256");
        assert_eq!(cfg.log_level, "info");
        assert!(cfg.validate().is_ok());
    }

    #[test]
    fn validate_rejects_unknown_key_source() {
        let cfg = Config {
            key_source: "keychain".into(),
            ..Config::default()
        };
        assert!(cfg.validate().is_err());
        assert!(cfg.build_key_source().is_err());
    }

    #[test]
    fn validate_rejects_empty_key_file() {
        let cfg = Config {
            key_file: "  ".into(),
            ..Config::default()
        };
        assert!(cfg.validate().is_err());
    }

    #[test]
    fn validate_rejects_unknown_transformation() {
        let cfg = Config {
            transformation: "rot13".into(),
            ..Config::default()
        };
        assert!(cfg.validate().is_err());
    }

    #[test]
    fn legacy_transformation_parses() {
        let cfg = Config {
            transformation: "aes-256-cbc".into(),
            ..Config::default()
        };
        assert_eq!(cfg.transformation().unwrap(), Transformation::Aes256CbcPkcs7);
    }

    #[test]
    fn env_source_is_built() {
        let cfg = Config {
            key_source: "env".into(),
            key_env_var: "FIELD_CRYPT_TEST_CONFIG_UNSET".into(),
            ..Config::default()
        };
        assert!(cfg.validate().is_ok());
        let source = cfg.build_key_source().unwrap();
        // Variable is unset, so the source exists but has nothing to give.
        assert!(source.fetch_key().is_err());
    }

    #[test]
    fn deserialises_from_config_values() {
        let c: Config = config::Config::builder()
            .set_override("key_source", "env")
            .unwrap()
            .set_override("create_key_if_missing", true)
            .unwrap()
            .build()
            .unwrap()
            .try_deserialize()
            .unwrap();
        assert_eq!(c.key_source, "env");
        assert!(c.create_key_if_missing);
        assert_eq!(c.key_file, "field-crypt.key");
    }
}
