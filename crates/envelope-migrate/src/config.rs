//! Configuration loading and validation for the migration tool.

use anyhow::{Context, Result};
use field_crypt::Transformation;
use serde::Deserialize;

/// Validated envelope-migrate configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    /// JSON-lines file of `{"id", "value"}` records to read. **Required.**
    pub input_path: String,

    /// Where rewritten records are written. **Required.**
    pub output_path: String,

    /// Base64 key file shared by the source and target formats. **Required.**
    pub key_file: String,

    /// Transformation the stored values were written with.
    #[serde(default = "default_source_transformation")]
    pub source_transformation: String,

    /// Transformation to re-encrypt into.
    #[serde(default = "default_target_transformation")]
    pub target_transformation: String,

    /// Tracing log level.
    #[serde(default = "default_log_level")]
    pub log_level: String,
}

fn default_source_transformation() -> String {
    Transformation::Aes256CbcPkcs7.as_str().into()
}
fn default_target_transformation() -> String {
    Transformation::Aes256CbcPkcs7HmacSha256.as_str().into()
}
fn default_log_level() -> String {
    "info".into()
}

impl Config {
    /// Load and validate configuration from `ENVELOPE_MIGRATE_*` environment variables.
    pub fn from_env() -> Result<Self> {
        let cfg = config::Config::builder()
            .add_source(config::Environment::with_prefix("ENVELOPE_MIGRATE"))
            .build()
            .context("failed to build envelope-migrate configuration")?;

        let c: Config = cfg
            .try_deserialize()
            .context("failed to deserialise envelope-migrate configuration")?;

        c.validate()?;
        Ok(c)
    }

    pub fn source_transformation(&self) -> Result<Transformation> {
        self.source_transformation
            .parse()
            .context("ENVELOPE_MIGRATE_SOURCE_TRANSFORMATION is not supported")
    }

    pub fn target_transformation(&self) -> Result<Transformation> {
        self.target_transformation
            .parse()
            .context("ENVELOPE_MIGRATE_TARGET_TRANSFORMATION is not supported")
    }

    fn validate(&self) -> Result<()> {
        if self.input_path.trim().is_empty() {
            anyhow::bail!("ENVELOPE_MIGRATE_INPUT_PATH is required and must not be empty");
        }
        if self.output_path.trim().is_empty() {
            anyhow::bail!("ENVELOPE_MIGRATE_OUTPUT_PATH is required and must not be empty");
        }
        if self.input_path.trim() == self.output_path.trim() {
            anyhow::bail!("ENVELOPE_MIGRATE_OUTPUT_PATH must differ from the input path");
        }
        if self.key_file.trim().is_empty() {
            anyhow::bail!("ENVELOPE_MIGRATE_KEY_FILE is required and must not be empty");
        }
        self.source_transformation()?;
        self.target_transformation()?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn valid() -> Config {
        Config {
            input_path: "fields.jsonl".into(),
            output_path: "fields.migrated.jsonl".into(),
            key_file: "field-crypt.key".into(),
            source_transformation: default_source_transformation(),
            target_transformation: default_target_transformation(),
            log_level: default_log_level(),
        }
    }

    #[test]
    fn defaults() {
        assert_eq!(default_source_transformation(), "aes-256-cbc");
        assert_eq!(default_target_transformation(), "aes-256-cbc-hmac-sha256");
        assert_eq!(default_log_level(), "info");
    }

    #[test]
    fn validate_accepts_valid_config() {
        assert!(valid().validate().is_ok());
    }

    #[test]
    fn validate_rejects_same_input_and_output() {
        let cfg = Config {
            output_path: "fields.jsonl".into(),
            ..valid()
        };
        assert!(cfg.validate().is_err());
    }

    #[test]
    fn validate_rejects_empty_key_file() {
        let cfg = Config {
            key_file: " ".into(),
            ..valid()
        };
        assert!(cfg.validate().is_err());
    }

    #[test]
    fn validate_rejects_unknown_transformation() {
        let cfg = Config {
            target_transformation: "aes-256-ecb".into(),
            ..valid()
        };
        assert!(cfg.validate().is_err());
    }
}
