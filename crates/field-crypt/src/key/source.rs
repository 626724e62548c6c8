//! Where an [`EncryptionCore`](crate::EncryptionCore) gets its key from.

use std::{
    fs,
    io::{self, Write},
    path::{Path, PathBuf},
};

use thiserror::Error;
use tracing::info;
use zeroize::Zeroizing;

use super::SecretKey;
use crate::crypto::KEY_LEN;

/// Errors produced while fetching a key.
#[derive(Debug, Error)]
pub enum KeySourceError {
    /// The source has no key to give.
    #[error("no key found at {0}")]
    Missing(String),

    /// The stored key is not valid Base64.
    #[error("stored key is not valid base64")]
    Malformed,

    /// The decoded key material has an unexpected length.
    #[error("key has invalid length: expected {KEY_LEN} bytes, got {0}")]
    InvalidLength(usize),

    /// The OS random source failed while generating a key.
    #[error("random source unavailable: {0}")]
    Random(#[from] rand::Error),

    /// Reading or writing the key file failed.
    #[error("key file I/O failed: {0}")]
    Io(#[from] io::Error),
}

/// Synchronous, on-demand supplier of exactly one [`SecretKey`].
#[cfg_attr(test, mockall::automock)]
pub trait KeySource: Send + Sync {
    /// Fetch the key.
    ///
    /// # Errors
    ///
    /// Returns a [`KeySourceError`] if no usable key can be produced.
    fn fetch_key(&self) -> Result<SecretKey, KeySourceError>;
}

/// A key already held in memory.
#[derive(Debug, Clone)]
pub struct StaticKeySource {
    key: SecretKey,
}

impl StaticKeySource {
    pub fn new(key: SecretKey) -> Self {
        Self { key }
    }
}

impl KeySource for StaticKeySource {
    fn fetch_key(&self) -> Result<SecretKey, KeySourceError> {
        Ok(self.key.clone())
    }
}

/// Reads a standard Base64 key from an environment variable.
#[derive(Debug, Clone)]
pub struct EnvKeySource {
    var: String,
}

impl EnvKeySource {
    pub fn new(var: impl Into<String>) -> Self {
        Self { var: var.into() }
    }
}

impl KeySource for EnvKeySource {
    fn fetch_key(&self) -> Result<SecretKey, KeySourceError> {
        match std::env::var(&self.var) {
            Ok(value) => SecretKey::from_base64(&Zeroizing::new(value)),
            Err(std::env::VarError::NotPresent) => {
                Err(KeySourceError::Missing(format!("${}", self.var)))
            }
            Err(std::env::VarError::NotUnicode(_)) => Err(KeySourceError::Malformed),
        }
    }
}

/// Reads a standard Base64 key from a file.
///
/// With `create_if_missing`, the first fetch on a missing path generates a new
/// key and writes it there (mode `0600` on Unix); later fetches read it back.
#[derive(Debug, Clone)]
pub struct FileKeySource {
    path: PathBuf,
    create_if_missing: bool,
}

impl FileKeySource {
    pub fn new(path: impl Into<PathBuf>, create_if_missing: bool) -> Self {
        Self {
            path: path.into(),
            create_if_missing,
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn read(&self) -> Result<SecretKey, KeySourceError> {
        let contents = Zeroizing::new(fs::read_to_string(&self.path)?);
        SecretKey::from_base64(&contents)
    }

    /// Generate a key and publish it at `path` in one step.
    ///
    /// The key is written and synced to a sibling temporary file (mode `0600`
    /// on Unix) which is then renamed into place without clobbering. Readers
    /// never observe a partially written key file, and a failed write leaves
    /// nothing behind.
    fn create(&self) -> Result<SecretKey, KeySourceError> {
        let key = SecretKey::generate()?;
        let dir = match self.path.parent() {
            Some(p) if !p.as_os_str().is_empty() => p,
            _ => Path::new("."),
        };
        let mut staged = tempfile::Builder::new()
            .prefix(".field-crypt-key-")
            .tempfile_in(dir)?;
        staged.write_all(key.to_base64().as_bytes())?;
        staged.write_all(b"\n")?;
        staged.as_file().sync_all()?;

        match staged.persist_noclobber(&self.path) {
            Ok(_) => {
                info!(path = %self.path.display(), "generated new key file");
                Ok(key)
            }
            // Another process won the race; use its key.
            Err(e) if e.error.kind() == io::ErrorKind::AlreadyExists => self.read(),
            Err(e) => Err(e.error.into()),
        }
    }
}

impl KeySource for FileKeySource {
    fn fetch_key(&self) -> Result<SecretKey, KeySourceError> {
        match self.read() {
            Err(KeySourceError::Io(e)) if e.kind() == io::ErrorKind::NotFound => {
                if self.create_if_missing {
                    self.create()
                } else {
                    Err(KeySourceError::Missing(self.path.display().to_string()))
                }
            }
            other => other,
        }
    }
}
