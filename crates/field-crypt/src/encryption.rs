//! [`EncryptionCore`]: string-in, string-out field encryption under one held key.

use common::CryptoError;
use tracing::{debug, warn};
use zeroize::Zeroize;

use crate::crypto::{cipher, Envelope, Transformation};
use crate::key::{KeySource, KeyStore, SecretKey};

/// Lifecycle state of an [`EncryptionCore`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CoreState {
    /// Holds a key; encrypt and decrypt are accepted.
    Ready,
    /// Key dropped; every operation fails with [`CryptoError::KeyUnavailable`].
    Cleared,
}

/// Encrypts and decrypts individual text fields into storable strings.
///
/// Each instance exclusively owns its key. It is `Send + Sync`; share it
/// through an `Arc` to use it from several threads at once.
///
/// ```
/// use field_crypt::{EncryptionCore, SecretKey, StaticKeySource};
///
/// let source = StaticKeySource::new(SecretKey::generate().unwrap());
/// let core = EncryptionCore::new(&source).unwrap();
/// let stored = core.encrypt("grocery-note").unwrap();
/// assert_eq!(core.decrypt(&stored).unwrap(), "grocery-note");
/// ```
#[derive(Debug)]
pub struct EncryptionCore {
    keys: KeyStore,
    transformation: Transformation,
}

impl EncryptionCore {
    /// Build a core with the default [`Transformation`].
    ///
    /// # Errors
    ///
    /// Returns [`CryptoError::KeyUnavailable`] if `source` cannot produce a key
    /// of the right length.
    pub fn new(source: &dyn KeySource) -> Result<Self, CryptoError> {
        Self::with_transformation(source, Transformation::default())
    }

    /// Build a core that uses `transformation` for its whole lifetime.
    ///
    /// # Errors
    ///
    /// Returns [`CryptoError::KeyUnavailable`] if `source` cannot produce a key
    /// of the right length.
    pub fn with_transformation(
        source: &dyn KeySource,
        transformation: Transformation,
    ) -> Result<Self, CryptoError> {
        let key = source.fetch_key().map_err(|e| {
            warn!(error = %e, "key source returned no usable key");
            CryptoError::KeyUnavailable
        })?;
        Ok(Self::from_key(key, transformation))
    }

    /// Build a core around a key that has already been validated.
    pub fn from_key(key: SecretKey, transformation: Transformation) -> Self {
        debug!(%transformation, "encryption core ready");
        Self {
            keys: KeyStore::new(key),
            transformation,
        }
    }

    pub fn transformation(&self) -> Transformation {
        self.transformation
    }

    pub fn state(&self) -> CoreState {
        if self.keys.is_ready() {
            CoreState::Ready
        } else {
            CoreState::Cleared
        }
    }

    pub fn is_ready(&self) -> bool {
        self.state() == CoreState::Ready
    }

    /// Encrypt `plaintext` into an encoded envelope.
    ///
    /// The empty string maps to the empty string without touching the cipher.
    ///
    /// # Errors
    ///
    /// Returns [`CryptoError::KeyUnavailable`] after [`clear_key`](Self::clear_key),
    /// even for empty input, and [`CryptoError::ProviderError`] if the random
    /// source or cipher setup fails.
    pub fn encrypt(&self, plaintext: &str) -> Result<String, CryptoError> {
        let key = self.keys.current()?;
        if plaintext.is_empty() {
            return Ok(String::new());
        }
        let envelope = cipher::seal(key.expose(), self.transformation, plaintext.as_bytes())?;
        Ok(envelope.encode())
    }

    /// [`encrypt`](Self::encrypt) where an absent value behaves like `""`.
    pub fn encrypt_opt(&self, plaintext: Option<&str>) -> Result<String, CryptoError> {
        self.encrypt(plaintext.unwrap_or_default())
    }

    /// Decrypt an encoded envelope back into text.
    ///
    /// The empty string maps to the empty string.
    ///
    /// # Errors
    ///
    /// - [`CryptoError::KeyUnavailable`] after [`clear_key`](Self::clear_key).
    /// - [`CryptoError::MalformedEnvelope`] if `encoded` is not valid Base64.
    /// - [`CryptoError::EnvelopeTooShort`] if it decodes to too few bytes.
    /// - [`CryptoError::DecryptionFailed`] on wrong key, tampering, bad padding,
    ///   or a result that is not UTF-8.
    pub fn decrypt(&self, encoded: &str) -> Result<String, CryptoError> {
        let key = self.keys.current()?;
        if encoded.is_empty() {
            return Ok(String::new());
        }
        let envelope = Envelope::decode(encoded)?;
        let plaintext = cipher::open(key.expose(), self.transformation, &envelope)?;
        String::from_utf8(plaintext).map_err(|e| {
            e.into_bytes().zeroize();
            CryptoError::DecryptionFailed
        })
    }

    /// [`decrypt`](Self::decrypt) where an absent value behaves like `""`.
    pub fn decrypt_opt(&self, encoded: Option<&str>) -> Result<String, CryptoError> {
        self.decrypt(encoded.unwrap_or_default())
    }

    /// Drop the held key. Irreversible: the core stays [`CoreState::Cleared`].
    pub fn clear_key(&self) {
        if self.keys.clear() {
            debug!("encryption key cleared");
        }
    }
}
