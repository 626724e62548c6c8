//! Key material, the key store, and the sources a key can be fetched from.
//!
//! # Lifecycle
//!
//! 1. At construction, [`EncryptionCore`](crate::EncryptionCore) asks a
//!    [`KeySource`] for exactly one [`SecretKey`].
//! 2. The key lives in a [`KeyStore`] owned by that core for its lifetime.
//! 3. Each encrypt/decrypt call takes a short-lived snapshot of the key.
//! 4. Clearing the store drops the key; the bytes are zeroed once the last
//!    in-flight snapshot is released.
//!
//! # Security invariants
//!
//! - Key bytes are **never** logged, printed by `Debug`, or serialised by the core.

pub mod source;
pub mod store;

pub use source::{EnvKeySource, FileKeySource, KeySource, KeySourceError, StaticKeySource};
pub use store::KeyStore;

use base64::{engine::general_purpose::STANDARD, Engine as _};
use rand::{rngs::OsRng, RngCore};
use zeroize::{Zeroize, ZeroizeOnDrop, Zeroizing};

use crate::crypto::KEY_LEN;

/// Fixed-size AES-256 key.
///
/// The memory is overwritten with zeroes when this value is dropped.
#[derive(Clone, Zeroize, ZeroizeOnDrop)]
pub struct SecretKey([u8; KEY_LEN]);

impl SecretKey {
    /// Copy key material out of a slice.
    ///
    /// # Errors
    ///
    /// Returns [`KeySourceError::InvalidLength`] unless `bytes` is exactly
    /// [`KEY_LEN`] bytes.
    pub fn from_slice(bytes: &[u8]) -> Result<Self, KeySourceError> {
        if bytes.len() != KEY_LEN {
            return Err(KeySourceError::InvalidLength(bytes.len()));
        }
        let mut key = [0u8; KEY_LEN];
        key.copy_from_slice(bytes);
        Ok(Self(key))
    }

    /// Parse a standard Base64 key, ignoring surrounding whitespace.
    pub fn from_base64(encoded: &str) -> Result<Self, KeySourceError> {
        let bytes = Zeroizing::new(
            STANDARD
                .decode(encoded.trim())
                .map_err(|_| KeySourceError::Malformed)?,
        );
        Self::from_slice(&bytes)
    }

    /// Draw a fresh key from the OS CSPRNG.
    pub fn generate() -> Result<Self, KeySourceError> {
        let mut key = Self([0u8; KEY_LEN]);
        OsRng.try_fill_bytes(&mut key.0)?;
        Ok(key)
    }

    /// Standard Base64 form, for writing a key file or handing to an operator.
    pub fn to_base64(&self) -> Zeroizing<String> {
        Zeroizing::new(STANDARD.encode(&self.0))
    }

    pub(crate) fn expose(&self) -> &[u8; KEY_LEN] {
        &self.0
    }
}

impl std::fmt::Debug for SecretKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        // Never print key material, even in debug builds.
        f.write_str("SecretKey([REDACTED])")
    }
}
