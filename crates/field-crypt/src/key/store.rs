//! [`KeyStore`]: the held key of one encryption core.

use std::sync::Arc;

use arc_swap::ArcSwapOption;
use common::CryptoError;

use super::SecretKey;

/// Holds the key of one [`EncryptionCore`](crate::EncryptionCore).
///
/// Backed by [`ArcSwapOption`] so that:
/// - Concurrent encrypt/decrypt calls take lock-free snapshots of the key.
/// - [`KeyStore::clear`] atomically swaps in `None`. A call sees either the
///   whole key or no key, never a partially cleared one.
///
/// There is no way to put a key back once cleared.
pub struct KeyStore {
    inner: ArcSwapOption<SecretKey>,
}

impl KeyStore {
    /// Create a ready store holding `key`.
    pub fn new(key: SecretKey) -> Self {
        Self {
            inner: ArcSwapOption::new(Some(Arc::new(key))),
        }
    }

    /// Returns `true` while a key is held.
    pub fn is_ready(&self) -> bool {
        self.inner.load().is_some()
    }

    /// Snapshot the current key for the duration of one operation.
    ///
    /// # Errors
    ///
    /// Returns [`CryptoError::KeyUnavailable`] once the store has been cleared.
    pub fn current(&self) -> Result<Arc<SecretKey>, CryptoError> {
        self.inner.load_full().ok_or(CryptoError::KeyUnavailable)
    }

    /// Drop the held key. Returns `true` if a key was held before this call.
    pub fn clear(&self) -> bool {
        self.inner.swap(None).is_some()
    }
}

impl std::fmt::Debug for KeyStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("KeyStore")
            .field("ready", &self.is_ready())
            .finish()
    }
}
