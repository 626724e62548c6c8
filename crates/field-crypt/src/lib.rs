//! Field-level encryption core.
//!
//! Protects individual text fields at rest: one held AES-256 key, a fresh
//! random IV per encryption, `base64(IV ‖ ciphertext)` as the stored form,
//! and a closed [`CryptoError`] set for every failure.

pub mod batch;
pub mod config;
pub mod crypto;
pub mod encryption;
pub mod key;
pub mod telemetry;

pub use common::CryptoError;
pub use crypto::{Envelope, Transformation};
pub use encryption::{CoreState, EncryptionCore};
pub use key::{
    EnvKeySource, FileKeySource, KeySource, KeySourceError, KeyStore, SecretKey, StaticKeySource,
};
