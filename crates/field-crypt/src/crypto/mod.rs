//! AES-256-CBC field encryption primitives.
//!
//! This module is free of key-lifecycle and I/O concerns. It provides the
//! low-level seal/open operations and the envelope codec used by
//! [`EncryptionCore`](crate::EncryptionCore).
//!
//! # Envelope format
//!
//! ```text
//! base64( IV[16] ‖ ciphertext )
//! ```
//!
//! For [`Transformation::Aes256CbcPkcs7HmacSha256`] the ciphertext region is
//! `CBC-ciphertext ‖ HMAC-SHA256 tag[32]`.

pub mod cipher;
pub mod envelope;

pub use cipher::{Transformation, KEY_LEN};
pub use envelope::{Envelope, IV_LEN};
