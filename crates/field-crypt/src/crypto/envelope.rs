//! [`Envelope`]: IV + ciphertext framing and its Base64 storage encoding.

use std::borrow::Cow;

use base64::{engine::general_purpose::STANDARD, Engine as _};
use common::CryptoError;

/// Byte length of the CBC initialisation vector (one AES block).
pub const IV_LEN: usize = 16;

/// The unit produced by one encryption: a random IV followed by ciphertext.
///
/// The persisted form is `base64(iv ‖ ciphertext)`, see [`Envelope::encode`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Envelope {
    iv: [u8; IV_LEN],
    ciphertext: Vec<u8>,
}

impl Envelope {
    pub fn new(iv: [u8; IV_LEN], ciphertext: Vec<u8>) -> Self {
        Self { iv, ciphertext }
    }

    pub fn iv(&self) -> &[u8; IV_LEN] {
        &self.iv
    }

    pub fn ciphertext(&self) -> &[u8] {
        &self.ciphertext
    }

    /// Concatenate `iv ‖ ciphertext`.
    pub fn to_bytes(&self) -> Vec<u8> {
        let mut out = Vec::with_capacity(IV_LEN + self.ciphertext.len());
        out.extend_from_slice(&self.iv);
        out.extend_from_slice(&self.ciphertext);
        out
    }

    /// Split raw envelope bytes into IV and ciphertext.
    ///
    /// # Errors
    ///
    /// Returns [`CryptoError::EnvelopeTooShort`] if `bytes` cannot hold an IV.
    pub fn from_bytes(bytes: &[u8]) -> Result<Self, CryptoError> {
        if bytes.len() < IV_LEN {
            return Err(CryptoError::EnvelopeTooShort);
        }
        let (iv_bytes, ciphertext) = bytes.split_at(IV_LEN);
        let mut iv = [0u8; IV_LEN];
        iv.copy_from_slice(iv_bytes);
        Ok(Self {
            iv,
            ciphertext: ciphertext.to_vec(),
        })
    }

    /// Encode to standard, padded Base64 on a single line.
    pub fn encode(&self) -> String {
        STANDARD.encode(self.to_bytes())
    }

    /// Decode a stored string back into an [`Envelope`].
    ///
    /// Line breaks are ignored so values written with MIME-style wrapping
    /// still decode. Decoding is checked before the length, so garbage text is
    /// always reported as malformed rather than short.
    ///
    /// # Errors
    ///
    /// Returns [`CryptoError::MalformedEnvelope`] if the text is not valid
    /// Base64, and [`CryptoError::EnvelopeTooShort`] if it decodes to fewer
    /// than [`IV_LEN`] bytes.
    pub fn decode(encoded: &str) -> Result<Self, CryptoError> {
        let bytes = STANDARD
            .decode(strip_line_breaks(encoded).as_bytes())
            .map_err(|_| CryptoError::MalformedEnvelope)?;
        Self::from_bytes(&bytes)
    }
}

fn strip_line_breaks(s: &str) -> Cow<'_, str> {
    if s.contains(|c| c == '\r' || c == '\n') {
        Cow::Owned(s.chars().filter(|c| !matches!(c, '\r' | '\n')).collect())
    } else {
        Cow::Borrowed(s)
    }
}
