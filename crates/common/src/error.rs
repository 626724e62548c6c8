//! The closed error taxonomy of the encryption core.

use thiserror::Error;

/// Notice shown to collaborators for every failure kind.
///
/// Deliberately identical across variants so a caller cannot tell a wrong key
/// apart from corrupted data.
pub const GENERIC_FAILURE_MESSAGE: &str = "the protected field could not be processed";

/// Every way an encrypt or decrypt call can fail.
///
/// Each variant has a stable machine-readable [`code`](CryptoError::code) for
/// logs and metrics:
/// - [`CryptoError::KeyUnavailable`] → `key_unavailable`
/// - [`CryptoError::MalformedEnvelope`] → `malformed_envelope`
/// - [`CryptoError::EnvelopeTooShort`] → `envelope_too_short`
/// - [`CryptoError::DecryptionFailed`] → `decryption_failed`
/// - [`CryptoError::ProviderError`] → `provider_error`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum CryptoError {
    /// No valid key was available at construction, or the key has been cleared.
    #[error("encryption key unavailable")]
    KeyUnavailable,

    /// The encoded text could not be decoded into bytes.
    #[error("malformed envelope encoding")]
    MalformedEnvelope,

    /// The decoded bytes are shorter than the minimum envelope size.
    #[error("envelope too short")]
    EnvelopeTooShort,

    /// The cipher rejected the envelope: wrong key, tampering, or bad padding.
    #[error("decryption failed")]
    DecryptionFailed,

    /// The cryptographic provider is unavailable or misconfigured.
    #[error("crypto provider error: {0}")]
    ProviderError(&'static str),
}

impl CryptoError {
    /// Stable snake_case identifier for this failure kind.
    pub fn code(&self) -> &'static str {
        match self {
            CryptoError::KeyUnavailable => "key_unavailable",
            CryptoError::MalformedEnvelope => "malformed_envelope",
            CryptoError::EnvelopeTooShort => "envelope_too_short",
            CryptoError::DecryptionFailed => "decryption_failed",
            CryptoError::ProviderError(_) => "provider_error",
        }
    }

    /// Message safe to show to an end user. Never reveals the failure kind.
    pub fn public_message(&self) -> &'static str {
        GENERIC_FAILURE_MESSAGE
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn codes_are_distinct() {
        let all = [
            CryptoError::KeyUnavailable,
            CryptoError::MalformedEnvelope,
            CryptoError::EnvelopeTooShort,
            CryptoError::DecryptionFailed,
            CryptoError::ProviderError("rng"),
        ];
        let mut codes: Vec<_> = all.iter().map(CryptoError::code).collect();
        codes.sort_unstable();
        codes.dedup();
        assert_eq!(codes.len(), all.len());
    }

    #[test]
    fn public_message_does_not_leak_kind() {
        assert_eq!(
            CryptoError::DecryptionFailed.public_message(),
            CryptoError::MalformedEnvelope.public_message()
        );
        assert_eq!(
            CryptoError::KeyUnavailable.public_message(),
            GENERIC_FAILURE_MESSAGE
        );
    }

    #[test]
    fn display_includes_provider_reason() {
        let e = CryptoError::ProviderError("random source unavailable");
        assert!(e.to_string().contains("random source unavailable"));
    }
}
