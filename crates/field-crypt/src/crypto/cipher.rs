//! AES-256-CBC encryption and decryption of individual string fields.
//!
//! **Transformations:**
//! - [`Transformation::Aes256CbcPkcs7`] is the legacy on-disk format. It has no
//!   integrity check; tampering is only noticed when it happens to break the
//!   PKCS#7 padding or the UTF-8 decoding of the result.
//! - [`Transformation::Aes256CbcPkcs7HmacSha256`] is encrypt-then-MAC. The tag
//!   covers `IV ‖ ciphertext` and is checked in constant time before the
//!   cipher runs, so every flipped byte is rejected.
//!
//! **Never reuse an IV under the same key.** Every seal draws a fresh one from
//! the OS CSPRNG.

use std::{fmt, str::FromStr};

use aes::Aes256;
use cbc::cipher::{block_padding::Pkcs7, BlockDecryptMut, BlockEncryptMut, KeyIvInit};
use common::CryptoError;
use hmac::{Hmac, Mac};
use rand::{rngs::OsRng, RngCore};
use sha2::Sha256;
use thiserror::Error;
use zeroize::Zeroizing;

use super::envelope::{Envelope, IV_LEN};

type Aes256CbcEnc = cbc::Encryptor<Aes256>;
type Aes256CbcDec = cbc::Decryptor<Aes256>;
type HmacSha256 = Hmac<Sha256>;

/// Byte length of an AES-256 key (32 bytes = 256 bits).
pub const KEY_LEN: usize = 32;

/// AES block length.
pub const BLOCK_LEN: usize = 16;

/// Byte length of an HMAC-SHA256 tag.
pub const TAG_LEN: usize = 32;

const ENC_LABEL: &[u8] = b"field-crypt/v1/enc";
const MAC_LABEL: &[u8] = b"field-crypt/v1/mac";

/// Cipher construction used by a core for its whole lifetime.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub enum Transformation {
    /// AES-256-CBC with PKCS#7 padding under the raw key. Unauthenticated.
    Aes256CbcPkcs7,
    /// AES-256-CBC with PKCS#7 padding plus an HMAC-SHA256 tag, using
    /// sub-keys derived from the raw key.
    #[default]
    Aes256CbcPkcs7HmacSha256,
}

impl Transformation {
    /// Configuration name of this transformation.
    pub fn as_str(&self) -> &'static str {
        match self {
            Transformation::Aes256CbcPkcs7 => "aes-256-cbc",
            Transformation::Aes256CbcPkcs7HmacSha256 => "aes-256-cbc-hmac-sha256",
        }
    }
}

impl fmt::Display for Transformation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A transformation name that is not recognised.
#[derive(Debug, Error)]
#[error("unknown transformation: {0}")]
pub struct UnknownTransformation(pub String);

impl FromStr for Transformation {
    type Err = UnknownTransformation;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "aes-256-cbc" => Ok(Transformation::Aes256CbcPkcs7),
            "aes-256-cbc-hmac-sha256" => Ok(Transformation::Aes256CbcPkcs7HmacSha256),
            other => Err(UnknownTransformation(other.to_owned())),
        }
    }
}

/// Encrypt `plaintext` under `key` into a fresh [`Envelope`].
///
/// # Errors
///
/// Returns [`CryptoError::ProviderError`] if the random source fails or the
/// cipher/MAC rejects its key.
pub fn seal(
    key: &[u8; KEY_LEN],
    transformation: Transformation,
    plaintext: &[u8],
) -> Result<Envelope, CryptoError> {
    let iv = random_iv()?;
    match transformation {
        Transformation::Aes256CbcPkcs7 => {
            let ciphertext = cbc_encrypt(key, &iv, plaintext)?;
            Ok(Envelope::new(iv, ciphertext))
        }
        Transformation::Aes256CbcPkcs7HmacSha256 => {
            let keys = SubKeys::derive(key)?;
            let mut ciphertext = cbc_encrypt(&keys.enc[..], &iv, plaintext)?;
            let tag = authenticate(&keys.mac[..], &iv, &ciphertext)?
                .finalize()
                .into_bytes();
            ciphertext.extend_from_slice(&tag);
            Ok(Envelope::new(iv, ciphertext))
        }
    }
}

/// Decrypt an [`Envelope`] back to plaintext bytes.
///
/// # Errors
///
/// Returns [`CryptoError::EnvelopeTooShort`] if an authenticated envelope has
/// no room for its tag, and [`CryptoError::DecryptionFailed`] on a tag
/// mismatch, a partial block, or bad padding.
pub fn open(
    key: &[u8; KEY_LEN],
    transformation: Transformation,
    envelope: &Envelope,
) -> Result<Vec<u8>, CryptoError> {
    match transformation {
        Transformation::Aes256CbcPkcs7 => cbc_decrypt(key, envelope.iv(), envelope.ciphertext()),
        Transformation::Aes256CbcPkcs7HmacSha256 => {
            let body = envelope.ciphertext();
            if body.len() < TAG_LEN {
                return Err(CryptoError::EnvelopeTooShort);
            }
            let (ciphertext, tag) = body.split_at(body.len() - TAG_LEN);
            let keys = SubKeys::derive(key)?;
            authenticate(&keys.mac[..], envelope.iv(), ciphertext)?
                .verify_slice(tag)
                .map_err(|_| CryptoError::DecryptionFailed)?;
            cbc_decrypt(&keys.enc[..], envelope.iv(), ciphertext)
        }
    }
}

/// Encryption and MAC keys derived from one master key.
struct SubKeys {
    enc: Zeroizing<[u8; KEY_LEN]>,
    mac: Zeroizing<[u8; KEY_LEN]>,
}

impl SubKeys {
    fn derive(master: &[u8; KEY_LEN]) -> Result<Self, CryptoError> {
        Ok(Self {
            enc: derive_subkey(master, ENC_LABEL)?,
            mac: derive_subkey(master, MAC_LABEL)?,
        })
    }
}

fn derive_subkey(master: &[u8], label: &[u8]) -> Result<Zeroizing<[u8; KEY_LEN]>, CryptoError> {
    let mut mac = new_mac(master)?;
    mac.update(label);
    let mut out = Zeroizing::new([0u8; KEY_LEN]);
    out.copy_from_slice(&mac.finalize().into_bytes());
    Ok(out)
}

fn authenticate(
    mac_key: &[u8],
    iv: &[u8; IV_LEN],
    ciphertext: &[u8],
) -> Result<HmacSha256, CryptoError> {
    let mut mac = new_mac(mac_key)?;
    mac.update(iv);
    mac.update(ciphertext);
    Ok(mac)
}

fn new_mac(key: &[u8]) -> Result<HmacSha256, CryptoError> {
    HmacSha256::new_from_slice(key).map_err(|_| CryptoError::ProviderError("mac rejected key"))
}

fn random_iv() -> Result<[u8; IV_LEN], CryptoError> {
    let mut iv = [0u8; IV_LEN];
    OsRng
        .try_fill_bytes(&mut iv)
        .map_err(|_| CryptoError::ProviderError("random source unavailable"))?;
    Ok(iv)
}

fn cbc_encrypt(key: &[u8], iv: &[u8; IV_LEN], plaintext: &[u8]) -> Result<Vec<u8>, CryptoError> {
    let cipher = Aes256CbcEnc::new_from_slices(key, iv)
        .map_err(|_| CryptoError::ProviderError("cipher rejected key or iv"))?;
    Ok(cipher.encrypt_padded_vec_mut::<Pkcs7>(plaintext))
}

fn cbc_decrypt(key: &[u8], iv: &[u8; IV_LEN], ciphertext: &[u8]) -> Result<Vec<u8>, CryptoError> {
    if ciphertext.is_empty() || ciphertext.len() % BLOCK_LEN != 0 {
        return Err(CryptoError::DecryptionFailed);
    }
    let cipher = Aes256CbcDec::new_from_slices(key, iv)
        .map_err(|_| CryptoError::ProviderError("cipher rejected key or iv"))?;
    cipher
        .decrypt_padded_vec_mut::<Pkcs7>(ciphertext)
        .map_err(|_| CryptoError::DecryptionFailed)
}

#[cfg(test)]
mod tests {
    use super::*;

    const ALL: [Transformation; 2] = [
        Transformation::Aes256CbcPkcs7,
        Transformation::Aes256CbcPkcs7HmacSha256,
    ];

    fn random_key() -> [u8; KEY_LEN] {
        let mut key = [0u8; KEY_LEN];
        OsRng.fill_bytes(&mut key);
        key
    }

    #[test]
    fn seal_open_round_trip() {
        let key = random_key();
        for t in ALL {
            let envelope = seal(&key, t, b"123-45-6789").unwrap();
            assert_eq!(open(&key, t, &envelope).unwrap(), b"123-45-6789");
        }
    }

    #[test]
    fn ciphertext_lengths() {
        let key = random_key();
        let legacy = seal(&key, Transformation::Aes256CbcPkcs7, &[0u8; 16]).unwrap();
        // A full block of plaintext gains a full block of padding.
        assert_eq!(legacy.ciphertext().len(), 32);

        let authed = seal(&key, Transformation::Aes256CbcPkcs7HmacSha256, b"abc").unwrap();
        assert_eq!(authed.ciphertext().len(), BLOCK_LEN + TAG_LEN);
    }

    #[test]
    fn nist_cbc_aes256_first_block() {
        // NIST SP 800-38A, F.2.5 CBC-AES256.Encrypt, block #1.
        let key = [
            0x60, 0x3d, 0xeb, 0x10, 0x15, 0xca, 0x71, 0xbe, 0x2b, 0x73, 0xae, 0xf0, 0x85, 0x7d,
            0x77, 0x81, 0x1f, 0x35, 0x2c, 0x07, 0x3b, 0x61, 0x08, 0xd7, 0x2d, 0x98, 0x10, 0xa3,
            0x09, 0x14, 0xdf, 0xf4,
        ];
        let iv: [u8; IV_LEN] = core::array::from_fn(|i| i as u8);
        let plaintext = [
            0x6b, 0xc1, 0xbe, 0xe2, 0x2e, 0x40, 0x9f, 0x96, 0xe9, 0x3d, 0x7e, 0x11, 0x73, 0x93,
            0x17, 0x2a,
        ];
        let expected = [
            0xf5, 0x8c, 0x4c, 0x04, 0xd6, 0xe5, 0xf1, 0xba, 0x77, 0x9e, 0xab, 0xfb, 0x5f, 0x7b,
            0xfb, 0xd6,
        ];
        let ciphertext = cbc_encrypt(&key, &iv, &plaintext).unwrap();
        assert_eq!(&ciphertext[..BLOCK_LEN], &expected);
        assert_eq!(cbc_decrypt(&key, &iv, &ciphertext).unwrap(), plaintext);
    }

    #[test]
    fn wrong_key_fails_authenticated_open() {
        let envelope = seal(&random_key(), Transformation::Aes256CbcPkcs7HmacSha256, b"secret")
            .unwrap();
        assert_eq!(
            open(&random_key(), Transformation::Aes256CbcPkcs7HmacSha256, &envelope),
            Err(CryptoError::DecryptionFailed)
        );
    }

    #[test]
    fn every_flipped_byte_fails_authentication() {
        let key = random_key();
        let t = Transformation::Aes256CbcPkcs7HmacSha256;
        let envelope = seal(&key, t, b"tamper me, all of me").unwrap();
        for i in 0..envelope.ciphertext().len() {
            let mut body = envelope.ciphertext().to_vec();
            body[i] ^= 0x01;
            let tampered = Envelope::new(*envelope.iv(), body);
            assert_eq!(open(&key, t, &tampered), Err(CryptoError::DecryptionFailed));
        }
        let mut iv = *envelope.iv();
        iv[0] ^= 0x80;
        let tampered = Envelope::new(iv, envelope.ciphertext().to_vec());
        assert_eq!(open(&key, t, &tampered), Err(CryptoError::DecryptionFailed));
    }

    #[test]
    fn legacy_padding_break_is_detected() {
        let key = random_key();
        let t = Transformation::Aes256CbcPkcs7;
        // 20 bytes → two blocks, the last ending in twelve 0x0c padding bytes.
        let mut envelope = seal(&key, t, b"twenty bytes of text").unwrap();
        let mut body = envelope.ciphertext().to_vec();
        body[BLOCK_LEN - 1] ^= 0xFF;
        envelope = Envelope::new(*envelope.iv(), body);
        assert_eq!(open(&key, t, &envelope), Err(CryptoError::DecryptionFailed));
    }

    #[test]
    fn missing_tag_is_too_short() {
        let key = random_key();
        let envelope = Envelope::new([0u8; IV_LEN], vec![0u8; TAG_LEN - 1]);
        assert_eq!(
            open(&key, Transformation::Aes256CbcPkcs7HmacSha256, &envelope),
            Err(CryptoError::EnvelopeTooShort)
        );
    }

    #[test]
    fn partial_block_rejected() {
        let key = random_key();
        for body in [vec![], vec![0u8; 17]] {
            let envelope = Envelope::new([0u8; IV_LEN], body);
            assert_eq!(
                open(&key, Transformation::Aes256CbcPkcs7, &envelope),
                Err(CryptoError::DecryptionFailed)
            );
        }
    }

    #[test]
    fn fresh_iv_per_seal() {
        let key = random_key();
        let a = seal(&key, Transformation::default(), b"same").unwrap();
        let b = seal(&key, Transformation::default(), b"same").unwrap();
        assert_ne!(a.iv(), b.iv());
        assert_ne!(a.ciphertext(), b.ciphertext());
    }

    #[test]
    fn transformation_names_parse() {
        for t in ALL {
            assert_eq!(t.as_str().parse::<Transformation>().unwrap(), t);
        }
        assert_eq!(
            " AES-256-CBC ".parse::<Transformation>().unwrap(),
            Transformation::Aes256CbcPkcs7
        );
        assert!("aes-128-gcm".parse::<Transformation>().is_err());
        assert_eq!(
            Transformation::default(),
            Transformation::Aes256CbcPkcs7HmacSha256
        );
    }
}
