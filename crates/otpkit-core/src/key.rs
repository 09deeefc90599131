//! Base-32 secret codec and random secret generation.
//!
//! Secrets travel as RFC 4648 base-32 text. Input is accepted in any case,
//! with or without `=` padding, so keys issued by third-party tools decode
//! identically. Canonical output is upper-case and unpadded.

use std::fmt;

use data_encoding::{Encoding, BASE32_NOPAD};
use rand::rngs::OsRng;
use rand::RngCore;
use zeroize::{Zeroize, Zeroizing};

use crate::error::OtpError;

/// Byte length of secrets generated when the caller supplies none.
pub const RANDOM_KEY_LENGTH: usize = 64;

const PAD: char = '=';

/// `BASE32_NOPAD` that ignores non-zero trailing bits, as most
/// authenticator apps do.
fn lenient_base32() -> Result<Encoding, OtpError> {
    let mut spec = BASE32_NOPAD.specification();
    spec.check_trailing_bits = false;
    spec.encoding()
        .map_err(|e| OtpError::InvalidKey(format!("base-32 specification: {e}")))
}

/// Upper-case `secret`, strip trailing padding, and decode it.
///
/// # Errors
///
/// Returns [`OtpError::InvalidKey`] if the remaining text is not valid
/// base-32 (foreign characters or an impossible length).
pub fn normalize(secret: &str) -> Result<Zeroizing<Vec<u8>>, OtpError> {
    let mut text = secret.to_ascii_uppercase();
    let stripped_len = text.trim_end_matches(PAD).len();
    text.truncate(stripped_len);

    let decoded = lenient_base32()?
        .decode(text.as_bytes())
        .map(Zeroizing::new)
        .map_err(|e| OtpError::InvalidKey(e.to_string()));
    text.zeroize();
    decoded
}

/// Encode raw key bytes as canonical (upper-case, unpadded) base-32.
#[must_use]
pub fn encode(bytes: &[u8]) -> String {
    BASE32_NOPAD.encode(bytes)
}

/// Draw `byte_length` bytes from the OS CSPRNG and return them as canonical
/// base-32 text of `ceil(byte_length * 8 / 5)` characters.
///
/// # Errors
///
/// Returns [`OtpError::EntropyFailure`] if the OS entropy source fails.
/// The failure is surfaced as-is, never retried.
pub fn generate_random_secret(byte_length: usize) -> Result<String, OtpError> {
    let key = SecretKey::random(byte_length)?;
    Ok(key.to_base32())
}

/// Decoded shared secret, wiped from memory on drop.
#[derive(Clone, PartialEq, Eq)]
pub struct SecretKey {
    bytes: Zeroizing<Vec<u8>>,
}

impl SecretKey {
    /// Decode a base-32 secret (see [`normalize`]).
    ///
    /// # Errors
    ///
    /// Returns [`OtpError::InvalidKey`] if decoding fails or yields no bytes.
    pub fn from_base32(secret: &str) -> Result<Self, OtpError> {
        let bytes = normalize(secret)?;
        if bytes.is_empty() {
            return Err(OtpError::InvalidKey("secret decodes to zero bytes".to_owned()));
        }
        Ok(Self { bytes })
    }

    /// Wrap raw key bytes.
    #[must_use]
    pub fn from_bytes(bytes: &[u8]) -> Self {
        Self {
            bytes: Zeroizing::new(bytes.to_vec()),
        }
    }

    /// Fill a new key with `len` bytes from `OsRng`.
    ///
    /// # Errors
    ///
    /// Returns [`OtpError::EntropyFailure`] if the CSPRNG fails.
    pub fn random(len: usize) -> Result<Self, OtpError> {
        let mut bytes = Zeroizing::new(vec![0u8; len]);
        OsRng
            .try_fill_bytes(&mut bytes)
            .map_err(|e| OtpError::EntropyFailure(format!("CSPRNG fill failed: {e}")))?;
        tracing::debug!(byte_length = len, "generated random OTP secret");
        Ok(Self { bytes })
    }

    /// Raw key bytes, for HMAC keying only.
    #[must_use]
    pub fn expose(&self) -> &[u8] {
        &self.bytes
    }

    /// Canonical base-32 text.
    #[must_use]
    pub fn to_base32(&self) -> String {
        encode(&self.bytes)
    }

    /// Number of key bytes.
    #[must_use]
    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    /// Returns `true` if the key holds no bytes.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }
}

impl fmt::Debug for SecretKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("SecretKey(***)")
    }
}
