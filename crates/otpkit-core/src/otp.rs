//! RFC 4226 dynamic truncation.
//!
//! Provides the pure code generator shared by the HOTP and TOTP engines,
//! using `ring::hmac` for HMAC-SHA1, HMAC-SHA256, and HMAC-SHA512.

use ring::hmac;

use crate::algorithm::OtpAlgorithm;
use crate::digits::OtpDigits;
use crate::error::OtpError;
use crate::key;

/// Constant-time byte comparison for OTP codes.
///
/// Returns `true` iff both slices have equal length and identical contents.
/// The early return on length mismatch only reveals the digit count, which
/// is public configuration.
pub(crate) fn constant_time_eq(a: &[u8], b: &[u8]) -> bool {
    if a.len() != b.len() {
        return false;
    }
    let mut diff = 0u8;
    for (x, y) in a.iter().zip(b.iter()) {
        diff |= x ^ y;
    }
    diff == 0
}

/// Generate a one-time code per RFC 4226 §5.3.
///
/// Pure and deterministic: the same `(secret, counter, algorithm, digits)`
/// always yields the same code.
///
/// # Arguments
/// - `secret`: Shared secret key bytes
/// - `counter`: Moving factor, serialized as 8 bytes big-endian (RFC 4226 §5.2)
/// - `algorithm`: HMAC algorithm to use
/// - `digits`: Number of output digits
#[must_use = "OTP code should be used or stored"]
pub fn generate_otp(
    secret: &[u8],
    counter: u64,
    algorithm: OtpAlgorithm,
    digits: OtpDigits,
) -> String {
    let key = hmac::Key::new(algorithm.to_ring_algorithm(), secret);
    let tag = hmac::sign(&key, &counter.to_be_bytes());
    let hmac_result = tag.as_ref();

    // offset = low-order 4 bits of the last byte. Digests are at least
    // 20 bytes, so offset + 3 <= 18 stays in bounds.
    let offset = usize::from(hmac_result[hmac_result.len().wrapping_sub(1)] & 0x0F);

    // Extract 4 bytes starting at offset, mask high bit (0x7FFFFFFF).
    let binary_code = u32::from_be_bytes([
        hmac_result[offset] & 0x7F,
        hmac_result[offset.wrapping_add(1)],
        hmac_result[offset.wrapping_add(2)],
        hmac_result[offset.wrapping_add(3)],
    ]);

    digits.left_pad(digits.truncate(binary_code))
}

/// Decode a base-32 `secret` and generate the code for `counter`.
///
/// # Errors
///
/// Returns [`OtpError::InvalidKey`] if the secret does not decode.
pub fn generate_code(
    secret: &str,
    counter: u64,
    algorithm: OtpAlgorithm,
    digits: OtpDigits,
) -> Result<String, OtpError> {
    let bytes = key::normalize(secret)?;
    Ok(generate_otp(&bytes, counter, algorithm, digits))
}
