//! OTP length policy: modulo truncation and zero-left-padding.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::OtpError;

/// Smallest supported code length.
pub const MIN_DIGITS: u8 = 1;

/// Largest supported code length.
pub const MAX_DIGITS: u8 = 8;

/// Default code length.
pub const DEFAULT_DIGITS: u8 = 6;

// 10^n for n in 0..=MAX_DIGITS.
const POWERS_OF_TEN: [u32; 9] = [
    1,
    10,
    100,
    1_000,
    10_000,
    100_000,
    1_000_000,
    10_000_000,
    100_000_000,
];

/// Number of digits in an OTP code, always within `1..=8`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "u8", into = "u8")]
pub struct OtpDigits(u8);

impl OtpDigits {
    /// 6-digit code (standard).
    pub const SIX: Self = Self(6);
    /// 8-digit code.
    pub const EIGHT: Self = Self(8);

    /// Validate a digit count.
    ///
    /// # Errors
    ///
    /// Returns [`OtpError::UnsupportedDigitCount`] outside `1..=8`.
    pub fn new(digits: u8) -> Result<Self, OtpError> {
        if !(MIN_DIGITS..=MAX_DIGITS).contains(&digits) {
            return Err(OtpError::UnsupportedDigitCount(digits));
        }
        Ok(Self(digits))
    }

    /// Return the numeric digit count.
    #[must_use]
    pub const fn value(self) -> u8 {
        self.0
    }

    /// Return the modulus (10^digits) used for truncation.
    #[must_use]
    pub fn modulus(self) -> u32 {
        POWERS_OF_TEN[usize::from(self.0)]
    }

    /// `n mod 10^digits`.
    #[must_use]
    #[allow(clippy::arithmetic_side_effects)]
    pub fn truncate(self, n: u32) -> u32 {
        // modulus is at least 10 (never zero).
        n % self.modulus()
    }

    /// Format `n` as exactly `digits` decimal characters, zero-padded on the left.
    ///
    /// Values wider than the digit count are printed in full, never cut.
    #[must_use]
    pub fn left_pad(self, n: u32) -> String {
        let width = usize::from(self.0);
        format!("{n:0>width$}")
    }
}

impl Default for OtpDigits {
    fn default() -> Self {
        Self::SIX
    }
}

impl TryFrom<u8> for OtpDigits {
    type Error = OtpError;

    fn try_from(digits: u8) -> Result<Self, Self::Error> {
        Self::new(digits)
    }
}

impl From<OtpDigits> for u8 {
    fn from(digits: OtpDigits) -> Self {
        digits.0
    }
}

impl fmt::Display for OtpDigits {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}
