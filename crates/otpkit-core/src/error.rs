//! Error types for `otpkit-core`.

use thiserror::Error;

/// Errors produced by OTP configuration, generation, and validation.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum OtpError {
    /// The secret is not valid base-32 after normalization.
    #[error("invalid key: {0}")]
    InvalidKey(String),

    /// Validation was attempted before any secret was configured.
    #[error("missing secret key for validation")]
    MissingKey,

    /// The OS entropy source could not produce random bytes.
    #[error("entropy source failure: {0}")]
    EntropyFailure(String),

    /// Algorithm identifier outside {SHA1, SHA256, SHA512}.
    #[error("unsupported algorithm: {0}")]
    UnsupportedAlgorithm(String),

    /// Digit count outside 1..=8.
    #[error("unsupported digit count: {0} (expected 1 to 8)")]
    UnsupportedDigitCount(u8),

    /// TOTP period of zero seconds.
    #[error("invalid period: {0}s (must be > 0)")]
    InvalidPeriod(u32),

    /// The HOTP counter is already at `u64::MAX`.
    #[error("HOTP counter cannot advance past u64::MAX")]
    CounterOverflow,

    /// The system clock reports a time before the Unix epoch.
    #[error("system clock error: {0}")]
    Clock(String),

    /// A provisioning URI could not be parsed back into parameters.
    #[error("invalid provisioning URI: {0}")]
    InvalidUri(String),
}
