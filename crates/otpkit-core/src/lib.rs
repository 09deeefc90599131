//! `otpkit-core`: HOTP (RFC 4226) and TOTP (RFC 6238) one-time passwords.
//!
//! Pure and synchronous: zero network, zero async. Secrets are never
//! persisted; provisioning URIs are plain strings for the caller to render.

#![cfg_attr(test, allow(clippy::unwrap_used, clippy::arithmetic_side_effects))]

pub mod error;

pub mod algorithm;
pub mod digits;
pub mod key;

pub mod otp;

pub mod hotp;
pub mod totp;

pub mod provisioning;

pub use algorithm::OtpAlgorithm;
pub use digits::{OtpDigits, DEFAULT_DIGITS, MAX_DIGITS, MIN_DIGITS};
pub use error::OtpError;
pub use hotp::{Hotp, HotpConfig, DEFAULT_LEEWAY};
pub use key::{generate_random_secret, normalize, SecretKey, RANDOM_KEY_LENGTH};
pub use otp::{generate_code, generate_otp};
pub use provisioning::{KeyUri, Label, OtpKind, OtpParameters};
pub use totp::{unix_now, Totp, TotpConfig, DEFAULT_DELAY, DEFAULT_PERIOD};
