//! RFC 6238 TOTP engine: the counter is `floor(unix_time / period)` and
//! validation accepts `delay` steps either side of the current one.
//!
//! The engine holds no moving state; time is the only counter source, so
//! validation never mutates it. The `*_at` methods take an explicit Unix
//! timestamp and are fully deterministic.

use std::time::{SystemTime, UNIX_EPOCH};

use serde::{Deserialize, Serialize};

use crate::algorithm::OtpAlgorithm;
use crate::digits::{OtpDigits, DEFAULT_DIGITS};
use crate::error::OtpError;
use crate::key::{SecretKey, RANDOM_KEY_LENGTH};
use crate::otp::{constant_time_eq, generate_otp};
use crate::provisioning::{KeyUri, Label, OtpParameters};

// ── Constants ───────────────────────────────────────────────────────

/// Default TOTP period in seconds (RFC 6238 §4).
pub const DEFAULT_PERIOD: u32 = 30;

/// Default time-step window for validation (±1 step per RFC 6238 §5.2).
pub const DEFAULT_DELAY: u32 = 1;

/// Current Unix time in whole seconds.
///
/// # Errors
///
/// Returns [`OtpError::Clock`] if the system clock is before the epoch.
pub fn unix_now() -> Result<u64, OtpError> {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|elapsed| elapsed.as_secs())
        .map_err(|e| OtpError::Clock(e.to_string()))
}

// ── Types ───────────────────────────────────────────────────────────

/// TOTP configuration. Unset fields take their defaults when the engine is built.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TotpConfig {
    /// Base-32 secret. Absent or empty means "generate on first use".
    pub secret: Option<String>,
    /// Time step in seconds (default [`DEFAULT_PERIOD`]).
    pub period: Option<u32>,
    /// Validation window in steps (default [`DEFAULT_DELAY`]).
    pub delay: Option<u32>,
    /// HMAC algorithm (default SHA-1).
    pub algorithm: Option<OtpAlgorithm>,
    /// Code length (default 6).
    pub digits: Option<u8>,
}

/// Time-based one-time password engine.
///
/// With all defaults the engine is compatible with Google Authenticator and
/// most other authenticator apps.
#[derive(Clone, Debug)]
pub struct Totp {
    secret: Option<SecretKey>,
    period: u32,
    delay: u32,
    algorithm: OtpAlgorithm,
    digits: OtpDigits,
}

impl Totp {
    /// Build an engine from `config`, filling defaults and validating every field.
    ///
    /// # Errors
    ///
    /// - [`OtpError::InvalidKey`] if a non-empty secret does not decode
    /// - [`OtpError::InvalidPeriod`] if `period` is 0
    /// - [`OtpError::UnsupportedDigitCount`] if `digits` is outside `1..=8`
    pub fn new(config: TotpConfig) -> Result<Self, OtpError> {
        let secret = match config.secret.as_deref() {
            None | Some("") => None,
            Some(text) => Some(SecretKey::from_base32(text)?),
        };
        let period = config.period.unwrap_or(DEFAULT_PERIOD);
        if period == 0 {
            return Err(OtpError::InvalidPeriod(period));
        }
        Ok(Self {
            secret,
            period,
            delay: config.delay.unwrap_or(DEFAULT_DELAY),
            algorithm: config.algorithm.unwrap_or_default(),
            digits: OtpDigits::new(config.digits.unwrap_or(DEFAULT_DIGITS))?,
        })
    }

    /// Engine with the given secret and all other fields at their defaults.
    ///
    /// # Errors
    ///
    /// Returns [`OtpError::InvalidKey`] if the secret does not decode.
    pub fn with_secret(secret: &str) -> Result<Self, OtpError> {
        Self::new(TotpConfig {
            secret: Some(secret.to_owned()),
            ..TotpConfig::default()
        })
    }

    /// Time step in seconds.
    #[must_use]
    pub const fn period(&self) -> u32 {
        self.period
    }

    /// Validation window in steps.
    #[must_use]
    pub const fn delay(&self) -> u32 {
        self.delay
    }

    /// HMAC algorithm.
    #[must_use]
    pub const fn algorithm(&self) -> OtpAlgorithm {
        self.algorithm
    }

    /// Code length.
    #[must_use]
    pub const fn digits(&self) -> OtpDigits {
        self.digits
    }

    /// Canonical base-32 secret, if one is set.
    #[must_use]
    pub fn secret(&self) -> Option<String> {
        self.secret.as_ref().map(SecretKey::to_base32)
    }

    /// Returns `true` once a secret is configured or generated.
    #[must_use]
    pub const fn has_secret(&self) -> bool {
        self.secret.is_some()
    }

    /// Generate a [`RANDOM_KEY_LENGTH`]-byte secret if none is set.
    ///
    /// # Errors
    ///
    /// Returns [`OtpError::EntropyFailure`] if the CSPRNG fails.
    pub fn ensure_secret(&mut self) -> Result<&SecretKey, OtpError> {
        match &mut self.secret {
            Some(key) => Ok(&*key),
            slot => Ok(&*slot.insert(SecretKey::random(RANDOM_KEY_LENGTH)?)),
        }
    }

    /// Time step for `timestamp`: `floor(timestamp / period)`.
    #[must_use]
    #[allow(clippy::arithmetic_side_effects)]
    pub fn counter_at(&self, timestamp: u64) -> u64 {
        // period is validated non-zero at construction.
        timestamp / u64::from(self.period)
    }

    /// Code for `timestamp`. Never changes state.
    ///
    /// # Errors
    ///
    /// Returns [`OtpError::MissingKey`] if no secret is set.
    pub fn code_at(&self, timestamp: u64) -> Result<String, OtpError> {
        let secret = self.secret.as_ref().ok_or(OtpError::MissingKey)?;
        Ok(generate_otp(
            secret.expose(),
            self.counter_at(timestamp),
            self.algorithm,
            self.digits,
        ))
    }

    /// Code for `timestamp`, generating a secret first if none is set.
    ///
    /// # Errors
    ///
    /// Returns [`OtpError::EntropyFailure`] if a secret had to be generated and
    /// the CSPRNG failed.
    pub fn generate_at(&mut self, timestamp: u64) -> Result<String, OtpError> {
        self.ensure_secret()?;
        self.code_at(timestamp)
    }

    /// Code for the current system time, generating a secret first if none is set.
    ///
    /// # Errors
    ///
    /// Returns [`OtpError::EntropyFailure`] on CSPRNG failure or
    /// [`OtpError::Clock`] if the clock is before the epoch.
    pub fn generate(&mut self) -> Result<String, OtpError> {
        let now = unix_now()?;
        self.generate_at(now)
    }

    /// Validate `token` as seen at `timestamp`.
    ///
    /// For each step from 0 to `delay`, with `pad = period * step`, tries the
    /// time step of `timestamp - pad` then `timestamp + pad`. Candidates before
    /// the epoch or past `u64::MAX` are skipped.
    ///
    /// # Errors
    ///
    /// Returns [`OtpError::MissingKey`] if no secret is set, whatever the token.
    pub fn validate_at(&self, token: &str, timestamp: u64) -> Result<bool, OtpError> {
        let secret = self.secret.as_ref().ok_or(OtpError::MissingKey)?;
        let matches = |time: u64| {
            let expected = generate_otp(
                secret.expose(),
                self.counter_at(time),
                self.algorithm,
                self.digits,
            );
            constant_time_eq(expected.as_bytes(), token.as_bytes())
        };

        for step in 0..=u64::from(self.delay) {
            let Some(pad) = u64::from(self.period).checked_mul(step) else {
                break;
            };
            if timestamp.checked_sub(pad).is_some_and(matches) {
                tracing::debug!(step, direction = "behind", "TOTP token matched");
                return Ok(true);
            }
            if step == 0 {
                continue;
            }
            if timestamp.checked_add(pad).is_some_and(matches) {
                tracing::debug!(step, direction = "ahead", "TOTP token matched");
                return Ok(true);
            }
        }

        tracing::trace!(delay = self.delay, "TOTP token rejected");
        Ok(false)
    }

    /// Validate `token` against the current system time.
    ///
    /// # Errors
    ///
    /// Returns [`OtpError::MissingKey`] if no secret is set, or
    /// [`OtpError::Clock`] if the clock is before the epoch.
    pub fn validate(&self, token: &str) -> Result<bool, OtpError> {
        if self.secret.is_none() {
            return Err(OtpError::MissingKey);
        }
        self.validate_at(token, unix_now()?)
    }

    /// Provisioning parameters for this engine.
    ///
    /// # Errors
    ///
    /// Returns [`OtpError::MissingKey`] if no secret is set.
    pub fn parameters(&self) -> Result<OtpParameters, OtpError> {
        let secret = self.secret().ok_or(OtpError::MissingKey)?;
        Ok(OtpParameters::Totp {
            secret,
            algorithm: self.algorithm,
            digits: self.digits,
            period: self.period,
        })
    }

    /// Provisioning URI descriptor for `account_name` at `issuer`.
    ///
    /// # Errors
    ///
    /// Returns [`OtpError::MissingKey`] if no secret is set.
    pub fn key_uri(&self, account_name: &str, issuer: &str) -> Result<KeyUri, OtpError> {
        Ok(KeyUri::new(Label::new(account_name, issuer), self.parameters()?))
    }

    /// Resolved configuration, secret in canonical base-32.
    #[must_use]
    pub fn config(&self) -> TotpConfig {
        TotpConfig {
            secret: self.secret(),
            period: Some(self.period),
            delay: Some(self.delay),
            algorithm: Some(self.algorithm),
            digits: Some(self.digits.value()),
        }
    }
}

impl TryFrom<TotpConfig> for Totp {
    type Error = OtpError;

    fn try_from(config: TotpConfig) -> Result<Self, Self::Error> {
        Self::new(config)
    }
}

impl TryFrom<&KeyUri> for Totp {
    type Error = OtpError;

    /// Rebuild an engine from a parsed TOTP URI. Delay is not part of the URI
    /// and takes its default.
    fn try_from(uri: &KeyUri) -> Result<Self, Self::Error> {
        match &uri.parameters {
            OtpParameters::Totp {
                secret,
                algorithm,
                digits,
                period,
            } => Self::new(TotpConfig {
                secret: Some(secret.clone()),
                period: Some(*period),
                delay: None,
                algorithm: Some(*algorithm),
                digits: Some(digits.value()),
            }),
            OtpParameters::Hotp { .. } => Err(OtpError::InvalidUri(
                "expected a totp URI, found hotp".to_owned(),
            )),
        }
    }
}

// ── Tests ───────────────────────────────────────────────────────────
