//! RFC 4226 HOTP engine: a persistent counter plus a symmetric
//! look-behind/look-ahead validation window ("leeway").
//!
//! Reading a code and advancing the counter are separate operations:
//! [`Hotp::code_for`] and [`Hotp::generate`] never touch the counter, and
//! [`Hotp::advance`] is the only explicit `+1`. A successful
//! [`Hotp::validate`] moves the counter to `center + 1`, where `center` is the
//! counter value the search window was centred on, regardless of which
//! candidate in the window matched.
//!
//! The engine is not internally synchronized. Mutating operations take
//! `&mut self`, so concurrent callers must serialize access themselves
//! (typically one engine per account behind the caller's own lock).

use serde::{Deserialize, Serialize};

use crate::algorithm::OtpAlgorithm;
use crate::digits::{OtpDigits, DEFAULT_DIGITS};
use crate::error::OtpError;
use crate::key::{SecretKey, RANDOM_KEY_LENGTH};
use crate::otp::{constant_time_eq, generate_otp};
use crate::provisioning::{KeyUri, Label, OtpParameters};

/// Default look-behind/look-ahead window for HOTP validation.
pub const DEFAULT_LEEWAY: u32 = 1;

/// HOTP configuration. Unset fields take their defaults when the engine is built.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HotpConfig {
    /// Base-32 secret. Absent or empty means "generate on first use".
    pub secret: Option<String>,
    /// Starting counter (default 0).
    pub counter: Option<u64>,
    /// Validation window (default [`DEFAULT_LEEWAY`]).
    pub leeway: Option<u32>,
    /// HMAC algorithm (default SHA-1).
    pub algorithm: Option<OtpAlgorithm>,
    /// Code length (default 6).
    pub digits: Option<u8>,
}

/// Counter-based one-time password engine.
#[derive(Clone, Debug)]
pub struct Hotp {
    secret: Option<SecretKey>,
    counter: u64,
    leeway: u32,
    algorithm: OtpAlgorithm,
    digits: OtpDigits,
}

impl Hotp {
    /// Build an engine from `config`, filling defaults and validating every field.
    ///
    /// # Errors
    ///
    /// - [`OtpError::InvalidKey`] if a non-empty secret does not decode
    /// - [`OtpError::UnsupportedDigitCount`] if `digits` is outside `1..=8`
    pub fn new(config: HotpConfig) -> Result<Self, OtpError> {
        let secret = match config.secret.as_deref() {
            None | Some("") => None,
            Some(text) => Some(SecretKey::from_base32(text)?),
        };
        Ok(Self {
            secret,
            counter: config.counter.unwrap_or(0),
            leeway: config.leeway.unwrap_or(DEFAULT_LEEWAY),
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
        Self::new(HotpConfig {
            secret: Some(secret.to_owned()),
            ..HotpConfig::default()
        })
    }

    /// Current counter value.
    #[must_use]
    pub const fn counter(&self) -> u64 {
        self.counter
    }

    /// Overwrite the counter, e.g. to resynchronize with a token.
    pub fn set_counter(&mut self, counter: u64) {
        self.counter = counter;
    }

    /// Validation window.
    #[must_use]
    pub const fn leeway(&self) -> u32 {
        self.leeway
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

    /// Code for an arbitrary counter value. Never changes state.
    ///
    /// # Errors
    ///
    /// Returns [`OtpError::MissingKey`] if no secret is set.
    pub fn code_for(&self, counter: u64) -> Result<String, OtpError> {
        let secret = self.secret.as_ref().ok_or(OtpError::MissingKey)?;
        Ok(generate_otp(secret.expose(), counter, self.algorithm, self.digits))
    }

    /// Advance the counter by exactly one and return the new value.
    ///
    /// # Errors
    ///
    /// Returns [`OtpError::CounterOverflow`] at `u64::MAX`.
    pub fn advance(&mut self) -> Result<u64, OtpError> {
        let next = self.counter.checked_add(1).ok_or(OtpError::CounterOverflow)?;
        tracing::debug!(from = self.counter, to = next, "HOTP counter advanced");
        self.counter = next;
        Ok(next)
    }

    /// Code for the current counter, generating a secret first if none is set.
    ///
    /// Does not advance the counter: call [`Hotp::advance`] once the code has
    /// been issued.
    ///
    /// # Errors
    ///
    /// Returns [`OtpError::EntropyFailure`] if a secret had to be generated and
    /// the CSPRNG failed.
    pub fn generate(&mut self) -> Result<String, OtpError> {
        self.ensure_secret()?;
        self.code_for(self.counter)
    }

    /// Search the window around the current counter for `token`.
    ///
    /// For each step from 0 to `leeway`, tries `counter - step` then
    /// `counter + step`, skipping candidates that would fall below zero or
    /// past `u64::MAX`. Returns the first matching counter: the smallest
    /// offset wins, backward before forward. Never changes state.
    ///
    /// # Errors
    ///
    /// Returns [`OtpError::MissingKey`] if no secret is set.
    pub fn find_match(&self, token: &str) -> Result<Option<u64>, OtpError> {
        let secret = self.secret.as_ref().ok_or(OtpError::MissingKey)?;
        let matches = |candidate: u64| {
            let expected = generate_otp(secret.expose(), candidate, self.algorithm, self.digits);
            constant_time_eq(expected.as_bytes(), token.as_bytes())
        };

        for step in 0..=u64::from(self.leeway) {
            let behind = self.counter.checked_sub(step);
            if let Some(candidate) = behind.filter(|&c| matches(c)) {
                tracing::debug!(step, direction = "behind", "HOTP token matched");
                return Ok(Some(candidate));
            }
            if step == 0 {
                continue;
            }
            let ahead = self.counter.checked_add(step);
            if let Some(candidate) = ahead.filter(|&c| matches(c)) {
                tracing::debug!(step, direction = "ahead", "HOTP token matched");
                return Ok(Some(candidate));
            }
        }

        tracing::trace!(leeway = self.leeway, "HOTP token rejected");
        Ok(None)
    }

    /// Validate `token` against the window and, on success, set the counter to
    /// the window centre plus one.
    ///
    /// On failure the counter is unchanged.
    ///
    /// # Errors
    ///
    /// - [`OtpError::MissingKey`] if no secret is set, whatever the token
    /// - [`OtpError::CounterOverflow`] if the counter is already `u64::MAX`
    pub fn validate(&mut self, token: &str) -> Result<bool, OtpError> {
        if self.find_match(token)?.is_none() {
            return Ok(false);
        }
        self.advance()?;
        Ok(true)
    }

    /// Provisioning parameters for this engine.
    ///
    /// # Errors
    ///
    /// Returns [`OtpError::MissingKey`] if no secret is set.
    pub fn parameters(&self) -> Result<OtpParameters, OtpError> {
        let secret = self.secret().ok_or(OtpError::MissingKey)?;
        Ok(OtpParameters::Hotp {
            secret,
            algorithm: self.algorithm,
            digits: self.digits,
            counter: self.counter,
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
    pub fn config(&self) -> HotpConfig {
        HotpConfig {
            secret: self.secret(),
            counter: Some(self.counter),
            leeway: Some(self.leeway),
            algorithm: Some(self.algorithm),
            digits: Some(self.digits.value()),
        }
    }
}

impl TryFrom<HotpConfig> for Hotp {
    type Error = OtpError;

    fn try_from(config: HotpConfig) -> Result<Self, Self::Error> {
        Self::new(config)
    }
}

impl TryFrom<&KeyUri> for Hotp {
    type Error = OtpError;

    /// Rebuild an engine from a parsed HOTP URI. Leeway is not part of the
    /// URI and takes its default.
    fn try_from(uri: &KeyUri) -> Result<Self, Self::Error> {
        match &uri.parameters {
            OtpParameters::Hotp {
                secret,
                algorithm,
                digits,
                counter,
            } => Self::new(HotpConfig {
                secret: Some(secret.clone()),
                counter: Some(*counter),
                leeway: None,
                algorithm: Some(*algorithm),
                digits: Some(digits.value()),
            }),
            OtpParameters::Totp { .. } => Err(OtpError::InvalidUri(
                "expected an hotp URI, found totp".to_owned(),
            )),
        }
    }
}
