//! `otpauth://` provisioning URIs for authenticator apps.
//!
//! ```text
//! otpauth://{type}/{issuer}:{accountName}?secret=..&issuer=..&algorithm=..&digits=..&{counter|period}=..
//! ```
//!
//! The label is percent-encoded; query values use
//! `application/x-www-form-urlencoded` escaping (spaces as `+`).
//! Rendering the URI as a QR code is left to the caller.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use url::form_urlencoded;
use url::Url;

use crate::algorithm::OtpAlgorithm;
use crate::digits::OtpDigits;
use crate::error::OtpError;
use crate::key::SecretKey;
use crate::totp::DEFAULT_PERIOD;

/// URI scheme understood by authenticator apps.
pub const SCHEME: &str = "otpauth";

/// Engine type tag, the host part of the URI.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OtpKind {
    /// Counter-based (RFC 4226).
    Hotp,
    /// Time-based (RFC 6238).
    Totp,
}

impl OtpKind {
    /// `"hotp"` or `"totp"`.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Hotp => "hotp",
            Self::Totp => "totp",
        }
    }
}

impl fmt::Display for OtpKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for OtpKind {
    type Err = OtpError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "hotp" => Ok(Self::Hotp),
            "totp" => Ok(Self::Totp),
            other => Err(OtpError::InvalidUri(format!("unknown OTP type: {other}"))),
        }
    }
}

/// Identifies which account a key belongs to.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Label {
    /// Username, email, etc.
    pub account_name: String,
    /// Domain, company or org issuing the key. May be empty.
    pub issuer: String,
}

impl Label {
    /// Build a label from an account name and an issuer.
    #[must_use]
    pub fn new(account_name: &str, issuer: &str) -> Self {
        Self {
            account_name: account_name.to_owned(),
            issuer: issuer.to_owned(),
        }
    }

    /// Percent-encoded URI path form: `issuer:accountName`.
    ///
    /// The `:` separator is written even for an empty issuer, so the path
    /// segment is never a bare `.` or `..`.
    #[must_use]
    pub fn encoded(&self) -> String {
        format!(
            "{}:{}",
            urlencoding::encode(&self.issuer),
            urlencoding::encode(&self.account_name)
        )
    }
}

/// Per-kind query parameters. Each variant contributes its own moving-factor key.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum OtpParameters {
    /// HOTP parameters.
    #[serde(rename_all = "camelCase")]
    Hotp {
        /// Canonical base-32 secret.
        secret: String,
        /// HMAC algorithm.
        algorithm: OtpAlgorithm,
        /// Code length.
        digits: OtpDigits,
        /// Current counter.
        counter: u64,
    },
    /// TOTP parameters.
    #[serde(rename_all = "camelCase")]
    Totp {
        /// Canonical base-32 secret.
        secret: String,
        /// HMAC algorithm.
        algorithm: OtpAlgorithm,
        /// Code length.
        digits: OtpDigits,
        /// Time step in seconds.
        period: u32,
    },
}

impl OtpParameters {
    /// Engine type tag for these parameters.
    #[must_use]
    pub const fn kind(&self) -> OtpKind {
        match self {
            Self::Hotp { .. } => OtpKind::Hotp,
            Self::Totp { .. } => OtpKind::Totp,
        }
    }

    /// Canonical base-32 secret.
    #[must_use]
    pub fn secret(&self) -> &str {
        match self {
            Self::Hotp { secret, .. } | Self::Totp { secret, .. } => secret,
        }
    }

    /// HMAC algorithm.
    #[must_use]
    pub const fn algorithm(&self) -> OtpAlgorithm {
        match self {
            Self::Hotp { algorithm, .. } | Self::Totp { algorithm, .. } => *algorithm,
        }
    }

    /// Code length.
    #[must_use]
    pub const fn digits(&self) -> OtpDigits {
        match self {
            Self::Hotp { digits, .. } | Self::Totp { digits, .. } => *digits,
        }
    }

    /// Form-urlencoded query string.
    #[must_use]
    pub fn encode_query(&self, issuer: &str) -> String {
        let mut query = form_urlencoded::Serializer::new(String::new());
        query
            .append_pair("secret", self.secret())
            .append_pair("issuer", issuer)
            .append_pair("algorithm", self.algorithm().as_str())
            .append_pair("digits", &self.digits().to_string());
        match self {
            Self::Hotp { counter, .. } => query.append_pair("counter", &counter.to_string()),
            Self::Totp { period, .. } => query.append_pair("period", &period.to_string()),
        };
        query.finish()
    }
}

/// Everything an authenticator app needs to enroll a key.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct KeyUri {
    /// Account label.
    pub label: Label,
    /// Engine parameters.
    pub parameters: OtpParameters,
}

impl KeyUri {
    /// Combine a label with engine parameters.
    #[must_use]
    pub const fn new(label: Label, parameters: OtpParameters) -> Self {
        Self { label, parameters }
    }

    /// Engine type tag.
    #[must_use]
    pub const fn kind(&self) -> OtpKind {
        self.parameters.kind()
    }

    /// Parse an `otpauth://` URI back into a label and parameters.
    ///
    /// Missing `algorithm`, `digits` and `period` take their defaults; a missing
    /// HOTP `counter` is zero. Unknown query keys (e.g. `image`) are ignored.
    ///
    /// # Errors
    ///
    /// - [`OtpError::InvalidUri`] for a malformed URI, wrong scheme, unknown type,
    ///   missing secret, or non-numeric values
    /// - [`OtpError::InvalidKey`] if the secret is not base-32
    /// - [`OtpError::UnsupportedAlgorithm`] / [`OtpError::UnsupportedDigitCount`]
    ///   for out-of-range parameters
    pub fn parse(uri: &str) -> Result<Self, OtpError> {
        let parsed = Url::parse(uri).map_err(|e| OtpError::InvalidUri(e.to_string()))?;
        if parsed.scheme() != SCHEME {
            return Err(OtpError::InvalidUri(format!(
                "expected scheme '{SCHEME}', found '{}'",
                parsed.scheme()
            )));
        }
        let kind: OtpKind = parsed
            .host_str()
            .ok_or_else(|| OtpError::InvalidUri("missing OTP type".to_owned()))?
            .parse()?;

        let mut label = parse_label(parsed.path())?;

        let mut secret = None;
        let mut algorithm = OtpAlgorithm::default();
        let mut digits = OtpDigits::default();
        let mut counter = 0u64;
        let mut period = DEFAULT_PERIOD;
        let mut issuer_param = None;

        for (key, value) in parsed.query_pairs() {
            match key.as_ref() {
                "secret" => secret = Some(SecretKey::from_base32(&value)?.to_base32()),
                "algorithm" => algorithm = value.parse()?,
                "digits" => digits = OtpDigits::new(parse_number(&key, &value)?)?,
                "counter" => counter = parse_number(&key, &value)?,
                "period" => period = parse_number(&key, &value)?,
                "issuer" => issuer_param = Some(value.into_owned()),
                _ => {}
            }
        }

        if label.issuer.is_empty() {
            if let Some(issuer) = issuer_param {
                label.issuer = issuer;
            }
        }

        let secret = secret.ok_or_else(|| OtpError::InvalidUri("missing secret".to_owned()))?;
        let parameters = match kind {
            OtpKind::Hotp => OtpParameters::Hotp {
                secret,
                algorithm,
                digits,
                counter,
            },
            OtpKind::Totp => OtpParameters::Totp {
                secret,
                algorithm,
                digits,
                period,
            },
        };
        Ok(Self { label, parameters })
    }
}

impl fmt::Display for KeyUri {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{SCHEME}://{}/{}?{}",
            self.kind(),
            self.label.encoded(),
            self.parameters.encode_query(&self.label.issuer)
        )
    }
}

impl FromStr for KeyUri {
    type Err = OtpError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

fn parse_label(path: &str) -> Result<Label, OtpError> {
    let raw = path.strip_prefix('/').unwrap_or(path);
    let decode = |part: &str| {
        urlencoding::decode(part)
            .map(std::borrow::Cow::into_owned)
            .map_err(|e| OtpError::InvalidUri(format!("label is not UTF-8: {e}")))
    };
    // Split before decoding so an encoded ':' inside the issuer survives.
    match raw.split_once(':') {
        Some((issuer, account)) => Ok(Label {
            account_name: decode(account)?,
            issuer: decode(issuer)?,
        }),
        None => Ok(Label {
            account_name: decode(raw)?,
            issuer: String::new(),
        }),
    }
}

fn parse_number<T: FromStr>(key: &str, value: &str) -> Result<T, OtpError> {
    value
        .parse()
        .map_err(|_| OtpError::InvalidUri(format!("{key} is not a number: {value}")))
}
