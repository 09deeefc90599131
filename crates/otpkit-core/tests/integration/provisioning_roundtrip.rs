//! Provisioning URI export and parse-back.

use otpkit_core::{
    Hotp, HotpConfig, KeyUri, OtpAlgorithm, OtpDigits, OtpKind, OtpParameters, Totp, TotpConfig,
};

#[test]
fn hotp_engine_survives_uri_roundtrip() {
    let hotp = Hotp::new(HotpConfig {
        secret: Some("4lowukizk2ya===".to_owned()),
        counter: Some(17),
        algorithm: Some(OtpAlgorithm::Sha256),
        digits: Some(8),
        ..HotpConfig::default()
    })
    .expect("valid config");

    let uri = hotp
        .key_uri("alice@example.com", "Example Co")
        .expect("key uri")
        .to_string();
    insta::assert_snapshot!(
        uri,
        @"otpauth://hotp/Example%20Co:alice%40example.com?secret=4LOWUKIZK2YA&issuer=Example+Co&algorithm=SHA256&digits=8&counter=17"
    );

    let parsed = KeyUri::parse(&uri).expect("parse");
    assert_eq!(parsed.kind(), OtpKind::Hotp);
    assert_eq!(parsed.label.account_name, "alice@example.com");
    assert_eq!(parsed.label.issuer, "Example Co");

    let rebuilt = Hotp::try_from(&parsed).expect("rebuild");
    assert_eq!(rebuilt.secret(), hotp.secret());
    assert_eq!(rebuilt.counter(), 17);
    assert_eq!(rebuilt.algorithm(), OtpAlgorithm::Sha256);
    assert_eq!(rebuilt.digits(), OtpDigits::EIGHT);
    assert_eq!(rebuilt.code_for(17), hotp.code_for(17));
}

#[test]
fn totp_engine_survives_uri_roundtrip() {
    let mut totp = Totp::new(TotpConfig {
        period: Some(60),
        algorithm: Some(OtpAlgorithm::Sha512),
        ..TotpConfig::default()
    })
    .expect("valid config");
    totp.ensure_secret().expect("secret");

    let uri = totp.key_uri("bob", "R&D: Lab").expect("key uri").to_string();
    assert!(uri.starts_with("otpauth://totp/R%26D%3A%20Lab:bob?secret="), "{uri}");
    assert!(uri.contains("&issuer=R%26D%3A+Lab&"), "{uri}");
    assert!(uri.ends_with("&algorithm=SHA512&digits=6&period=60"), "{uri}");

    let parsed: KeyUri = uri.parse().expect("parse");
    assert_eq!(parsed.label.issuer, "R&D: Lab");
    assert_eq!(parsed.label.account_name, "bob");

    let rebuilt = Totp::try_from(&parsed).expect("rebuild");
    assert_eq!(rebuilt.secret(), totp.secret());
    assert_eq!(rebuilt.period(), 60);
    assert_eq!(rebuilt.algorithm(), OtpAlgorithm::Sha512);
    assert_eq!(rebuilt.digits(), OtpDigits::SIX);
    assert_eq!(rebuilt.code_at(1_700_000_000), totp.code_at(1_700_000_000));
}

#[test]
fn generated_secret_is_exported_canonically() {
    let mut totp = Totp::new(TotpConfig::default()).expect("defaults");
    totp.generate_at(0).expect("generate");
    let params = totp.parameters().expect("parameters");
    let secret = params.secret();
    assert_eq!(secret.len(), 103);
    assert!(secret.bytes().all(|b| b.is_ascii_uppercase() || (b'2'..=b'7').contains(&b)));
}

#[test]
fn key_uri_serializes_as_json() {
    let uri = KeyUri::parse("otpauth://totp/ACME:dave?secret=NAZXS&period=45").expect("parse");
    let json = serde_json::to_value(&uri).expect("serialize");
    assert_eq!(json["label"]["accountName"], "dave");
    assert_eq!(json["label"]["issuer"], "ACME");
    assert_eq!(json["parameters"]["type"], "totp");
    assert_eq!(json["parameters"]["period"], 45);
    assert_eq!(json["parameters"]["algorithm"], "SHA1");
    assert_eq!(json["parameters"]["digits"], 6);

    let back: KeyUri = serde_json::from_value(json).expect("deserialize");
    assert_eq!(back, uri);
    assert!(matches!(back.parameters, OtpParameters::Totp { period: 45, .. }));
}
