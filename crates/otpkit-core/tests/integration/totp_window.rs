//! TOTP validation window boundaries.

use otpkit_core::{OtpError, Totp, TotpConfig};

const SECRET: &str = "GEZDGNBVGY3TQOJQGEZDGNBVGY3TQOJQ";

// Start of a 30-second step.
const T: u64 = 1_700_000_010;

fn engine(period: u32, delay: u32) -> Totp {
    Totp::new(TotpConfig {
        secret: Some(SECRET.to_owned()),
        period: Some(period),
        delay: Some(delay),
        digits: Some(8),
        ..TotpConfig::default()
    })
    .expect("valid config")
}

/// With period=30 and delay=1, a code issued at the start of step C is
/// accepted from the start of step C-1 through the end of step C+1.
#[test]
fn delay_one_covers_three_steps() {
    let totp = engine(30, 1);
    assert_eq!(T % 30, 0);
    let code = totp.code_at(T).expect("code");

    for at in (T - 30)..=(T + 59) {
        assert!(totp.validate_at(&code, at).expect("validate"), "rejected at T{:+}", i128::from(at) - i128::from(T));
    }
    for at in [T - 60, T - 31, T + 60, T + 89] {
        assert!(!totp.validate_at(&code, at).expect("validate"), "accepted at T{:+}", i128::from(at) - i128::from(T));
    }
}

/// Same-step and adjacent-step acceptance, measured from mid-step.
#[test]
fn mid_step_code_tolerates_29_seconds_either_way() {
    let totp = engine(30, 1);
    let t = T + 15;
    let code = totp.code_at(t).expect("code");
    assert!(totp.validate_at(&code, t + 29).expect("T+29"));
    assert!(totp.validate_at(&code, t - 29).expect("T-29"));
    assert!(totp.validate_at(&code, t + 44).expect("T+44"));
    assert!(totp.validate_at(&code, t - 45).expect("T-45"));
    assert!(!totp.validate_at(&code, t + 45).expect("T+45"));
    assert!(!totp.validate_at(&code, t - 46).expect("T-46"));
}

/// Nothing outside [T-59, T+59] is ever accepted with delay=1.
#[test]
fn nothing_accepted_beyond_two_periods() {
    let totp = engine(30, 1);
    for offset in 0..30u64 {
        let t = T + offset;
        let code = totp.code_at(t).expect("code");
        assert!(!totp.validate_at(&code, t + 60).expect("validate"));
        assert!(!totp.validate_at(&code, t - 60).expect("validate"));
    }
}

#[test]
fn sixty_second_period() {
    let totp = engine(60, 1);
    let code = totp.code_at(1_700_000_040).expect("code");
    assert!(totp.validate_at(&code, 1_700_000_040 + 60).expect("next step"));
    assert!(!totp.validate_at(&code, 1_700_000_040 + 180).expect("three steps"));
}

/// Validation never mutates the engine: the same code validates repeatedly.
#[test]
fn validation_is_stateless() {
    let totp = engine(30, 1);
    let code = totp.code_at(T).expect("code");
    for _ in 0..3 {
        assert!(totp.validate_at(&code, T).expect("validate"));
    }
}

#[test]
fn missing_secret_fails_regardless_of_token() {
    let totp = Totp::new(TotpConfig::default()).expect("defaults");
    for token in ["", "123456", "abcdef"] {
        assert_eq!(totp.validate_at(token, T), Err(OtpError::MissingKey));
    }
}
