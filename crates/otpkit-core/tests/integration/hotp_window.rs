//! HOTP validation window and counter advancement.

use otpkit_core::{Hotp, HotpConfig, OtpError};

const SECRET: &str = "GEZDGNBVGY3TQOJQGEZDGNBVGY3TQOJQ";

fn engine(counter: u64, leeway: u32) -> Hotp {
    Hotp::new(HotpConfig {
        secret: Some(SECRET.to_owned()),
        counter: Some(counter),
        leeway: Some(leeway),
        ..HotpConfig::default()
    })
    .expect("valid config")
}

/// Tokens for C-1, C and C+1 are accepted; the counter always ends at C+1.
#[test]
fn leeway_one_accepts_neighbours_and_lands_on_centre_plus_one() {
    let c = 100u64;
    for candidate in [c - 1, c, c + 1] {
        let mut hotp = engine(c, 1);
        let token = hotp.code_for(candidate).expect("code");
        assert!(hotp.validate(&token).expect("validate"), "candidate {candidate}");
        assert_eq!(hotp.counter(), c + 1, "after matching {candidate}");
    }
}

/// A token outside [C-leeway, C+leeway] is rejected with no state change.
#[test]
fn exhausted_window_leaves_counter_unchanged() {
    let c = 100u64;
    for leeway in [0u32, 1, 3] {
        let reach = u64::from(leeway) + 1;
        for candidate in [c - reach, c + reach] {
            let mut hotp = engine(c, leeway);
            let token = hotp.code_for(candidate).expect("code");
            assert!(!hotp.validate(&token).expect("validate"));
            assert_eq!(hotp.counter(), c, "leeway {leeway}, candidate {candidate}");
        }
    }
}

/// A code is single-use: after validation the window moves on.
#[test]
fn replayed_token_eventually_falls_out_of_window() {
    let mut hotp = engine(10, 1);
    let token = hotp.generate().expect("generate");
    assert!(hotp.validate(&token).expect("first use"));
    assert_eq!(hotp.counter(), 11);
    // Still inside the look-behind window once.
    assert!(hotp.validate(&token).expect("second use"));
    assert_eq!(hotp.counter(), 12);
    assert!(!hotp.validate(&token).expect("third use"));
    assert_eq!(hotp.counter(), 12);
}

/// Issuing a code, advancing, then validating follows the usual server flow.
#[test]
fn issue_advance_validate_flow() {
    let mut server = engine(0, 2);
    let mut client = engine(0, 0);
    // The client burns several codes the server never sees.
    for _ in 0..2 {
        client.advance().expect("advance");
    }
    let token = client.generate().expect("client code");
    assert!(server.validate(&token).expect("server validate"));
    assert_eq!(server.counter(), 1);
}

#[test]
fn missing_secret_is_distinct_from_invalid_token() {
    let mut hotp = Hotp::new(HotpConfig::default()).expect("defaults");
    for token in ["", "000000", "not a code"] {
        assert_eq!(hotp.validate(token), Err(OtpError::MissingKey));
    }
    assert_eq!(hotp.counter(), 0);
}
