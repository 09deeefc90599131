mod hotp_window;
mod provisioning_roundtrip;
mod totp_window;
