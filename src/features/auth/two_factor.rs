//! Two-factor sub-state of the login flow. Holds the short-lived pre-auth
//! token issued after valid primary credentials, plus the code being typed.
//! The token survives failed attempts until it expires or the user backs out.

use super::types::TwoFactorRequest;
use secrecy::{ExposeSecret, SecretString};

pub const OTP_LENGTH: usize = 6;

#[derive(Debug)]
pub struct TwoFactorStep {
    pre_auth_token: SecretString,
    identifier: String,
    remember_me: bool,
    otp_code: String,
    error: Option<String>,
    failures: u32,
}

impl TwoFactorStep {
    /// `remember_me` is the choice captured when the credentials were submitted.
    #[must_use]
    pub fn new(pre_auth_token: SecretString, identifier: &str, remember_me: bool) -> Self {
        Self {
            pre_auth_token,
            identifier: identifier.to_string(),
            remember_me,
            otp_code: String::new(),
            error: None,
            failures: 0,
        }
    }

    /// Keeps digits only, capped at six, and clears any previous error.
    pub fn set_code(&mut self, input: &str) {
        self.otp_code = input
            .chars()
            .filter(char::is_ascii_digit)
            .take(OTP_LENGTH)
            .collect();
        self.error = None;
    }

    #[must_use]
    pub fn otp_code(&self) -> &str {
        &self.otp_code
    }

    #[must_use]
    pub fn can_verify(&self) -> bool {
        self.otp_code.chars().count() == OTP_LENGTH
    }

    #[must_use]
    pub fn identifier(&self) -> &str {
        &self.identifier
    }

    #[must_use]
    pub fn remember_me(&self) -> bool {
        self.remember_me
    }

    #[must_use]
    pub fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }

    #[must_use]
    pub fn failures(&self) -> u32 {
        self.failures
    }

    #[must_use]
    pub fn request(&self) -> TwoFactorRequest<'_> {
        TwoFactorRequest {
            pre_auth_token: self.pre_auth_token.expose_secret(),
            code: &self.otp_code,
        }
    }

    /// Records a rejected code. The pre-auth token is kept for the retry.
    pub fn record_failure(&mut self, message: impl Into<String>) {
        self.failures += 1;
        self.otp_code.clear();
        self.error = Some(message.into());
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn step() -> TwoFactorStep {
        TwoFactorStep::new(SecretString::from("pre-auth"), "ada@eq.test", true)
    }

    #[test]
    fn code_input_keeps_six_digits() {
        let mut step = step();
        step.set_code("12 34-5a6789");
        assert_eq!(step.otp_code(), "123456");
        assert!(step.can_verify());

        step.set_code("12345");
        assert!(!step.can_verify());
    }

    #[test]
    fn failures_keep_the_pre_auth_token() {
        let mut step = step();
        step.set_code("000000");
        step.record_failure("Invalid verification code.");

        assert_eq!(step.failures(), 1);
        assert_eq!(step.error(), Some("Invalid verification code."));
        assert_eq!(step.otp_code(), "");
        assert_eq!(step.request().pre_auth_token, "pre-auth");

        step.set_code("123456");
        assert_eq!(step.error(), None);
        assert_eq!(step.request().code, "123456");
    }

    #[test]
    fn remembers_submit_time_choices() {
        let step = step();
        assert_eq!(step.identifier(), "ada@eq.test");
        assert!(step.remember_me());
    }
}
