//! Request and response types for the login endpoints. Requests borrow the
//! secrets they carry so nothing outlives the call; their `Debug` output is
//! redacted.

use secrecy::SecretString;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Error codes carried in `detail.code`.
pub mod codes {
    pub const INVALID_CREDENTIALS: &str = "invalid_credentials";
    pub const INVALID_CAPTCHA: &str = "invalid_captcha";
    pub const ACCOUNT_LOCKED: &str = "account_locked";
    pub const TOO_MANY_ATTEMPTS: &str = "too_many_attempts";
    pub const INVALID_OTP: &str = "invalid_otp";
    pub const PRE_AUTH_EXPIRED: &str = "pre_auth_expired";
}

#[derive(Serialize)]
pub struct LoginRequest<'a> {
    pub identifier: &'a str,
    pub password: &'a str,
    pub captcha_input: &'a str,
    pub session_id: &'a str,
}

impl fmt::Debug for LoginRequest<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LoginRequest")
            .field("identifier", &self.identifier)
            .field("password", &"[redacted]")
            .field("captcha_input", &self.captcha_input)
            .field("session_id", &self.session_id)
            .finish()
    }
}

#[derive(Serialize)]
pub struct TwoFactorRequest<'a> {
    pub pre_auth_token: &'a str,
    pub code: &'a str,
}

impl fmt::Debug for TwoFactorRequest<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TwoFactorRequest")
            .field("pre_auth_token", &"[redacted]")
            .field("code", &"[redacted]")
            .finish()
    }
}

/// Body of a successful login or two-factor response. The login endpoint
/// answers `202` with only `pre_auth_token` when a second factor is needed.
#[derive(Clone, Default, Deserialize)]
pub struct LoginResponseBody {
    #[serde(default)]
    pub access_token: Option<String>,
    #[serde(default)]
    pub pre_auth_token: Option<String>,
}

#[derive(Debug)]
pub enum LoginReply {
    Authenticated { access_token: String },
    TwoFactorRequired { pre_auth_token: SecretString },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn login_request_serializes_expected_fields() {
        let request = LoginRequest {
            identifier: "ada@eq.test",
            password: "hunter2",
            captcha_input: "AbC23",
            session_id: "01J0000000000000000000000",
        };
        let value = serde_json::to_value(&request).expect("json");
        assert_eq!(value["identifier"], "ada@eq.test");
        assert_eq!(value["password"], "hunter2");
        assert_eq!(value["captcha_input"], "AbC23");
        assert_eq!(value["session_id"], "01J0000000000000000000000");
    }

    #[test]
    fn debug_output_is_redacted() {
        let login = LoginRequest {
            identifier: "ada",
            password: "hunter2",
            captcha_input: "AbC23",
            session_id: "s",
        };
        assert!(!format!("{login:?}").contains("hunter2"));

        let two_factor = TwoFactorRequest {
            pre_auth_token: "pre-auth-secret",
            code: "123456",
        };
        let rendered = format!("{two_factor:?}");
        assert!(!rendered.contains("pre-auth-secret"));
        assert!(!rendered.contains("123456"));
    }
}
