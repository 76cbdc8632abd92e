use super::validation::{ValidationError, check_new_password, normalize_email, valid_email};
use secrecy::{ExposeSecret, SecretString};
use serde::Serialize;

#[derive(Serialize)]
pub struct RegisterRequest<'a> {
    pub email: &'a str,
    pub password: &'a str,
    pub name: &'a str,
}

impl std::fmt::Debug for RegisterRequest<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RegisterRequest")
            .field("email", &self.email)
            .field("password", &"[REDACTED]")
            .field("name", &self.name)
            .finish()
    }
}

#[derive(Debug, Serialize)]
pub struct ForgotPasswordRequest<'a> {
    pub email: &'a str,
}

#[derive(Serialize)]
pub struct ResetPasswordRequest<'a> {
    pub token: &'a str,
    pub new_password: &'a str,
}

#[derive(Debug)]
pub struct RegistrationForm {
    pub email: String,
    pub name: String,
    pub password: SecretString,
    pub confirmation: SecretString,
}

impl RegistrationForm {
    /// Validates the form and returns the normalized email on success.
    ///
    /// # Errors
    /// Returns the first failing field check.
    pub fn validate(&self) -> Result<String, ValidationError> {
        let email = normalize_email(&self.email);
        if !valid_email(&email) {
            return Err(ValidationError::InvalidEmail);
        }
        if self.name.trim().is_empty() {
            return Err(ValidationError::MissingName);
        }
        check_new_password(
            self.password.expose_secret(),
            self.confirmation.expose_secret(),
        )?;
        Ok(email)
    }
}

#[derive(Debug)]
pub struct PasswordResetForm {
    pub token: SecretString,
    pub new_password: SecretString,
    pub confirmation: SecretString,
}

impl PasswordResetForm {
    /// # Errors
    /// Returns the first failing field check.
    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.token.expose_secret().trim().is_empty() {
            return Err(ValidationError::MissingToken);
        }
        check_new_password(
            self.new_password.expose_secret(),
            self.confirmation.expose_secret(),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn form(email: &str, name: &str, password: &str, confirmation: &str) -> RegistrationForm {
        RegistrationForm {
            email: email.to_string(),
            name: name.to_string(),
            password: SecretString::from(password),
            confirmation: SecretString::from(confirmation),
        }
    }

    #[test]
    fn registration_normalizes_email() {
        let email = form(" Ada@EQ.test", "Ada", "letters42", "letters42")
            .validate()
            .unwrap();
        assert_eq!(email, "ada@eq.test");
    }

    #[test]
    fn registration_checks_fields_in_order() {
        assert_eq!(
            form("nope", "", "x", "y").validate(),
            Err(ValidationError::InvalidEmail)
        );
        assert_eq!(
            form("ada@eq.test", "  ", "x", "y").validate(),
            Err(ValidationError::MissingName)
        );
        assert_eq!(
            form("ada@eq.test", "Ada", "letters42", "letters24").validate(),
            Err(ValidationError::PasswordMismatch)
        );
    }

    #[test]
    fn reset_requires_token() {
        let form = PasswordResetForm {
            token: SecretString::from(" "),
            new_password: SecretString::from("letters42"),
            confirmation: SecretString::from("letters42"),
        };
        assert_eq!(form.validate(), Err(ValidationError::MissingToken));
    }

    #[test]
    fn register_request_debug_redacts_password() {
        let request = RegisterRequest {
            email: "ada@eq.test",
            password: "letters42",
            name: "Ada",
        };
        let debug = format!("{request:?}");
        assert!(!debug.contains("letters42"));
        assert!(debug.contains("ada@eq.test"));
    }
}
