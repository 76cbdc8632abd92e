//! Local form checks shared by the account flows.

use regex::Regex;
use thiserror::Error;

pub const MIN_PASSWORD_LENGTH: usize = 8;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ValidationError {
    #[error("Enter a valid email address.")]
    InvalidEmail,
    #[error("Name is required.")]
    MissingName,
    #[error("Password must be at least 8 characters.")]
    PasswordTooShort,
    #[error("Password must contain at least one letter and one digit.")]
    PasswordTooWeak,
    #[error("Passwords do not match.")]
    PasswordMismatch,
    #[error("Reset token is required.")]
    MissingToken,
}

/// Normalize an email for submission.
#[must_use]
pub fn normalize_email(email: &str) -> String {
    email.trim().to_lowercase()
}

/// Basic email format check on already-normalized input.
#[must_use]
pub fn valid_email(email_normalized: &str) -> bool {
    Regex::new(r"^[^@\s]+@[^@\s]+\.[^@\s]+$").is_ok_and(|regex| regex.is_match(email_normalized))
}

/// Checks length and character classes of a new password.
///
/// # Errors
/// Returns the first rule the password breaks.
pub fn check_password(password: &str) -> Result<(), ValidationError> {
    if password.chars().count() < MIN_PASSWORD_LENGTH {
        return Err(ValidationError::PasswordTooShort);
    }
    let has_letter = password.chars().any(char::is_alphabetic);
    let has_digit = password.chars().any(|c| c.is_ascii_digit());
    if !(has_letter && has_digit) {
        return Err(ValidationError::PasswordTooWeak);
    }
    Ok(())
}

/// Checks a new password and its confirmation.
///
/// # Errors
/// Returns the first rule broken, checking the password before the match.
pub fn check_new_password(password: &str, confirmation: &str) -> Result<(), ValidationError> {
    check_password(password)?;
    if password != confirmation {
        return Err(ValidationError::PasswordMismatch);
    }
    Ok(())
}
