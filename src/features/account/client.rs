use super::{
    types::{
        ForgotPasswordRequest, PasswordResetForm, RegisterRequest, RegistrationForm,
        ResetPasswordRequest,
    },
    validation::{ValidationError, normalize_email, valid_email},
};
use crate::api::{ApiClient, AppError};
use secrecy::ExposeSecret;
use thiserror::Error;
use tracing::info;

pub const REGISTER_PATH: &str = "/auth/register";
pub const FORGOT_PASSWORD_PATH: &str = "/auth/password/forgot";
pub const RESET_PASSWORD_PATH: &str = "/auth/password/reset";

pub const MSG_RESET_REQUESTED: &str =
    "If an account exists for that email, a password reset link has been sent.";

#[derive(Debug, Error)]
pub enum AccountError {
    #[error(transparent)]
    Invalid(#[from] ValidationError),
    #[error(transparent)]
    Api(#[from] AppError),
}

/// Creates an account after validating the form locally.
///
/// # Errors
/// Returns [`AccountError::Invalid`] without a request when a field check
/// fails, [`AccountError::Api`] when the backend rejects the registration.
pub async fn register(api: &ApiClient, form: &RegistrationForm) -> Result<(), AccountError> {
    let email = form.validate()?;
    let request = RegisterRequest {
        email: &email,
        password: form.password.expose_secret(),
        name: form.name.trim(),
    };
    api.post_json_empty(REGISTER_PATH, &request).await?;
    info!("account registered");
    Ok(())
}

/// Requests a reset link. A missing account is reported like a sent link.
///
/// # Errors
/// Returns [`AccountError::Invalid`] for a malformed email and
/// [`AccountError::Api`] for transport or unexpected server failures.
pub async fn request_password_reset(
    api: &ApiClient,
    email: &str,
) -> Result<&'static str, AccountError> {
    let email = normalize_email(email);
    if !valid_email(&email) {
        return Err(ValidationError::InvalidEmail.into());
    }

    match api
        .post_json_empty(FORGOT_PASSWORD_PATH, &ForgotPasswordRequest { email: &email })
        .await
    {
        Ok(()) | Err(AppError::Api { status: 404, .. } | AppError::Http { status: 404, .. }) => {
            Ok(MSG_RESET_REQUESTED)
        }
        Err(err) => Err(err.into()),
    }
}

/// Sets a new password with a reset token.
///
/// # Errors
/// Returns [`AccountError::Invalid`] for local check failures and
/// [`AccountError::Api`] when the backend rejects the token or password.
pub async fn reset_password(api: &ApiClient, form: &PasswordResetForm) -> Result<(), AccountError> {
    form.validate()?;
    let request = ResetPasswordRequest {
        token: form.token.expose_secret().trim(),
        new_password: form.new_password.expose_secret(),
    };
    api.post_json_empty(RESET_PASSWORD_PATH, &request).await?;
    info!("password reset completed");
    Ok(())
}
