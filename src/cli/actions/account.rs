use super::prompt;
use crate::{
    cli::globals::GlobalArgs,
    features::account::{
        PasswordResetForm, RegistrationForm, register as register_account,
        request_password_reset, reset_password as confirm_reset,
    },
};
use anyhow::Result;
use secrecy::{ExposeSecret, SecretString};

#[derive(Debug)]
pub struct RegisterArgs {
    pub globals: GlobalArgs,
    pub email: String,
    pub name: String,
    pub password: Option<SecretString>,
    pub confirmation: Option<SecretString>,
}

#[derive(Debug)]
pub struct ForgotArgs {
    pub globals: GlobalArgs,
    pub email: String,
}

#[derive(Debug)]
pub struct ResetArgs {
    pub globals: GlobalArgs,
    pub token: SecretString,
    pub password: Option<SecretString>,
    pub confirmation: Option<SecretString>,
}

/// # Errors
/// Returns an error on a local validation failure or a backend rejection.
pub async fn register(args: RegisterArgs) -> Result<()> {
    let api = args.globals.api_client()?;
    let (password, confirmation) =
        new_password(args.password, args.confirmation, "Password").await?;
    let form = RegistrationForm {
        email: args.email,
        name: args.name,
        password,
        confirmation,
    };

    register_account(&api, &form).await?;
    println!("Account created. You can now sign in.");
    Ok(())
}

/// # Errors
/// Returns an error for a malformed email or a transport failure.
pub async fn forgot_password(args: ForgotArgs) -> Result<()> {
    let api = args.globals.api_client()?;
    let message = request_password_reset(&api, &args.email).await?;
    println!("{message}");
    Ok(())
}

/// # Errors
/// Returns an error on a local validation failure or a backend rejection.
pub async fn reset_password(args: ResetArgs) -> Result<()> {
    let api = args.globals.api_client()?;
    let (password, confirmation) =
        new_password(args.password, args.confirmation, "New password").await?;
    let form = PasswordResetForm {
        token: args.token,
        new_password: password,
        confirmation,
    };

    confirm_reset(&api, &form).await?;
    println!("Password updated. You can now sign in.");
    Ok(())
}

// A password passed non-interactively stands as its own confirmation.
async fn new_password(
    password: Option<SecretString>,
    confirmation: Option<SecretString>,
    label: &str,
) -> Result<(SecretString, SecretString)> {
    match (password, confirmation) {
        (Some(password), Some(confirmation)) => Ok((password, confirmation)),
        (Some(password), None) => {
            let confirmation = SecretString::from(password.expose_secret());
            Ok((password, confirmation))
        }
        (None, confirmation) => {
            let password = prompt::secret(label).await?;
            let confirmation =
                prompt::secret_or_prompt(confirmation, "Confirm password").await?;
            Ok((password, confirmation))
        }
    }
}
