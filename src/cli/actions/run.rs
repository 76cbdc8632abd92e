use crate::cli::actions::{Action, account, captcha, health, login, session};
use anyhow::Result;

/// Execute the provided action.
// This is the single dispatch point for all CLI actions.
/// # Errors
/// Returns an error if the action fails.
pub async fn execute(action: Action) -> Result<()> {
    match action {
        Action::Login(args) => login::execute(args).await,
        Action::Logout(globals) => session::logout(&globals),
        Action::Whoami(globals) => session::whoami(&globals),
        Action::Captcha(args) => captcha::execute(&args),
        Action::Health(globals) => health::execute(&globals).await,
        Action::Register(args) => account::register(args).await,
        Action::ForgotPassword(args) => account::forgot_password(args).await,
        Action::ResetPassword(args) => account::reset_password(args).await,
    }
}
