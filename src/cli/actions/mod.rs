pub mod account;
pub mod captcha;
pub mod health;
pub mod login;
pub mod session;

mod prompt;

// Internal "interpreter" for `Action`.
// We keep the match in a separate module so `mod.rs` stays small as more actions are added.
mod run;

use crate::cli::globals::GlobalArgs;

#[derive(Debug)]
pub enum Action {
    Login(login::Args),
    Logout(GlobalArgs),
    Whoami(GlobalArgs),
    Captcha(captcha::Args),
    Health(GlobalArgs),
    Register(account::RegisterArgs),
    ForgotPassword(account::ForgotArgs),
    ResetPassword(account::ResetArgs),
}

impl Action {
    // Convenience wrapper so call sites can do `action.execute().await`.
    /// Execute the action.
    /// # Errors
    /// Returns an error if the action fails.
    pub async fn execute(self) -> anyhow::Result<()> {
        run::execute(self).await
    }
}
