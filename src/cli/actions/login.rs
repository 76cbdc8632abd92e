use super::{captcha::write_svg, prompt};
use crate::{
    cli::{commands::auth::DEFAULT_CAPTCHA_FILE, globals::GlobalArgs},
    features::auth::{
        AuthApi, Feedback, History, HttpAuthApi, LoginController, LoginState,
        captcha::CaptchaCheck,
    },
};
use anyhow::{Result, bail};
use secrecy::SecretString;
use std::{
    fmt,
    path::{Path, PathBuf},
    sync::Arc,
};
use tracing::{debug, info};

pub struct Args {
    pub globals: GlobalArgs,
    pub identifier: String,
    pub password: Option<SecretString>,
    pub remember_me: bool,
    pub captcha_out: Option<PathBuf>,
}

impl fmt::Debug for Args {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Args")
            .field("globals", &self.globals)
            .field("identifier", &self.identifier)
            .field("password", &self.password.as_ref().map(|_| "***"))
            .field("remember_me", &self.remember_me)
            .field("captcha_out", &self.captcha_out)
            .finish()
    }
}

/// Runs the interactive sign-in: CAPTCHA, credentials, then the second factor
/// when the account requires it. Lockouts are waited out.
/// # Errors
/// Returns an error when the credentials are rejected, the backend fails or
/// stdin closes.
pub async fn execute(args: Args) -> Result<()> {
    let api = args.globals.api_client()?;
    let store = args.globals.session_store();
    let history = Arc::new(History::new());
    let captcha_path = args
        .captcha_out
        .unwrap_or_else(|| args.globals.config.data_dir().join(DEFAULT_CAPTCHA_FILE));
    let password = prompt::secret_or_prompt(args.password, "Password").await?;

    let mut controller = LoginController::new(HttpAuthApi::new(api), store.clone(), history.clone());
    controller.set_identifier(&args.identifier);
    controller.set_password(password);
    controller.set_remember_me(args.remember_me);

    loop {
        if !controller.captcha().is_verified() {
            solve_captcha(&mut controller, &captcha_path).await?;
        }

        match controller.submit().await {
            LoginState::Success => break,
            LoginState::TwoFactorRequired => {
                if complete_two_factor(&mut controller).await? {
                    break;
                }
            }
            LoginState::LockedOut => {
                eprintln!("{}", feedback_text(&controller));
                controller.lockout().finished().await;
                debug!("lockout over, resubmitting");
            }
            LoginState::FieldError
                if matches!(controller.feedback(), Some(Feedback::Captcha(_))) =>
            {
                eprintln!("{}", feedback_text(&controller));
            }
            _ => bail!("{}", feedback_text(&controller)),
        }
    }

    if let Some(route) = history.current() {
        debug!(route = route.path(), "navigated");
    }
    let user = store.get().map(|session| session.user);
    info!("signed in");
    match user {
        Some(user) if !user.email.is_empty() => println!("Signed in as {} <{}>", user.name, user.email),
        Some(user) => println!("Signed in as {}", user.name),
        None => println!("Signed in"),
    }
    if !args.remember_me {
        println!("The session ends with this process; pass --remember-me to keep it.");
    }
    Ok(())
}

async fn solve_captcha<A: AuthApi>(controller: &mut LoginController<A>, path: &Path) -> Result<()> {
    write_svg(controller.captcha(), path)?;
    eprintln!("CAPTCHA image written to {}", path.display());

    loop {
        let answer = prompt::line("CAPTCHA (empty for a new one)").await?;
        if answer.trim().is_empty() {
            controller.refresh_captcha();
            write_svg(controller.captcha(), path)?;
            eprintln!("New CAPTCHA image written to {}", path.display());
            continue;
        }

        controller.set_captcha_input(&answer);
        match controller.verify_captcha() {
            CaptchaCheck::Verified => return Ok(()),
            CaptchaCheck::Mismatch { .. } => eprintln!("{}", feedback_text(controller)),
            CaptchaCheck::Regenerated => {
                write_svg(controller.captcha(), path)?;
                eprintln!("{}", feedback_text(controller));
            }
        }
    }
}

/// Returns `false` when the pre-auth token expired and sign-in must restart.
async fn complete_two_factor<A: AuthApi>(controller: &mut LoginController<A>) -> Result<bool> {
    eprintln!("Two-factor authentication is enabled for this account.");
    loop {
        let code = prompt::line("Verification code").await?;
        controller.set_otp_code(&code);

        match controller.verify_two_factor().await {
            LoginState::Success => return Ok(true),
            LoginState::TwoFactorRequired => eprintln!("{}", feedback_text(controller)),
            LoginState::Idle if controller.two_factor().is_none() => {
                eprintln!("{}", feedback_text(controller));
                return Ok(false);
            }
            _ => bail!("{}", feedback_text(controller)),
        }
    }
}

fn feedback_text<A: AuthApi>(controller: &LoginController<A>) -> String {
    controller
        .feedback()
        .map_or_else(|| "Sign-in failed.".to_string(), ToString::to_string)
}
