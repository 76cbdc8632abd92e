//! Credential submission state machine.
//!
//! `Idle → Submitting → {Success, TwoFactorRequired, LockedOut, FieldError,
//! NetworkError, ServerError}`. Local checks (CAPTCHA, lockout, empty fields,
//! an outstanding request) reject a submit before any network call. Every
//! server answer goes through one exhaustive match so each branch's effects
//! are visible in one place, and `is_submitting` is cleared by a drop guard on
//! every exit path, cancellation included.

use super::{
    captcha::{CaptchaChallenge, CaptchaCheck},
    client::AuthApi,
    lockout::{DEFAULT_LOCKOUT_SECS, LockoutTimer},
    navigation::{Navigator, Route},
    session::{Session, SessionStore},
    two_factor::TwoFactorStep,
    types::{LoginReply, LoginRequest, codes},
};
use crate::api::{AppError, ErrorDetail};
use chrono::Utc;
use secrecy::{ExposeSecret, SecretString};
use std::{
    fmt,
    sync::{
        Arc,
        atomic::{AtomicBool, Ordering},
    },
};
use tracing::{debug, info, warn};
use ulid::Ulid;

pub const MSG_CREDENTIALS: &str = "Invalid email/username or password.";
pub const MSG_CAPTCHA_REJECTED: &str =
    "The CAPTCHA answer was not accepted. A new challenge has been generated.";
pub const MSG_CAPTCHA_REQUIRED: &str = "Please verify the CAPTCHA before signing in.";
pub const MSG_FIELDS_REQUIRED: &str = "Email/username and password are required.";
pub const MSG_IN_PROGRESS: &str = "A sign-in request is already in progress.";
pub const MSG_TWO_FACTOR_PENDING: &str =
    "Finish two-factor verification or go back to sign in.";
pub const MSG_NETWORK: &str =
    "Unable to reach the server. Check your connection and try again.";
pub const MSG_OTP_INVALID: &str = "Invalid verification code. Please try again.";
pub const MSG_OTP_INCOMPLETE: &str = "Enter the 6-digit code from your authenticator app.";
pub const MSG_PRE_AUTH_EXPIRED: &str = "Your verification session expired. Please sign in again.";

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum LoginState {
    Idle,
    Submitting,
    Success,
    TwoFactorRequired,
    LockedOut,
    FieldError,
    NetworkError,
    ServerError,
}

/// User-facing outcome of the last action, one variant per error category.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Feedback {
    /// Rejected before reaching the network.
    Local(String),
    /// Attached to the identifier/password pair without saying which was wrong.
    Credentials(String),
    Captcha(String),
    Locked { seconds: u64 },
    Network(String),
    Server(String),
    /// Scoped to the two-factor view.
    TwoFactor(String),
}

impl fmt::Display for Feedback {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Local(message)
            | Self::Credentials(message)
            | Self::Captcha(message)
            | Self::Network(message)
            | Self::Server(message)
            | Self::TwoFactor(message) => f.write_str(message),
            Self::Locked { seconds } => write!(
                f,
                "Too many failed attempts. Try again in {seconds} seconds."
            ),
        }
    }
}

/// Read-only view of the in-flight flag, for disabling a submit control.
#[derive(Clone, Debug)]
pub struct SubmittingHandle(Arc<AtomicBool>);

impl SubmittingHandle {
    #[must_use]
    pub fn is_submitting(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }
}

// Finalization for every submit: clears the flag however the call ends.
struct SubmittingGuard(Arc<AtomicBool>);

impl SubmittingGuard {
    fn engage(flag: &Arc<AtomicBool>) -> Self {
        flag.store(true, Ordering::SeqCst);
        Self(Arc::clone(flag))
    }
}

impl Drop for SubmittingGuard {
    fn drop(&mut self) {
        self.0.store(false, Ordering::SeqCst);
    }
}

// Holds `Submitting` while a request is in flight. A dropped request puts
// the previous state back so the state never outlives the flag.
struct PendingState<'a> {
    state: &'a mut LoginState,
    previous: LoginState,
}

impl<'a> PendingState<'a> {
    fn enter(state: &'a mut LoginState) -> Self {
        let previous = std::mem::replace(state, LoginState::Submitting);
        Self { state, previous }
    }
}

impl Drop for PendingState<'_> {
    fn drop(&mut self) {
        *self.state = self.previous;
    }
}

pub struct LoginController<A> {
    api: A,
    store: Arc<SessionStore>,
    navigator: Arc<dyn Navigator>,
    session_id: String,
    identifier: String,
    password: SecretString,
    remember_me: bool,
    captcha: CaptchaChallenge,
    state: LoginState,
    feedback: Option<Feedback>,
    submitting: Arc<AtomicBool>,
    lockout: LockoutTimer,
    two_factor: Option<TwoFactorStep>,
}

impl<A: AuthApi> LoginController<A> {
    #[must_use]
    pub fn new(api: A, store: Arc<SessionStore>, navigator: Arc<dyn Navigator>) -> Self {
        Self::with_captcha(api, store, navigator, CaptchaChallenge::new())
    }

    #[must_use]
    pub fn with_captcha(
        api: A,
        store: Arc<SessionStore>,
        navigator: Arc<dyn Navigator>,
        captcha: CaptchaChallenge,
    ) -> Self {
        Self {
            api,
            store,
            navigator,
            session_id: Ulid::new().to_string(),
            identifier: String::new(),
            password: SecretString::default(),
            remember_me: false,
            captcha,
            state: LoginState::Idle,
            feedback: None,
            submitting: Arc::new(AtomicBool::new(false)),
            lockout: LockoutTimer::new(),
            two_factor: None,
        }
    }

    pub fn set_identifier(&mut self, identifier: &str) {
        self.identifier = identifier.to_string();
    }

    pub fn set_password(&mut self, password: SecretString) {
        self.password = password;
    }

    pub fn set_remember_me(&mut self, remember_me: bool) {
        self.remember_me = remember_me;
    }

    pub fn set_captcha_input(&mut self, input: &str) {
        self.captcha.set_input(input);
    }

    /// Checks the typed CAPTCHA answer locally.
    pub fn verify_captcha(&mut self) -> CaptchaCheck {
        let check = self.captcha.check();
        self.feedback = match check {
            CaptchaCheck::Verified => None,
            CaptchaCheck::Mismatch { attempts_left } => Some(Feedback::Captcha(format!(
                "The CAPTCHA does not match. {attempts_left} attempt(s) left."
            ))),
            CaptchaCheck::Regenerated => Some(Feedback::Captcha(
                "Too many wrong answers. A new CAPTCHA has been generated.".to_string(),
            )),
        };
        check
    }

    pub fn refresh_captcha(&mut self) {
        self.captcha.regenerate();
    }

    #[must_use]
    pub fn captcha(&self) -> &CaptchaChallenge {
        &self.captcha
    }

    #[must_use]
    pub fn state(&self) -> LoginState {
        self.state
    }

    #[must_use]
    pub fn feedback(&self) -> Option<&Feedback> {
        self.feedback.as_ref()
    }

    #[must_use]
    pub fn session_id(&self) -> &str {
        &self.session_id
    }

    #[must_use]
    pub fn is_submitting(&self) -> bool {
        self.submitting.load(Ordering::SeqCst)
    }

    #[must_use]
    pub fn submitting_handle(&self) -> SubmittingHandle {
        SubmittingHandle(Arc::clone(&self.submitting))
    }

    #[must_use]
    pub fn lockout(&self) -> &LockoutTimer {
        &self.lockout
    }

    #[must_use]
    pub fn lockout_seconds_remaining(&self) -> u64 {
        self.lockout.remaining()
    }

    #[must_use]
    pub fn two_factor(&self) -> Option<&TwoFactorStep> {
        self.two_factor.as_ref()
    }

    pub fn set_otp_code(&mut self, input: &str) {
        if let Some(step) = self.two_factor.as_mut() {
            step.set_code(input);
        }
    }

    /// True when a credential submit would reach the network.
    #[must_use]
    pub fn can_submit(&self) -> bool {
        self.local_rejection().is_none()
    }

    fn local_rejection(&self) -> Option<String> {
        if self.two_factor.is_some() {
            return Some(MSG_TWO_FACTOR_PENDING.to_string());
        }
        if self.is_submitting() {
            return Some(MSG_IN_PROGRESS.to_string());
        }
        let remaining = self.lockout.remaining();
        if remaining > 0 {
            return Some(Feedback::Locked { seconds: remaining }.to_string());
        }
        if !self.captcha.is_verified() {
            return Some(MSG_CAPTCHA_REQUIRED.to_string());
        }
        if self.identifier.trim().is_empty() || self.password.expose_secret().is_empty() {
            return Some(MSG_FIELDS_REQUIRED.to_string());
        }
        None
    }

    /// Submits the credentials. Returns the resulting state; the outcome
    /// details are available through [`Self::feedback`].
    pub async fn submit(&mut self) -> LoginState {
        if let Some(reason) = self.local_rejection() {
            debug!("login rejected locally");
            self.feedback = Some(Feedback::Local(reason));
            return self.state;
        }

        let _guard = SubmittingGuard::engage(&self.submitting);
        let identifier = self.identifier.trim().to_string();
        let remember_me = self.remember_me;
        let captcha_input = self.captcha.user_input().trim().to_string();
        self.feedback = None;

        let request = LoginRequest {
            identifier: &identifier,
            password: self.password.expose_secret(),
            captcha_input: &captcha_input,
            session_id: &self.session_id,
        };
        let result = {
            let _pending = PendingState::enter(&mut self.state);
            self.api.login(&request).await
        };

        self.state = match result {
            Ok(LoginReply::Authenticated { access_token }) => {
                self.establish_session(&access_token, &identifier, remember_me)
            }
            Ok(LoginReply::TwoFactorRequired { pre_auth_token }) => {
                info!("second factor required");
                self.two_factor = Some(TwoFactorStep::new(pre_auth_token, &identifier, remember_me));
                LoginState::TwoFactorRequired
            }
            Err(err) => self.login_failure(err),
        };
        self.state
    }

    /// Submits the pending two-factor code.
    pub async fn verify_two_factor(&mut self) -> LoginState {
        let rejection = match self.two_factor.as_ref() {
            None => Some("No two-factor verification is pending."),
            Some(_) if self.is_submitting() => Some(MSG_IN_PROGRESS),
            Some(step) if !step.can_verify() => Some(MSG_OTP_INCOMPLETE),
            Some(_) => None,
        };
        if let Some(reason) = rejection {
            self.feedback = Some(Feedback::Local(reason.to_string()));
            return self.state;
        }

        let _guard = SubmittingGuard::engage(&self.submitting);
        self.feedback = None;

        let result = match self.two_factor.as_ref() {
            Some(step) => self.api.verify_two_factor(&step.request()).await,
            None => return self.state,
        };

        self.state = match result {
            Ok(access_token) => match self.two_factor.take() {
                Some(step) => {
                    self.establish_session(&access_token, step.identifier(), step.remember_me())
                }
                None => LoginState::Idle,
            },
            Err(err) => self.two_factor_failure(err),
        };
        self.state
    }

    /// Abandons the two-factor step and returns to the credential form.
    pub fn back_to_login(&mut self) {
        if self.two_factor.take().is_some() {
            debug!("two-factor step abandoned");
        }
        self.state = LoginState::Idle;
        self.feedback = None;
    }

    fn establish_session(
        &mut self,
        access_token: &str,
        identifier: &str,
        remember_me: bool,
    ) -> LoginState {
        let session = Session::from_access_token(access_token, identifier, Utc::now());
        if let Err(err) = self.store.save(&session, remember_me) {
            warn!("failed to save session: {err}");
            self.feedback = Some(Feedback::Server(format!(
                "Signed in, but the session could not be saved: {err}"
            )));
            return LoginState::ServerError;
        }

        info!(remember_me, "login succeeded");
        self.password = SecretString::default();
        self.lockout.cancel();
        self.navigator.navigate(Route::authenticated_landing());
        LoginState::Success
    }

    fn login_failure(&mut self, err: AppError) -> LoginState {
        if err.is_transport() {
            debug!("login transport failure: {err}");
            self.feedback = Some(Feedback::Network(MSG_NETWORK.to_string()));
            return LoginState::NetworkError;
        }

        match err {
            AppError::Api { status, detail } => self.login_rejection(status, &detail),
            AppError::Http { status, message } => {
                self.login_rejection(status, &ErrorDetail::with_message(message))
            }
            other => {
                warn!("login failed: {other}");
                self.feedback = Some(Feedback::Server(other.to_string()));
                LoginState::ServerError
            }
        }
    }

    fn login_rejection(&mut self, status: u16, detail: &ErrorDetail) -> LoginState {
        if detail.code_is(codes::INVALID_CAPTCHA) {
            self.captcha.regenerate();
            self.feedback = Some(Feedback::Captcha(MSG_CAPTCHA_REJECTED.to_string()));
            return LoginState::FieldError;
        }

        if status == 429
            || detail.code_is(codes::ACCOUNT_LOCKED)
            || detail.code_is(codes::TOO_MANY_ATTEMPTS)
        {
            let seconds = detail.wait_seconds().unwrap_or(DEFAULT_LOCKOUT_SECS).max(1);
            warn!(seconds, "login locked out");
            self.lockout.start(seconds);
            self.feedback = Some(Feedback::Locked { seconds });
            return LoginState::LockedOut;
        }

        if status == 401 || detail.code_is(codes::INVALID_CREDENTIALS) {
            self.feedback = Some(Feedback::Credentials(MSG_CREDENTIALS.to_string()));
            return LoginState::FieldError;
        }

        warn!(status, "login failed");
        self.feedback = Some(Feedback::Server(server_message(status, detail)));
        LoginState::ServerError
    }

    fn two_factor_failure(&mut self, err: AppError) -> LoginState {
        if err.is_transport() {
            self.feedback = Some(Feedback::Network(MSG_NETWORK.to_string()));
            return self.state;
        }

        let (status, detail) = match err {
            AppError::Api { status, detail } => (Some(status), detail),
            AppError::Http { status, message } => (Some(status), ErrorDetail::with_message(message)),
            other => (None, ErrorDetail::with_message(other.to_string())),
        };

        if detail.code_is(codes::PRE_AUTH_EXPIRED) {
            info!("pre-auth token expired");
            self.two_factor = None;
            self.feedback = Some(Feedback::Local(MSG_PRE_AUTH_EXPIRED.to_string()));
            return LoginState::Idle;
        }

        let message = match status {
            Some(400 | 401 | 422) => MSG_OTP_INVALID.to_string(),
            _ if detail.code_is(codes::INVALID_OTP) => MSG_OTP_INVALID.to_string(),
            Some(status) => server_message(status, &detail),
            None => detail.message.clone(),
        };
        if let Some(step) = self.two_factor.as_mut() {
            step.record_failure(message.clone());
        }
        self.feedback = Some(Feedback::TwoFactor(message));
        LoginState::TwoFactorRequired
    }
}

fn server_message(status: u16, detail: &ErrorDetail) -> String {
    if detail.message.trim().is_empty() {
        format!("The server could not process the request ({status}). Please try again.")
    } else {
        detail.message.clone()
    }
}
