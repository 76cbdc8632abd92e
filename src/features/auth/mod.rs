//! Auth feature module: CAPTCHA gate, credential submission, two-factor step,
//! lockout countdown, session persistence and route guarding. It keeps the
//! login state machine out of any rendering layer and must stay aligned with
//! the backend error codes. This module touches security boundaries and must
//! never log passwords, access tokens, pre-auth tokens or OTP codes.
//!
//! Flow Overview: the controller refuses to reach the network until the
//! CAPTCHA is verified and no lockout is running. A `200` login stores the
//! session and navigates to the dashboard, a `202` switches to the two-factor
//! step, a `429` starts the countdown. Transport failures never consume the
//! CAPTCHA.

pub mod captcha;
pub mod client;
pub mod guards;
pub mod lockout;
pub mod login;
pub mod navigation;
pub mod session;
pub mod storage;
pub mod token;
pub mod two_factor;
pub mod types;

pub use client::{AuthApi, HttpAuthApi};
pub use guards::{AuthStatus, GuardView, RouteGuard};
pub use login::{Feedback, LoginController, LoginState};
pub use navigation::{History, Navigator, Route};
pub use session::{Session, SessionStore, User};
