//! # EQ Portal
//!
//! `eq-portal` is the authentication and session client for the EQ assessment
//! portal. It owns the pieces of the frontend that carry real state: the
//! CAPTCHA gate, the credential submission flow, the two-factor step, the
//! lockout countdown, the session store and the route guard that consumes it.
//!
//! ## Login Flow
//!
//! 1. **Challenge:** A five character CAPTCHA is generated and rendered with
//!    noise onto a drawing surface. The user must verify it locally before
//!    anything reaches the network.
//! 2. **Submit:** `POST /auth/login` carries the identifier, password, the
//!    CAPTCHA answer and the form session id.
//! 3. **Branch:** `200` yields an access token and a persisted session, `202`
//!    yields a pre-auth token for the two-factor step, `401` surfaces a
//!    credential (or CAPTCHA) error, `429` starts a lockout countdown.
//! 4. **Two-factor:** `POST /auth/login/2fa` trades the pre-auth token and a
//!    six digit code for the access token.
//!
//! Sessions persist to a durable file store when remember-me is set and to
//! process memory otherwise. Tokens and passwords are never logged.

pub mod api;
pub mod cli;
pub mod features;

#[allow(clippy::doc_markdown, clippy::needless_raw_string_hashes)]
pub(crate) mod built_info {
    include!(concat!(env!("OUT_DIR"), "/built.rs"));
}

pub const GIT_COMMIT_HASH: &str = match built_info::GIT_COMMIT_HASH {
    Some(hash) => hash,
    None => "unknown",
};

pub const APP_USER_AGENT: &str = concat!(env!("CARGO_PKG_NAME"), "/", env!("CARGO_PKG_VERSION"));
