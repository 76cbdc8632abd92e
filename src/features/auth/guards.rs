//! Route guard for views that require a session.
//!
//! This is a UX guard only; real access control lives on the API.

use super::{
    navigation::{Navigator, Route},
    session::{Session, SessionStore},
};
use std::sync::Arc;
use tracing::debug;

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum AuthStatus {
    Pending,
    Authenticated(Session),
    Unauthenticated,
}

/// What a guarded view should show for the current status.
#[derive(Debug, PartialEq, Eq)]
pub enum GuardView<T> {
    Loading,
    Redirecting,
    Protected(T),
}

pub struct RouteGuard {
    store: Arc<SessionStore>,
    navigator: Arc<dyn Navigator>,
    status: AuthStatus,
    redirected: bool,
}

impl RouteGuard {
    #[must_use]
    pub fn new(store: Arc<SessionStore>, navigator: Arc<dyn Navigator>) -> Self {
        Self {
            store,
            navigator,
            status: AuthStatus::Pending,
            redirected: false,
        }
    }

    /// Reads the session store and resolves the guard.
    pub fn mount(&mut self) -> &AuthStatus {
        let session = self.store.get();
        self.resolve(session)
    }

    /// Resolves the guard from an externally performed check.
    pub fn resolve(&mut self, session: Option<Session>) -> &AuthStatus {
        self.status = match session {
            Some(session) => AuthStatus::Authenticated(session),
            None => AuthStatus::Unauthenticated,
        };

        if self.status == AuthStatus::Unauthenticated && !self.redirected {
            debug!("guarded route without session, redirecting to login");
            self.redirected = true;
            self.navigator.navigate(Route::Login);
        }
        &self.status
    }

    #[must_use]
    pub fn status(&self) -> &AuthStatus {
        &self.status
    }

    /// Renders the protected subtree only once a session is confirmed.
    pub fn render<T>(&self, protected: impl FnOnce(&Session) -> T) -> GuardView<T> {
        match &self.status {
            AuthStatus::Pending => GuardView::Loading,
            AuthStatus::Unauthenticated => GuardView::Redirecting,
            AuthStatus::Authenticated(session) => GuardView::Protected(protected(session)),
        }
    }
}
