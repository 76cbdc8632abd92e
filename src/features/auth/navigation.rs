//! Routes the auth flows can send the user to, and the navigation seam that
//! controllers call instead of touching a router directly.

use std::sync::Mutex;
use tracing::debug;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Route {
    Home,
    Login,
    Register,
    ForgotPassword,
    Dashboard,
    Exam,
    Results,
    Community,
}

impl Route {
    #[must_use]
    pub const fn path(self) -> &'static str {
        match self {
            Self::Home => "/",
            Self::Login => "/login",
            Self::Register => "/register",
            Self::ForgotPassword => "/forgot-password",
            Self::Dashboard => "/dashboard",
            Self::Exam => "/exam",
            Self::Results => "/results",
            Self::Community => "/community",
        }
    }

    /// Landing route after a successful login or two-factor verification.
    #[must_use]
    pub const fn authenticated_landing() -> Self {
        Self::Dashboard
    }
}

pub trait Navigator: Send + Sync {
    fn navigate(&self, route: Route);
}

/// In-memory navigation history.
#[derive(Debug, Default)]
pub struct History {
    visits: Mutex<Vec<Route>>,
}

impl History {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn current(&self) -> Option<Route> {
        self.visits
            .lock()
            .ok()
            .and_then(|visits| visits.last().copied())
    }

    #[must_use]
    pub fn visits(&self) -> Vec<Route> {
        self.visits
            .lock()
            .map(|visits| visits.clone())
            .unwrap_or_default()
    }
}

impl Navigator for History {
    fn navigate(&self, route: Route) {
        debug!(path = route.path(), "navigate");
        if let Ok(mut visits) = self.visits.lock() {
            visits.push(route);
        }
    }
}
