use crate::{
    cli::globals::GlobalArgs,
    features::auth::{GuardView, History, RouteGuard, Session},
};
use anyhow::{Context, Result, bail};
use std::sync::Arc;
use tracing::info;

/// Prints the signed-in user, behind the same guard as protected views.
/// # Errors
/// Returns an error when no valid session is stored.
pub fn whoami(globals: &GlobalArgs) -> Result<()> {
    let mut guard = RouteGuard::new(globals.session_store(), Arc::new(History::new()));
    guard.mount();

    match guard.render(describe) {
        GuardView::Protected(text) => {
            println!("{text}");
            Ok(())
        }
        GuardView::Redirecting => bail!("Not signed in. Run `eq-portal login` first."),
        GuardView::Loading => bail!("Session check did not complete."),
    }
}

/// Clears both session areas.
/// # Errors
/// Returns an error if the durable store cannot be written.
pub fn logout(globals: &GlobalArgs) -> Result<()> {
    let store = globals.session_store();
    let existed = store.get().is_some();
    store.clear().context("failed to clear the stored session")?;
    info!(existed, "signed out");

    if existed {
        println!("Signed out.");
    } else {
        println!("No active session.");
    }
    Ok(())
}

fn describe(session: &Session) -> String {
    let user = &session.user;
    let who = if user.email.is_empty() || user.email == user.name {
        user.name.clone()
    } else {
        format!("{} <{}>", user.name, user.email)
    };
    format!(
        "{who} (session expires {})",
        session.expires_at.format("%Y-%m-%d %H:%M UTC")
    )
}
