use crate::{cli::globals::GlobalArgs, features::health::fetch_health};
use anyhow::{Context, Result, bail};

/// Probes the backend and prints its status.
/// # Errors
/// Returns an error if the backend is unreachable or reports an unhealthy status.
pub async fn execute(globals: &GlobalArgs) -> Result<()> {
    let api = globals.api_client()?;
    let health = fetch_health(&api)
        .await
        .with_context(|| format!("health check against {} failed", api.base_url()))?;

    println!("status: {}", health.status);
    if let Some(version) = &health.version {
        println!("version: {version}");
    }
    println!(
        "mock auth: {}",
        if health.mock_auth_enabled() {
            "enabled"
        } else {
            "disabled"
        }
    );

    if !health.is_healthy() {
        bail!("backend reports status {}", health.status);
    }
    Ok(())
}
