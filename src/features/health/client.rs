use super::types::HealthStatus;
use crate::api::{ApiClient, AppError};

pub const HEALTH_PATH: &str = "/health";

/// Fetches the backend health document.
///
/// # Errors
/// Returns transport, HTTP or parse errors as [`AppError`].
pub async fn fetch_health(api: &ApiClient) -> Result<HealthStatus, AppError> {
    api.get_json(HEALTH_PATH).await
}
