use serde::Deserialize;

#[derive(Clone, Debug, Default, Deserialize, PartialEq, Eq)]
pub struct HealthStatus {
    pub status: String,
    #[serde(default)]
    pub version: Option<String>,
    /// Set when the backend accepts any credentials (local development).
    #[serde(default, alias = "mockAuth", alias = "mock_auth_mode")]
    pub mock_auth: Option<bool>,
}

impl HealthStatus {
    #[must_use]
    pub fn is_healthy(&self) -> bool {
        matches!(
            self.status.trim().to_ascii_lowercase().as_str(),
            "ok" | "healthy" | "up"
        )
    }

    #[must_use]
    pub fn mock_auth_enabled(&self) -> bool {
        self.mock_auth.unwrap_or(false)
    }
}
