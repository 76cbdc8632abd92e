use crate::{
    api::{ApiClient, AppConfig, AppError},
    features::auth::SessionStore,
};
use std::sync::Arc;

/// Settings shared by every action.
#[derive(Debug, Clone)]
pub struct GlobalArgs {
    pub config: AppConfig,
}

impl GlobalArgs {
    #[must_use]
    pub fn new(config: AppConfig) -> Self {
        Self { config }
    }

    /// HTTP client bound to the configured backend.
    ///
    /// # Errors
    /// Returns [`AppError::Config`] when the base URL is invalid.
    pub fn api_client(&self) -> Result<ApiClient, AppError> {
        ApiClient::new(&self.config)
    }

    /// Session store over the durable file in the data directory.
    #[must_use]
    pub fn session_store(&self) -> Arc<SessionStore> {
        Arc::new(SessionStore::open(self.config.data_dir()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::features::auth::Session;
    use chrono::Utc;
    use std::{path::PathBuf, time::Duration};

    fn globals(data_dir: PathBuf, api_base_url: &str) -> GlobalArgs {
        GlobalArgs::new(AppConfig {
            api_base_url: api_base_url.to_string(),
            data_dir,
            request_timeout: Duration::from_secs(5),
        })
    }

    #[test]
    fn rejects_invalid_base_url() {
        let globals = globals(PathBuf::from("/tmp"), "ftp://eq.test");
        assert!(matches!(globals.api_client(), Err(AppError::Config(_))));
    }

    #[test]
    fn session_store_uses_data_dir() {
        let dir = tempfile::tempdir().expect("tempdir");
        let globals = globals(dir.path().to_path_buf(), "http://localhost:8000");
        let session = Session::from_access_token("token-1", "ada@eq.test", Utc::now());

        globals.session_store().save(&session, true).expect("save");

        assert_eq!(globals.session_store().get(), Some(session));
    }
}
