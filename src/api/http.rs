//! HTTP helpers for JSON APIs with a fixed deadline and consistent error
//! mapping. The client never logs request bodies; callers attach tokens
//! explicitly.

use super::{
    config::AppConfig,
    errors::{AppError, parse_error_detail},
};
use crate::APP_USER_AGENT;
use reqwest::{Client, Response, header::RETRY_AFTER};
use serde::{Serialize, de::DeserializeOwned};
use tracing::debug;

/// Maximum number of error body characters surfaced to the user.
const MAX_ERROR_CHARS: usize = 200;

#[derive(Clone, Debug)]
pub struct ApiClient {
    http: Client,
    base_url: String,
}

impl ApiClient {
    /// Builds a client bound to the configured base URL and request deadline.
    ///
    /// # Errors
    /// Returns [`AppError::Config`] when the base URL is invalid or the HTTP
    /// client cannot be constructed.
    pub fn new(config: &AppConfig) -> Result<Self, AppError> {
        config.validate()?;
        let http = Client::builder()
            .user_agent(format!("{APP_USER_AGENT} ({})", crate::GIT_COMMIT_HASH))
            .timeout(config.request_timeout)
            .build()
            .map_err(|err| AppError::Config(format!("Failed to build HTTP client: {err}")))?;

        Ok(Self {
            http,
            base_url: config.api_base_url.clone(),
        })
    }

    #[must_use]
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    #[must_use]
    pub fn url(&self, path: &str) -> String {
        build_url_with_base(&self.base_url, path)
    }

    /// Fetches JSON and parses it into `T`.
    ///
    /// # Errors
    /// Returns transport, HTTP or parse errors as [`AppError`].
    pub async fn get_json<T: DeserializeOwned>(&self, path: &str) -> Result<T, AppError> {
        let url = self.url(path);
        debug!(%url, "GET");
        let response = self.http.get(&url).send().await.map_err(map_request_error)?;
        handle_json_response(response).await
    }

    /// Posts JSON and returns the raw response so callers can branch on status.
    ///
    /// # Errors
    /// Returns transport errors only; HTTP status handling is left to the caller.
    pub async fn post_json<B: Serialize + ?Sized>(
        &self,
        path: &str,
        body: &B,
    ) -> Result<Response, AppError> {
        let url = self.url(path);
        debug!(%url, "POST");
        self.http
            .post(&url)
            .json(body)
            .send()
            .await
            .map_err(map_request_error)
    }

    /// Posts JSON and parses a JSON response.
    ///
    /// # Errors
    /// Returns transport, HTTP or parse errors as [`AppError`].
    pub async fn post_json_response<B: Serialize + ?Sized, T: DeserializeOwned>(
        &self,
        path: &str,
        body: &B,
    ) -> Result<T, AppError> {
        let response = self.post_json(path, body).await?;
        handle_json_response(response).await
    }

    /// Posts JSON and ignores the response body on success.
    ///
    /// # Errors
    /// Returns transport or HTTP errors as [`AppError`].
    pub async fn post_json_empty<B: Serialize + ?Sized>(
        &self,
        path: &str,
        body: &B,
    ) -> Result<(), AppError> {
        let response = self.post_json(path, body).await?;
        handle_empty_response(response).await
    }
}

/// Builds a URL from an explicit base URL and the provided path.
fn build_url_with_base(base_url: &str, path: &str) -> String {
    let base = base_url.trim().trim_end_matches('/');
    let path = path.trim();

    if base.is_empty() {
        path.to_string()
    } else {
        format!("{}/{}", base, path.trim_start_matches('/'))
    }
}

/// Maps reqwest failures into transport errors with timeout detection.
fn map_request_error(err: reqwest::Error) -> AppError {
    if err.is_timeout() {
        AppError::Timeout("Request timed out. Please try again.".to_string())
    } else if err.is_builder() {
        AppError::Serialization(format!("Failed to build request: {err}"))
    } else {
        AppError::Network(format!("Unable to reach the server: {err}"))
    }
}

/// Parses JSON responses and surfaces HTTP errors with sanitized bodies.
///
/// # Errors
/// Returns [`AppError::Parse`] for undecodable bodies and the mapped HTTP error otherwise.
pub async fn handle_json_response<T: DeserializeOwned>(response: Response) -> Result<T, AppError> {
    if response.status().is_success() {
        response
            .json::<T>()
            .await
            .map_err(|err| AppError::Parse(format!("Failed to decode response: {err}")))
    } else {
        Err(error_from_response(response).await)
    }
}

async fn handle_empty_response(response: Response) -> Result<(), AppError> {
    if response.status().is_success() {
        Ok(())
    } else {
        Err(error_from_response(response).await)
    }
}

/// Converts a non-success response into [`AppError::Api`] when the body uses
/// the `detail` envelope, or [`AppError::Http`] with a sanitized body otherwise.
pub async fn error_from_response(response: Response) -> AppError {
    let status = response.status().as_u16();
    let retry_after = response
        .headers()
        .get(RETRY_AFTER)
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.trim().parse::<u64>().ok());
    let body = response.text().await.unwrap_or_default();

    match parse_error_detail(&body) {
        Some(mut detail) => {
            detail.message = sanitize_body(&detail.message);
            detail.retry_after = retry_after;
            AppError::Api { status, detail }
        }
        None => AppError::Http {
            status,
            message: sanitize_body(&body),
        },
    }
}

/// Trims and truncates error bodies for user-facing messages.
fn sanitize_body(body: &str) -> String {
    let trimmed = body.trim();
    if trimmed.is_empty() {
        "Request failed.".to_string()
    } else {
        trimmed.chars().take(MAX_ERROR_CHARS).collect()
    }
}
