//! Client seam for the login endpoints. Controllers depend on [`AuthApi`]
//! so they can be driven by the HTTP client in production and by scripted
//! replies in tests.

use super::types::{LoginReply, LoginRequest, LoginResponseBody, TwoFactorRequest};
use crate::api::{
    ApiClient, AppError,
    http::{error_from_response, handle_json_response},
};
use secrecy::SecretString;
use std::future::Future;

pub const LOGIN_PATH: &str = "/auth/login";
pub const LOGIN_TWO_FACTOR_PATH: &str = "/auth/login/2fa";

pub trait AuthApi: Send + Sync {
    /// Submits primary credentials.
    fn login(
        &self,
        request: &LoginRequest<'_>,
    ) -> impl Future<Output = Result<LoginReply, AppError>> + Send;

    /// Completes a pending two-factor login and returns the access token.
    fn verify_two_factor(
        &self,
        request: &TwoFactorRequest<'_>,
    ) -> impl Future<Output = Result<String, AppError>> + Send;
}

#[derive(Clone, Debug)]
pub struct HttpAuthApi {
    api: ApiClient,
}

impl HttpAuthApi {
    #[must_use]
    pub fn new(api: ApiClient) -> Self {
        Self { api }
    }
}

impl AuthApi for HttpAuthApi {
    async fn login(&self, request: &LoginRequest<'_>) -> Result<LoginReply, AppError> {
        let response = self.api.post_json(LOGIN_PATH, request).await?;
        let status = response.status();
        if !status.is_success() {
            return Err(error_from_response(response).await);
        }

        let body: LoginResponseBody = response
            .json()
            .await
            .map_err(|err| AppError::Parse(format!("Failed to decode login response: {err}")))?;
        classify_login_body(status.as_u16(), body)
    }

    async fn verify_two_factor(&self, request: &TwoFactorRequest<'_>) -> Result<String, AppError> {
        let response = self.api.post_json(LOGIN_TWO_FACTOR_PATH, request).await?;
        let body: LoginResponseBody = handle_json_response(response).await?;
        body.access_token
            .filter(|token| !token.trim().is_empty())
            .ok_or_else(|| AppError::Parse("Two-factor response carried no access token.".to_string()))
    }
}

/// `202`, or any success carrying only a pre-auth token, means a second
/// factor is required.
fn classify_login_body(status: u16, body: LoginResponseBody) -> Result<LoginReply, AppError> {
    let access_token = body.access_token.filter(|token| !token.trim().is_empty());
    let pre_auth_token = body.pre_auth_token.filter(|token| !token.trim().is_empty());

    match (status, access_token, pre_auth_token) {
        (202, _, Some(pre_auth_token)) | (_, None, Some(pre_auth_token)) => {
            Ok(LoginReply::TwoFactorRequired {
                pre_auth_token: SecretString::from(pre_auth_token),
            })
        }
        (_, Some(access_token), _) => Ok(LoginReply::Authenticated { access_token }),
        (_, None, None) => Err(AppError::Parse(
            "Login response carried neither an access token nor a pre-auth token.".to_string(),
        )),
    }
}
