//! Scripted mock backend for integration tests.
//!
//! Each path owns a queue of replies; requests are recorded with their JSON
//! bodies so tests can assert on what the client sent.

#![allow(dead_code)]

use anyhow::Result;
use axum::{
    Json, Router,
    body::Bytes,
    extract::State,
    http::{HeaderValue, Method, StatusCode, Uri},
    response::{IntoResponse, Response},
};
use base64ct::{Base64UrlUnpadded, Encoding};
use eq_portal::{
    api::{ApiClient, AppConfig},
    features::auth::{
        History, HttpAuthApi, LoginController, SessionStore, captcha::CaptchaChallenge,
    },
};
use secrecy::SecretString;
use serde_json::{Value, json};
use std::{
    collections::{HashMap, VecDeque},
    path::Path,
    sync::{Arc, Mutex},
    time::Duration,
};
use tokio::net::TcpListener;

pub const CAPTCHA_CODE: &str = "Xk7Pq";

pub struct Reply {
    status: StatusCode,
    body: Value,
    retry_after: Option<u64>,
    delay: Option<Duration>,
}

impl Reply {
    pub fn json(status: u16, body: Value) -> Self {
        Self {
            status: StatusCode::from_u16(status).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR),
            body,
            retry_after: None,
            delay: None,
        }
    }

    pub fn error(status: u16, code: &str, details: Option<Value>) -> Self {
        let mut detail = json!({ "code": code, "message": format!("{code} from backend") });
        if let Some(details) = details {
            detail["details"] = details;
        }
        Self::json(status, json!({ "detail": detail }))
    }

    pub fn retry_after(mut self, seconds: u64) -> Self {
        self.retry_after = Some(seconds);
        self
    }

    pub fn delayed(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }
}

#[derive(Default)]
pub struct MockBackend {
    replies: Mutex<HashMap<String, VecDeque<Reply>>>,
    requests: Mutex<Vec<(String, Value)>>,
}

impl MockBackend {
    pub fn script(&self, path: &str, reply: Reply) {
        self.replies
            .lock()
            .unwrap()
            .entry(path.to_string())
            .or_default()
            .push_back(reply);
    }

    /// JSON bodies received on `path`, oldest first.
    pub fn requests_to(&self, path: &str) -> Vec<Value> {
        self.requests
            .lock()
            .unwrap()
            .iter()
            .filter(|(p, _)| p == path)
            .map(|(_, body)| body.clone())
            .collect()
    }
}

async fn handle(
    State(backend): State<Arc<MockBackend>>,
    method: Method,
    uri: Uri,
    body: Bytes,
) -> Response {
    let path = uri.path().to_string();
    let payload = serde_json::from_slice(&body).unwrap_or(Value::Null);
    backend
        .requests
        .lock()
        .unwrap()
        .push((path.clone(), payload));

    let reply = backend
        .replies
        .lock()
        .unwrap()
        .get_mut(&path)
        .and_then(VecDeque::pop_front);

    let Some(reply) = reply else {
        return (
            StatusCode::NOT_FOUND,
            Json(json!({ "detail": format!("no scripted reply for {method} {path}") })),
        )
            .into_response();
    };

    if let Some(delay) = reply.delay {
        tokio::time::sleep(delay).await;
    }
    let mut response = (reply.status, Json(reply.body)).into_response();
    if let Some(seconds) = reply.retry_after {
        response
            .headers_mut()
            .insert("retry-after", HeaderValue::from(seconds));
    }
    response
}

/// Serves the backend on an ephemeral local port and returns its base URL.
pub async fn spawn(backend: Arc<MockBackend>) -> Result<String> {
    let app = Router::new().fallback(handle).with_state(backend);
    let listener = TcpListener::bind("127.0.0.1:0").await?;
    let addr = listener.local_addr()?;
    tokio::spawn(async move {
        let _ = axum::serve(listener, app).await;
    });
    Ok(format!("http://{addr}"))
}

pub fn config(base_url: &str, data_dir: &Path, timeout: Duration) -> AppConfig {
    AppConfig {
        api_base_url: base_url.to_string(),
        data_dir: data_dir.to_path_buf(),
        request_timeout: timeout,
    }
}

/// Unsigned JWT carrying the identity claims the client reads.
pub fn access_token(sub: &str, email: &str, name: &str) -> String {
    let header = Base64UrlUnpadded::encode_string(br#"{"alg":"none","typ":"JWT"}"#);
    let claims = json!({ "sub": sub, "email": email, "name": name, "exp": 4_102_444_800_i64 });
    let payload = Base64UrlUnpadded::encode_string(claims.to_string().as_bytes());
    format!("{header}.{payload}.signature")
}

pub struct Flow {
    pub backend: Arc<MockBackend>,
    pub store: Arc<SessionStore>,
    pub history: Arc<History>,
    pub controller: LoginController<HttpAuthApi>,
    pub data_dir: tempfile::TempDir,
}

/// Controller wired to a fresh mock backend, with the CAPTCHA already solved.
pub async fn login_flow(timeout: Duration) -> Result<Flow> {
    let backend = Arc::new(MockBackend::default());
    let base_url = spawn(backend.clone()).await?;
    let data_dir = tempfile::tempdir()?;
    let api = ApiClient::new(&config(&base_url, data_dir.path(), timeout))?;
    let store = Arc::new(SessionStore::open(data_dir.path()));
    let history = Arc::new(History::new());

    let mut controller = LoginController::with_captcha(
        HttpAuthApi::new(api),
        store.clone(),
        history.clone(),
        CaptchaChallenge::with_code(CAPTCHA_CODE),
    );
    controller.set_identifier("ada@eq.test");
    controller.set_password(SecretString::from("correct horse 1"));
    controller.set_captcha_input(&CAPTCHA_CODE.to_lowercase());
    controller.verify_captcha();

    Ok(Flow {
        backend,
        store,
        history,
        controller,
        data_dir,
    })
}
