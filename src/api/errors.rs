use serde::Deserialize;
use serde_json::Value;
use thiserror::Error;

/// Structured error body returned by the backend under `detail`.
#[derive(Clone, Debug, Default, Deserialize, PartialEq)]
pub struct ErrorDetail {
    #[serde(default)]
    pub code: String,
    #[serde(default)]
    pub message: String,
    #[serde(default)]
    pub details: Option<Value>,
    /// Seconds from a `Retry-After` header, when the response carried one.
    #[serde(skip)]
    pub retry_after: Option<u64>,
}

impl ErrorDetail {
    #[must_use]
    pub fn with_message(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            ..Self::default()
        }
    }

    /// Case-insensitive comparison against one of the backend error codes.
    #[must_use]
    pub fn code_is(&self, code: &str) -> bool {
        self.code.trim().eq_ignore_ascii_case(code)
    }

    /// Lockout duration from `details.wait_seconds`, falling back to `Retry-After`.
    #[must_use]
    pub fn wait_seconds(&self) -> Option<u64> {
        let from_details = self
            .details
            .as_ref()
            .and_then(|details| details.get("wait_seconds"))
            .and_then(|value| match value {
                Value::Number(number) => number
                    .as_u64()
                    .or_else(|| number.as_f64().filter(|v| *v >= 0.0).map(|v| v.ceil() as u64)),
                Value::String(text) => text.trim().parse().ok(),
                _ => None,
            });
        from_details.or(self.retry_after)
    }
}

#[derive(Deserialize)]
struct ErrorEnvelope {
    detail: DetailBody,
}

#[derive(Deserialize)]
#[serde(untagged)]
enum DetailBody {
    Structured(ErrorDetail),
    Message(String),
    Other(Value),
}

/// Parses the `{ "detail": ... }` envelope. Plain string details become the
/// message; anything else (validation lists) keeps only its JSON text.
#[must_use]
pub fn parse_error_detail(body: &str) -> Option<ErrorDetail> {
    let envelope: ErrorEnvelope = serde_json::from_str(body).ok()?;
    Some(match envelope.detail {
        DetailBody::Structured(detail) => detail,
        DetailBody::Message(message) => ErrorDetail::with_message(message),
        DetailBody::Other(value) => ErrorDetail::with_message(value.to_string()),
    })
}

#[derive(Clone, Debug, Error)]
pub enum AppError {
    #[error("Config error: {0}")]
    Config(String),
    #[error("Network error: {0}")]
    Network(String),
    #[error("Timeout: {0}")]
    Timeout(String),
    #[error("Request failed ({status}): {message}")]
    Http { status: u16, message: String },
    #[error("Request failed ({status}): {}", .detail.message)]
    Api { status: u16, detail: ErrorDetail },
    #[error("Response error: {0}")]
    Parse(String),
    #[error("Request error: {0}")]
    Serialization(String),
    #[error("Storage error: {0}")]
    Storage(String),
}

impl AppError {
    /// True when the request never produced a server answer.
    #[must_use]
    pub fn is_transport(&self) -> bool {
        matches!(self, Self::Network(_) | Self::Timeout(_))
    }

    #[must_use]
    pub fn status(&self) -> Option<u16> {
        match self {
            Self::Http { status, .. } | Self::Api { status, .. } => Some(*status),
            _ => None,
        }
    }

    #[must_use]
    pub fn detail(&self) -> Option<&ErrorDetail> {
        match self {
            Self::Api { detail, .. } => Some(detail),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn parses_structured_detail() {
        let body = json!({
            "detail": {
                "code": "ACCOUNT_LOCKED",
                "message": "Too many attempts",
                "details": { "wait_seconds": 45 }
            }
        })
        .to_string();

        let detail = parse_error_detail(&body).expect("detail");
        assert!(detail.code_is("account_locked"));
        assert_eq!(detail.message, "Too many attempts");
        assert_eq!(detail.wait_seconds(), Some(45));
    }

    #[test]
    fn parses_string_detail() {
        let detail = parse_error_detail(r#"{"detail":"Not authenticated"}"#).expect("detail");
        assert_eq!(detail.code, "");
        assert_eq!(detail.message, "Not authenticated");
    }

    #[test]
    fn rejects_bodies_without_detail() {
        assert!(parse_error_detail("oops").is_none());
        assert!(parse_error_detail(r#"{"error":"x"}"#).is_none());
    }

    #[test]
    fn wait_seconds_accepts_strings_and_falls_back_to_retry_after() {
        let detail = ErrorDetail {
            details: Some(json!({ "wait_seconds": " 30 " })),
            ..ErrorDetail::default()
        };
        assert_eq!(detail.wait_seconds(), Some(30));

        let detail = ErrorDetail {
            retry_after: Some(12),
            ..ErrorDetail::default()
        };
        assert_eq!(detail.wait_seconds(), Some(12));
        assert_eq!(ErrorDetail::default().wait_seconds(), None);
    }

    #[test]
    fn transport_errors_are_flagged() {
        assert!(AppError::Network("down".to_string()).is_transport());
        assert!(AppError::Timeout("slow".to_string()).is_transport());
        assert!(
            !AppError::Http {
                status: 500,
                message: "boom".to_string()
            }
            .is_transport()
        );
    }

    #[test]
    fn display_uses_detail_message() {
        let err = AppError::Api {
            status: 401,
            detail: ErrorDetail::with_message("Invalid credentials"),
        };
        assert_eq!(err.to_string(), "Request failed (401): Invalid credentials");
        assert_eq!(err.status(), Some(401));
    }
}
