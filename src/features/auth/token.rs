//! Best-effort reading of access token claims. The signature is not checked;
//! the claims only seed the locally cached user identity and expiry, while
//! the API stays the authority on whether the token is valid.

use base64ct::{Base64UrlUnpadded, Encoding};
use serde_json::{Map, Value};

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct TokenClaims {
    pub sub: Option<String>,
    pub email: Option<String>,
    pub name: Option<String>,
    pub exp: Option<i64>,
}

/// Decodes the payload segment of a JWT. Returns `None` for opaque tokens.
#[must_use]
pub fn decode_claims(token: &str) -> Option<TokenClaims> {
    let mut segments = token.trim().split('.');
    let (Some(_header), Some(payload), Some(_signature), None) = (
        segments.next(),
        segments.next(),
        segments.next(),
        segments.next(),
    ) else {
        return None;
    };

    let bytes = Base64UrlUnpadded::decode_vec(payload.trim_end_matches('=')).ok()?;
    let claims: Map<String, Value> = serde_json::from_slice(&bytes).ok()?;

    Some(TokenClaims {
        sub: claims.get("sub").and_then(string_claim),
        email: claims.get("email").and_then(string_claim),
        name: claims.get("name").and_then(string_claim),
        exp: claims.get("exp").and_then(Value::as_i64),
    })
}

fn string_claim(value: &Value) -> Option<String> {
    match value {
        Value::String(text) if !text.trim().is_empty() => Some(text.trim().to_string()),
        Value::Number(number) => Some(number.to_string()),
        _ => None,
    }
}

#[cfg(test)]
pub(crate) fn encode_test_jwt(claims: &Value) -> String {
    let header = Base64UrlUnpadded::encode_string(br#"{"alg":"HS256","typ":"JWT"}"#);
    let payload = Base64UrlUnpadded::encode_string(claims.to_string().as_bytes());
    format!("{header}.{payload}.c2lnbmF0dXJl")
}
