//! Shared client utilities for configuration, HTTP access and error mapping.
//!
//! Feature clients build on [`http::ApiClient`] so every request gets the same
//! deadline, user agent and error translation. Transport failures become
//! [`AppError::Network`] or [`AppError::Timeout`]; server rejections carrying
//! the `{ "detail": ... }` envelope become [`AppError::Api`] so callers can
//! branch on the error code. These helpers never log request bodies.

pub mod config;
pub mod errors;
pub mod http;

pub use config::AppConfig;
pub use errors::{AppError, ErrorDetail};
pub use http::ApiClient;
