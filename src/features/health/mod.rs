//! Backend health probe. Read-only and non-critical: a failed probe is
//! reported to the caller but never gates the login flow.

pub mod client;
pub mod types;

pub use client::{HEALTH_PATH, fetch_health};
pub use types::HealthStatus;
