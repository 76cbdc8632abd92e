//! Account flows outside sign-in: registration and password reset.
//!
//! Every form is validated locally before a request goes out, with the same
//! password rules for registration and reset. The reset request reports a
//! neutral message so the client never reveals whether an account exists.

pub mod client;
pub mod types;
pub mod validation;

pub use client::{AccountError, register, request_password_reset, reset_password};
pub use types::{PasswordResetForm, RegistrationForm};
pub use validation::ValidationError;
