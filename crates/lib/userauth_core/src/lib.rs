//! # userauth_core
//!
//! Email/password login, bearer token issuance and request-scoped sessions.
//!
//! Storage is supplied by the caller through [`auth::store::UserStore`].

pub mod auth;
pub mod config;
pub mod models;

pub use auth::AuthError;
pub use auth::service::AuthService;
pub use config::AuthConfig;
pub use models::auth::{Login, TokenClaims, User};

/// Crate version, as recorded by Cargo at build time.
pub fn version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}
