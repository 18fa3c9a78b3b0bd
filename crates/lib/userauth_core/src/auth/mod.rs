//! Authentication and authorization logic.
//!
//! Provides password hashing, JWT issuance/validation, the credential store
//! contract, request-scoped sessions, and the service tying them together.

pub mod clock;
pub mod jwt;
pub mod password;
pub mod service;
pub mod session;
pub mod store;

use thiserror::Error;

/// Authentication errors.
#[derive(Debug, Error)]
pub enum AuthError {
    #[error("unknown email")]
    UnknownEmail,

    #[error("invalid password")]
    InvalidPassword,

    #[error("Token parse error: {0}")]
    TokenParse(#[from] jsonwebtoken::errors::Error),

    #[error("Invalid or expired token")]
    InvalidToken,

    #[error("No authenticated user for this request")]
    NoCurrentUser,

    #[error("No session scope is active")]
    NoSession,

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Store error: {0}")]
    Store(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl AuthError {
    /// The login field a credential error refers to.
    pub fn field(&self) -> Option<&'static str> {
        match self {
            AuthError::UnknownEmail => Some("email"),
            AuthError::InvalidPassword => Some("password"),
            _ => None,
        }
    }

    /// Whether the error is a denial the boundary should answer with a rejection.
    pub fn is_unauthorized(&self) -> bool {
        matches!(
            self,
            AuthError::UnknownEmail
                | AuthError::InvalidPassword
                | AuthError::TokenParse(_)
                | AuthError::InvalidToken
                | AuthError::NoCurrentUser
        )
    }
}
