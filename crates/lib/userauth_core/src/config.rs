//! Token signing configuration.

use crate::auth::AuthError;

/// Environment variable holding the HMAC signing secret.
pub const JWT_SECRET_VAR: &str = "JWT_SECRET";

/// Environment variable holding the token issuer.
pub const JWT_ISSUER_VAR: &str = "JWT_ISSUER";

/// Signing secret and issuer used for every token.
#[derive(Clone)]
pub struct AuthConfig {
    /// JWT signing secret.
    pub jwt_secret: String,
    /// Value of the `iss` claim.
    pub jwt_issuer: String,
}

impl AuthConfig {
    pub fn new(jwt_secret: impl Into<String>, jwt_issuer: impl Into<String>) -> Self {
        Self {
            jwt_secret: jwt_secret.into(),
            jwt_issuer: jwt_issuer.into(),
        }
    }

    /// Reads configuration from environment variables.
    ///
    /// | Variable     | Default |
    /// |--------------|---------|
    /// | `JWT_SECRET` | none    |
    /// | `JWT_ISSUER` | none    |
    ///
    /// Values are taken as-is; checking them is the operator's job.
    pub fn from_env() -> Result<Self, AuthError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, AuthError> {
        let require = |key: &str| match lookup(key) {
            Some(value) => Ok(value),
            None => Err(AuthError::Config(format!("{key} is not set"))),
        };
        Ok(Self {
            jwt_secret: require(JWT_SECRET_VAR)?,
            jwt_issuer: require(JWT_ISSUER_VAR)?,
        })
    }
}

impl std::fmt::Debug for AuthConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AuthConfig")
            .field("jwt_secret", &"<redacted>")
            .field("jwt_issuer", &self.jwt_issuer)
            .finish()
    }
}
