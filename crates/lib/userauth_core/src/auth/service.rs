//! Authentication service: login, token rotation and bearer token checks.

use std::sync::Arc;

use tracing::{debug, info, warn};

use super::AuthError;
use super::jwt::TokenCodec;
use super::password::verify_password;
use super::session::Session;
use super::store::UserStore;
use crate::config::AuthConfig;
use crate::models::auth::{Login, User};

/// Login and token operations over a [`UserStore`].
#[derive(Clone)]
pub struct AuthService {
    store: Arc<dyn UserStore>,
    codec: TokenCodec,
}

impl AuthService {
    pub fn new(store: Arc<dyn UserStore>, codec: TokenCodec) -> Self {
        Self { store, codec }
    }

    /// Build a service signing with the configured secret and issuer.
    pub fn from_config(config: &AuthConfig, store: Arc<dyn UserStore>) -> Self {
        Self::new(
            store,
            TokenCodec::new(config.jwt_secret.clone(), config.jwt_issuer.clone()),
        )
    }

    pub fn codec(&self) -> &TokenCodec {
        &self.codec
    }

    /// Authenticate with email + password, issuing and storing a fresh token.
    ///
    /// Fails with [`AuthError::UnknownEmail`] or [`AuthError::InvalidPassword`];
    /// the stored record is left untouched on failure.
    pub async fn login(&self, login: &Login) -> Result<User, AuthError> {
        let Some(user) = self.store.find_by_email(&login.email).await? else {
            debug!(email = %login.email, "login rejected: unknown email");
            return Err(AuthError::UnknownEmail);
        };

        if !verify_password(&login.password, &user.password)? {
            debug!(email = %login.email, "login rejected: invalid password");
            return Err(AuthError::InvalidPassword);
        }

        let user = self.refresh_token(user).await?;
        info!(email = %user.email, "user logged in");
        Ok(user)
    }

    /// Issue a new token for `user` and persist it. No credential check.
    ///
    /// Previously issued tokens stay valid until they expire.
    pub async fn refresh_token(&self, mut user: User) -> Result<User, AuthError> {
        user.token = Some(self.codec.encode(&user.email)?);
        let saved = self.store.save(user).await?;
        info!(email = %saved.email, "issued new token");
        Ok(saved)
    }

    /// Look up the user currently holding `token`. Does not validate it.
    pub async fn find_by_token(&self, token: &str) -> Result<Option<User>, AuthError> {
        self.store.find_by_token(token).await
    }

    /// Whether `token` is a valid token for `user`. Parse failures are errors.
    pub fn valid_token(&self, token: &str, user: &User) -> Result<bool, AuthError> {
        self.codec.decode_and_validate(token, &user.email)
    }

    /// Resolve a bearer token to its user and make it the session's current user.
    ///
    /// Unknown, malformed, forged or expired tokens all yield [`AuthError::InvalidToken`].
    /// Any user already in `session` is cleared first, so a failure leaves it unauthenticated.
    pub async fn authenticate<'s>(
        &self,
        session: &'s mut Session,
        token: &str,
    ) -> Result<&'s User, AuthError> {
        session.clear_current_user();

        let Some(user) = self.find_by_token(token).await? else {
            debug!("bearer token not found");
            return Err(AuthError::InvalidToken);
        };

        match self.valid_token(token, &user) {
            Ok(true) => Ok(session.set_current_user(user)),
            Ok(false) => {
                debug!(email = %user.email, "bearer token failed validation");
                Err(AuthError::InvalidToken)
            }
            Err(e) => {
                warn!(email = %user.email, error = %e, "stored token does not parse");
                Err(AuthError::InvalidToken)
            }
        }
    }
}

impl std::fmt::Debug for AuthService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AuthService")
            .field("codec", &self.codec)
            .finish_non_exhaustive()
    }
}
