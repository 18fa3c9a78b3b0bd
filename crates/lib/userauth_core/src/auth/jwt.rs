//! JWT token generation and verification.

use std::sync::Arc;

use chrono::{DateTime, Duration, Utc};
use jsonwebtoken::{Algorithm, DecodingKey, EncodingKey, Header, Validation, decode, encode};
use tracing::debug;

use super::AuthError;
use super::clock::{Clock, SystemClock};
use crate::models::auth::TokenClaims;

/// Token lifetime: 10 days.
pub const TOKEN_EXPIRY_SECS: i64 = 10 * 24 * 60 * 60;

/// Generate a signed JWT (HS256) for `email`, issued at `now` and expiring 10 days later.
pub fn encode_token(
    email: &str,
    issuer: &str,
    secret: &[u8],
    now: DateTime<Utc>,
) -> Result<String, AuthError> {
    let claims = TokenClaims {
        sub: email.to_string(),
        iss: issuer.to_string(),
        iat: now.timestamp(),
        exp: (now + Duration::seconds(TOKEN_EXPIRY_SECS)).timestamp(),
    };
    Ok(encode(
        &Header::default(),
        &claims,
        &EncodingKey::from_secret(secret),
    )?)
}

/// Parse a JWT and verify its signature, returning the claims.
///
/// Expiry, issuer and subject are not checked here.
pub fn decode_token(token: &str, secret: &[u8]) -> Result<TokenClaims, AuthError> {
    let mut validation = Validation::new(Algorithm::HS256);
    validation.validate_exp = false;
    validation.validate_nbf = false;
    validation.validate_aud = false;
    validation.set_required_spec_claims(&["exp", "iss", "sub"]);
    let data = decode::<TokenClaims>(token, &DecodingKey::from_secret(secret), &validation)?;
    Ok(data.claims)
}

/// Verify a JWT for `email`.
///
/// A malformed token or a bad signature is an error. Otherwise returns whether
/// the subject and issuer match and `now` is strictly before the expiry.
pub fn decode_and_validate(
    token: &str,
    email: &str,
    issuer: &str,
    secret: &[u8],
    now: DateTime<Utc>,
) -> Result<bool, AuthError> {
    let claims = decode_token(token, secret)?;
    Ok(claims_match(&claims, email, issuer, now))
}

fn claims_match(claims: &TokenClaims, email: &str, issuer: &str, now: DateTime<Utc>) -> bool {
    if claims.sub != email {
        debug!("token subject mismatch");
        return false;
    }
    if claims.iss != issuer {
        debug!(iss = %claims.iss, "token issuer mismatch");
        return false;
    }
    if now.timestamp_millis() >= claims.exp.saturating_mul(1000) {
        debug!(exp = claims.exp, "token expired");
        return false;
    }
    true
}

/// Token codec bound to a signing secret, an issuer and a clock.
#[derive(Clone)]
pub struct TokenCodec {
    secret: String,
    issuer: String,
    clock: Arc<dyn Clock>,
}

impl TokenCodec {
    /// Codec reading the wall clock.
    pub fn new(secret: impl Into<String>, issuer: impl Into<String>) -> Self {
        Self::with_clock(secret, issuer, Arc::new(SystemClock))
    }

    pub fn with_clock(
        secret: impl Into<String>,
        issuer: impl Into<String>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            secret: secret.into(),
            issuer: issuer.into(),
            clock,
        }
    }

    pub fn issuer(&self) -> &str {
        &self.issuer
    }

    /// Issue a new token for `email`.
    pub fn encode(&self, email: &str) -> Result<String, AuthError> {
        encode_token(
            email,
            &self.issuer,
            self.secret.as_bytes(),
            self.clock.now(),
        )
    }

    /// Parse a token and verify its signature.
    pub fn decode(&self, token: &str) -> Result<TokenClaims, AuthError> {
        decode_token(token, self.secret.as_bytes())
    }

    /// See [`decode_and_validate`].
    pub fn decode_and_validate(&self, token: &str, email: &str) -> Result<bool, AuthError> {
        decode_and_validate(
            token,
            email,
            &self.issuer,
            self.secret.as_bytes(),
            self.clock.now(),
        )
    }

    /// Like [`TokenCodec::decode_and_validate`], with parse failures counted as invalid.
    pub fn is_valid(&self, token: &str, email: &str) -> bool {
        match self.decode_and_validate(token, email) {
            Ok(valid) => valid,
            Err(e) => {
                debug!(error = %e, "token rejected");
                false
            }
        }
    }
}

impl std::fmt::Debug for TokenCodec {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TokenCodec")
            .field("issuer", &self.issuer)
            .finish_non_exhaustive()
    }
}
