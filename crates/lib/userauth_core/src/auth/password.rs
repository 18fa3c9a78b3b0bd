//! bcrypt hashing for stored user passwords.
//!
//! Hashes are produced when seeding users and checked on every login; the
//! comparison is bcrypt's own, never a plain string match.

use super::AuthError;

/// bcrypt cost factor.
const BCRYPT_COST: u32 = 10;

/// Hash a plaintext password for storage in [`User::password`](crate::User).
pub fn hash_password(password: &str) -> Result<String, AuthError> {
    bcrypt::hash(password, BCRYPT_COST)
        .map_err(|e| AuthError::Internal(format!("bcrypt hash: {e}")))
}

/// Check a submitted login password against a user's stored hash.
///
/// `Ok(false)` means the password is wrong; a malformed stored hash is an
/// error rather than a mismatch.
pub fn verify_password(password: &str, hash: &str) -> Result<bool, AuthError> {
    bcrypt::verify(password, hash).map_err(|e| AuthError::Internal(format!("bcrypt verify: {e}")))
}
