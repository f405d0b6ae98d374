//! Password hashing and verification.
//!
//! Hashes are bcrypt with a fixed work factor. Verification fails with one
//! fixed message whether the account has no password or the password simply
//! did not match, so the response never reveals whether an account exists.

use crate::auth::error::PasswordError;

/// Current bcrypt work factor. Stored hashes with a different cost are
/// upgraded lazily on the next successful login.
pub const BCRYPT_COST: u32 = 12;

/// Structurally valid hash burned when no hash is stored, so both failure
/// paths do comparable work.
const NO_PASSWORD_SENTINEL: &str =
    "$2b$12$AAAAAAAAAAAAAAAAAAAAAABBBBBBBBBBBBBBBBBBBBBBBBBBBBBBB";

/// Derive a salted hash of `plaintext`.
///
/// The salt is drawn fresh on every call, so hashing the same input twice
/// yields two different hashes that both verify.
///
/// # Errors
///
/// Returns an error if the underlying bcrypt derivation fails.
pub fn hash_password(plaintext: &str) -> Result<String, PasswordError> {
    bcrypt::hash(plaintext, BCRYPT_COST).map_err(|_| PasswordError::Hash)
}

/// Whether a stored hash was derived with parameters other than the current
/// algorithm version and cost.
#[must_use]
pub fn needs_rehash(stored: &str) -> bool {
    let mut parts = stored.split('$');
    match (parts.next(), parts.next(), parts.next()) {
        (Some(""), Some(version), Some(cost)) => {
            version != "2b" || cost.parse::<u32>() != Ok(BCRYPT_COST)
        }
        _ => true,
    }
}

/// Verify `plaintext` against an optionally stored hash.
///
/// # Errors
///
/// Fails uniformly with [`PasswordError::AuthenticationFailed`] when the
/// stored hash is absent, malformed, or does not match.
pub fn verify_password(plaintext: &str, stored: Option<&str>) -> Result<(), PasswordError> {
    let Some(stored) = stored else {
        let _ = bcrypt::verify(plaintext, NO_PASSWORD_SENTINEL);
        return Err(PasswordError::AuthenticationFailed);
    };

    match bcrypt::verify(plaintext, stored) {
        Ok(true) => Ok(()),
        Ok(false) | Err(_) => Err(PasswordError::AuthenticationFailed),
    }
}
