//! Time-boxed email verification codes.
//!
//! A code is six decimal digits bound to an email address and a creation
//! timestamp. Codes are never deleted; validity is enforced by time-window
//! filtering at lookup. Two windows exist on purpose: the plain window for
//! "is my code still live" checks, and a narrower window for account
//! completion that treats a nearly-expired code as already invalid, leaving
//! the user time to finish the registration form.

use chrono::{DateTime, Duration, Utc};
use rand::{rngs::OsRng, RngCore};

use crate::auth::AuthConfig;

pub const CODE_LENGTH: usize = 6;

/// Draw a fixed-length decimal code from `rng`.
///
/// Callers pass `OsRng` in production; tests inject a deterministic source.
pub fn generate_code<R: RngCore + ?Sized>(rng: &mut R) -> String {
    (0..CODE_LENGTH)
        .map(|_| char::from(b'0' + (rng.next_u32() % 10) as u8))
        .collect()
}

/// A not-yet-persisted verification code.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EmailCode {
    pub email: String,
    pub code: String,
    pub created_at: DateTime<Utc>,
}

impl EmailCode {
    /// Create a code for `email`, stamped with the caller-supplied `at` so a
    /// single request sees one consistent "now".
    #[must_use]
    pub fn for_address(email: &str, at: DateTime<Utc>) -> Self {
        Self::for_address_with(email, at, &mut OsRng)
    }

    #[must_use]
    pub fn for_address_with<R: RngCore + ?Sized>(
        email: &str,
        at: DateTime<Utc>,
        rng: &mut R,
    ) -> Self {
        Self {
            email: email.to_string(),
            code: generate_code(rng),
            created_at: at,
        }
    }
}

/// Oldest creation instant still valid for a plain liveness check.
#[must_use]
pub fn oldest_valid(config: &AuthConfig, now: DateTime<Utc>) -> DateTime<Utc> {
    now - Duration::seconds(config.email_code_ttl_seconds())
}

/// Oldest creation instant still accepted for account completion: the plain
/// window shortened by the grace margin.
#[must_use]
pub fn oldest_valid_for_completion(config: &AuthConfig, now: DateTime<Utc>) -> DateTime<Utc> {
    now - Duration::seconds(
        config.email_code_ttl_seconds() - config.email_code_completion_grace_seconds(),
    )
}
