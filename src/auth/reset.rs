//! Single-use password reset secrets.
//!
//! A secret is 128 bits of UUID randomness encoded base64url without
//! padding, compact enough for a link. The store keeps the consumption
//! marker; this module only generates secrets and computes the validity
//! cutoff.

use base64ct::{Base64UrlUnpadded, Encoding};
use chrono::{DateTime, Duration, Utc};
use uuid::Uuid;

use crate::auth::AuthConfig;

/// Encoded length of a 16-byte secret.
pub const SECRET_LENGTH: usize = 22;

/// Generate an unguessable, URL-safe reset secret.
#[must_use]
pub fn generate_secret() -> String {
    Base64UrlUnpadded::encode_string(Uuid::new_v4().as_bytes())
}

/// Oldest creation instant a reset secret may have and still be exchanged.
#[must_use]
pub fn oldest_valid(config: &AuthConfig, now: DateTime<Utc>) -> DateTime<Utc> {
    now - Duration::seconds(config.reset_secret_ttl_seconds())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn secrets_are_compact_and_url_safe() {
        let secret = generate_secret();
        assert_eq!(secret.len(), SECRET_LENGTH);
        assert!(secret
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_'));
    }

    #[test]
    fn secrets_do_not_repeat() {
        assert_ne!(generate_secret(), generate_secret());
    }

    #[test]
    fn window_is_one_hour() {
        let config = AuthConfig::new("https://id.donaci.dev".to_string());
        let now = DateTime::from_timestamp(1_700_000_000, 0).expect("timestamp literal");
        assert_eq!(now - oldest_valid(&config, now), Duration::hours(1));
    }
}
