//! # Donaci (Donor Identity)
//!
//! `donaci` is the identity authority for donor accounts. It manages person
//! records and their credentials, issues and verifies the signed session
//! tokens that gate account operations, and coordinates email-verification
//! and password-reset flows via one-time secrets.
//!
//! ## Account Completeness
//!
//! A person is *complete* once it holds a password hash and *incomplete*
//! before that. Session tokens carry the completeness class they were issued
//! for; routes require one class, the other, or either. A new token of the
//! other class must be issued separately (login, or account completion
//! followed by login); tokens never change class in flight.
//!
//! ## Secrets
//!
//! - **Email codes**: six decimal digits, valid for a fixed window from
//!   creation; a narrower window applies when completing an account.
//! - **Reset secrets**: 128-bit URL-safe strings, single use, one-hour
//!   window, consumed atomically in the store.
//!
//! Verification failures are opaque at the service boundary: one fixed
//! login message, one "not found" for expired/used/unknown secrets, and
//! boolean token verdicts with reasons visible only in logs.

pub mod auth;
pub mod cli;
pub mod donaci;
pub mod store;

#[allow(clippy::doc_markdown, clippy::needless_raw_string_hashes)]
pub mod built_info {
    include!(concat!(env!("OUT_DIR"), "/built.rs"));
}

pub const GIT_COMMIT_HASH: &str = match built_info::GIT_COMMIT_HASH {
    Some(hash) => hash,
    None => "unknown",
};

pub const APP_USER_AGENT: &str = concat!(env!("CARGO_PKG_NAME"), "/", env!("CARGO_PKG_VERSION"),);

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_git_commit_hash_format() {
        if GIT_COMMIT_HASH == "unknown" {
            // Acceptable in non-git build environments
            return;
        }
        // Should be a hex string (full SHA-1 is 40 chars, but could be short)
        assert!(
            GIT_COMMIT_HASH.chars().all(|c| c.is_ascii_hexdigit()),
            "GIT_COMMIT_HASH should be a hex string, got: {GIT_COMMIT_HASH}"
        );
        assert!(
            GIT_COMMIT_HASH.len() >= 7,
            "GIT_COMMIT_HASH should be at least 7 characters long, got: {GIT_COMMIT_HASH}"
        );
    }

    #[test]
    fn test_app_user_agent_format() {
        assert!(APP_USER_AGENT.starts_with(env!("CARGO_PKG_NAME")));
        assert!(APP_USER_AGENT.contains(env!("CARGO_PKG_VERSION")));
    }
}
