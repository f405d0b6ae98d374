//! Authentication core: password credentials, signed session tokens,
//! email-verification codes, password-reset secrets, and the access policy
//! that gates person operations.
//!
//! Everything in this module is stateless with respect to in-process
//! concurrency. Expiry arithmetic takes an explicit `now` so the windows are
//! deterministically testable; nothing here reads a clock or the environment.

pub mod access;
pub mod code;
pub mod error;
pub mod password;
pub mod reset;
pub mod token;

pub use access::{authorize, AccessPolicy};
pub use error::{PasswordError, TokenError};
pub use token::{SessionClaims, SessionSubject, SessionTokens};

const DEFAULT_TOKEN_TTL_SECONDS: i64 = 8 * 60 * 60;
const DEFAULT_EMAIL_CODE_TTL_SECONDS: i64 = 8 * 60 * 60;
const DEFAULT_EMAIL_CODE_COMPLETION_GRACE_SECONDS: i64 = 5 * 60;
const DEFAULT_RESET_SECRET_TTL_SECONDS: i64 = 60 * 60;

/// Validity windows for the time-boxed secrets.
///
/// The email-code window and the reset-secret window are distinct policies,
/// not a shared TTL. The completion grace keeps a code that is about to
/// expire from being accepted for account completion, leaving the user time
/// to finish the registration form.
#[derive(Clone, Debug)]
pub struct AuthConfig {
    base_url: String,
    email_code_ttl_seconds: i64,
    email_code_completion_grace_seconds: i64,
    reset_secret_ttl_seconds: i64,
}

impl AuthConfig {
    #[must_use]
    pub fn new(base_url: String) -> Self {
        Self {
            base_url,
            email_code_ttl_seconds: DEFAULT_EMAIL_CODE_TTL_SECONDS,
            email_code_completion_grace_seconds: DEFAULT_EMAIL_CODE_COMPLETION_GRACE_SECONDS,
            reset_secret_ttl_seconds: DEFAULT_RESET_SECRET_TTL_SECONDS,
        }
    }

    #[must_use]
    pub fn with_email_code_ttl_seconds(mut self, seconds: i64) -> Self {
        self.email_code_ttl_seconds = seconds;
        self
    }

    #[must_use]
    pub fn with_email_code_completion_grace_seconds(mut self, seconds: i64) -> Self {
        self.email_code_completion_grace_seconds = seconds;
        self
    }

    #[must_use]
    pub fn with_reset_secret_ttl_seconds(mut self, seconds: i64) -> Self {
        self.reset_secret_ttl_seconds = seconds;
        self
    }

    #[must_use]
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    #[must_use]
    pub fn email_code_ttl_seconds(&self) -> i64 {
        self.email_code_ttl_seconds
    }

    #[must_use]
    pub fn email_code_completion_grace_seconds(&self) -> i64 {
        self.email_code_completion_grace_seconds
    }

    #[must_use]
    pub fn reset_secret_ttl_seconds(&self) -> i64 {
        self.reset_secret_ttl_seconds
    }
}
