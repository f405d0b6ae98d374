use thiserror::Error;

/// Rejection causes for session token verification.
///
/// These never cross the service boundary: `SessionTokens::check` collapses
/// them to a boolean and the reason is consumed by the logging sink only.
#[derive(Debug, Error)]
pub enum TokenError {
    #[error("empty signing secret")]
    EmptySecret,
    #[error("invalid signing key")]
    InvalidKey,
    #[error("invalid token format")]
    TokenFormat,
    #[error("invalid base64url encoding")]
    Base64,
    #[error("invalid json")]
    Json(#[from] serde_json::Error),
    #[error("unsupported algorithm: {0}")]
    UnsupportedAlg(String),
    #[error("invalid signature")]
    InvalidSignature,
    #[error("token expired")]
    Expired,
    #[error("invalid issuer")]
    InvalidIssuer,
    #[error("subject mismatch")]
    SubjectMismatch,
    #[error("completeness mismatch")]
    CompletenessMismatch,
}

impl TokenError {
    /// Malformed and expired tokens are routine scanner/bot traffic; claim
    /// mismatches on a well-signed token are worth a louder log line.
    #[must_use]
    pub(crate) fn is_suspicious(&self) -> bool {
        matches!(
            self,
            Self::InvalidIssuer | Self::SubjectMismatch | Self::CompletenessMismatch
        )
    }
}

/// Password hashing and verification failures.
///
/// Verification fails with one fixed, public-safe message whether the stored
/// hash was absent or merely did not match.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum PasswordError {
    #[error("email or password incorrect")]
    AuthenticationFailed,
    #[error("failed to hash password")]
    Hash,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn token_error_severity_split() {
        assert!(!TokenError::TokenFormat.is_suspicious());
        assert!(!TokenError::Expired.is_suspicious());
        assert!(!TokenError::InvalidSignature.is_suspicious());
        assert!(TokenError::InvalidIssuer.is_suspicious());
        assert!(TokenError::SubjectMismatch.is_suspicious());
        assert!(TokenError::CompletenessMismatch.is_suspicious());
    }

    #[test]
    fn authentication_failed_message_is_fixed() {
        assert_eq!(
            PasswordError::AuthenticationFailed.to_string(),
            "email or password incorrect"
        );
    }
}
