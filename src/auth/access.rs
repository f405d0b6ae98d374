//! Token-gated access decisions for person operations.

use tracing::info;
use uuid::Uuid;

use crate::auth::token::SessionTokens;

/// Completeness a route requires of the presented token.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AccessPolicy {
    /// Password-holding accounts only (person reads, writes, deletes).
    Complete,
    /// Freshly created accounts setting themselves up.
    Incomplete,
    /// Any authenticated holder, either class.
    AnyAuthenticated,
}

impl AccessPolicy {
    #[must_use]
    pub const fn required_complete(self) -> Option<bool> {
        match self {
            Self::Complete => Some(true),
            Self::Incomplete => Some(false),
            Self::AnyAuthenticated => None,
        }
    }
}

/// Decide whether a bearer token authorizes an operation on `person_id`.
///
/// A missing token logs at info (nothing suspicious about an anonymous
/// request hitting a protected route); a token that fails verification logs
/// at the severities chosen inside [`SessionTokens::check`]. Externally both
/// are the same deny.
#[must_use]
pub fn authorize(
    tokens: &SessionTokens,
    person_id: Uuid,
    policy: AccessPolicy,
    bearer: Option<&str>,
    now: i64,
) -> bool {
    let Some(token) = bearer else {
        info!("request for {person_id} without bearer token");
        return false;
    };
    tokens.check(person_id, policy.required_complete(), token, now)
}

#[cfg(test)]
mod tests {
    use super::*;
    use secrecy::SecretString;

    const NOW: i64 = 1_700_000_000;

    fn tokens() -> SessionTokens {
        SessionTokens::new(
            "https://id.donaci.dev".to_string(),
            SecretString::from("test-secret".to_string()),
        )
        .expect("non-empty secret")
    }

    #[test]
    fn policies_map_to_required_completeness() {
        assert_eq!(AccessPolicy::Complete.required_complete(), Some(true));
        assert_eq!(AccessPolicy::Incomplete.required_complete(), Some(false));
        assert_eq!(AccessPolicy::AnyAuthenticated.required_complete(), None);
    }

    #[test]
    fn missing_token_is_denied() {
        let tokens = tokens();
        assert!(!authorize(
            &tokens,
            Uuid::new_v4(),
            AccessPolicy::AnyAuthenticated,
            None,
            NOW
        ));
    }

    #[test]
    fn policy_gates_completeness_classes() {
        let tokens = tokens();
        let person = Uuid::new_v4();
        let incomplete = tokens
            .create(person, false, None, NOW)
            .expect("token creation");

        assert!(authorize(
            &tokens,
            person,
            AccessPolicy::Incomplete,
            Some(&incomplete),
            NOW
        ));
        assert!(!authorize(
            &tokens,
            person,
            AccessPolicy::Complete,
            Some(&incomplete),
            NOW
        ));
        assert!(authorize(
            &tokens,
            person,
            AccessPolicy::AnyAuthenticated,
            Some(&incomplete),
            NOW
        ));
    }

    #[test]
    fn wrong_person_is_denied_under_any_policy() {
        let tokens = tokens();
        let person = Uuid::new_v4();
        let token = tokens
            .create(person, true, None, NOW)
            .expect("token creation");

        assert!(!authorize(
            &tokens,
            Uuid::new_v4(),
            AccessPolicy::AnyAuthenticated,
            Some(&token),
            NOW
        ));
    }
}
