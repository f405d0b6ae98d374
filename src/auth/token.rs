//! Compact signed session tokens.
//!
//! A token is a three-segment `header.payload.signature` string signed with
//! HMAC-SHA256. The secret never leaves this service and the service verifies
//! its own tokens, so symmetric signing is sufficient and cheaper than an
//! asymmetric scheme. Tokens are never stored server-side; only expiry ends
//! their life.

use base64ct::{Base64UrlUnpadded, Encoding};
use hmac::{Hmac, Mac};
use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};
use sha2::Sha256;
use tracing::{debug, warn};
use uuid::Uuid;

use crate::auth::error::TokenError;
use crate::auth::DEFAULT_TOKEN_TTL_SECONDS;

const TOKEN_ALG: &str = "HS256";

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
struct SessionHeader {
    alg: String,
    typ: String,
}

impl SessionHeader {
    fn hs256() -> Self {
        Self {
            alg: TOKEN_ALG.to_string(),
            typ: "JWT".to_string(),
        }
    }
}

/// Who the token is for and which account class it asserts.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct SessionSubject {
    pub person_id: Uuid,
    pub complete: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub psp_id: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct SessionClaims {
    pub iss: String,
    pub iat: i64,
    pub exp: i64,
    pub sub: SessionSubject,
}

fn b64e_json<T: Serialize>(value: &T) -> Result<String, TokenError> {
    let json = serde_json::to_vec(value)?;
    Ok(Base64UrlUnpadded::encode_string(&json))
}

fn b64d_json<T: for<'de> Deserialize<'de>>(s: &str) -> Result<T, TokenError> {
    let bytes = Base64UrlUnpadded::decode_vec(s).map_err(|_| TokenError::Base64)?;
    Ok(serde_json::from_slice(&bytes)?)
}

/// Issues and verifies session tokens.
///
/// Constructed once at startup with the configured issuer and signing
/// secret, then shared by reference; verification reads no ambient state.
pub struct SessionTokens {
    issuer: String,
    secret: SecretString,
    ttl_seconds: i64,
}

impl SessionTokens {
    /// # Errors
    ///
    /// Returns an error if the signing secret is empty, so a misconfigured
    /// service fails at startup instead of at the first login.
    pub fn new(issuer: String, secret: SecretString) -> Result<Self, TokenError> {
        if secret.expose_secret().is_empty() {
            return Err(TokenError::EmptySecret);
        }
        Ok(Self {
            issuer,
            secret,
            ttl_seconds: DEFAULT_TOKEN_TTL_SECONDS,
        })
    }

    #[must_use]
    pub fn with_ttl_seconds(mut self, seconds: i64) -> Self {
        self.ttl_seconds = seconds;
        self
    }

    #[must_use]
    pub fn issuer(&self) -> &str {
        &self.issuer
    }

    fn mac(&self) -> Result<Hmac<Sha256>, TokenError> {
        Hmac::<Sha256>::new_from_slice(self.secret.expose_secret().as_bytes())
            .map_err(|_| TokenError::InvalidKey)
    }

    /// Create a signed token asserting `person_id` and its completeness
    /// state, expiring a fixed period after `now`.
    ///
    /// # Errors
    ///
    /// Returns an error if the claims cannot be encoded or the key is
    /// rejected by the MAC.
    pub fn create(
        &self,
        person_id: Uuid,
        complete: bool,
        psp_id: Option<&str>,
        now: i64,
    ) -> Result<String, TokenError> {
        let claims = SessionClaims {
            iss: self.issuer.clone(),
            iat: now,
            exp: now + self.ttl_seconds,
            sub: SessionSubject {
                person_id,
                complete,
                psp_id: psp_id.map(str::to_string),
            },
        };

        let header_b64 = b64e_json(&SessionHeader::hs256())?;
        let claims_b64 = b64e_json(&claims)?;
        let signing_input = format!("{header_b64}.{claims_b64}");

        let mut mac = self.mac()?;
        mac.update(signing_input.as_bytes());
        let signature = mac.finalize().into_bytes();
        let signature_b64 = Base64UrlUnpadded::encode_string(signature.as_slice());

        Ok(format!("{signing_input}.{signature_b64}"))
    }

    /// Decode a token and validate signature and expiry.
    fn verify(&self, token: &str, now: i64) -> Result<SessionClaims, TokenError> {
        let mut parts = token.split('.');
        let header_b64 = parts.next().ok_or(TokenError::TokenFormat)?;
        let claims_b64 = parts.next().ok_or(TokenError::TokenFormat)?;
        let sig_b64 = parts.next().ok_or(TokenError::TokenFormat)?;
        if parts.next().is_some() {
            return Err(TokenError::TokenFormat);
        }

        let header: SessionHeader = b64d_json(header_b64)?;
        if header.alg != TOKEN_ALG {
            return Err(TokenError::UnsupportedAlg(header.alg));
        }

        let signature = Base64UrlUnpadded::decode_vec(sig_b64).map_err(|_| TokenError::Base64)?;
        let mut mac = self.mac()?;
        mac.update(header_b64.as_bytes());
        mac.update(b".");
        mac.update(claims_b64.as_bytes());
        mac.verify_slice(&signature)
            .map_err(|_| TokenError::InvalidSignature)?;

        let claims: SessionClaims = b64d_json(claims_b64)?;
        if claims.exp <= now {
            return Err(TokenError::Expired);
        }

        Ok(claims)
    }

    /// Check a bearer token against the expected subject and required
    /// completeness.
    ///
    /// Verification is short-circuit: the first failing check is the single
    /// logged reason. All failures collapse to `false`; the caller never
    /// learns which check failed. Malformed/expired tokens log at debug
    /// (routine scanner traffic), claim mismatches at warn.
    #[must_use]
    pub fn check(
        &self,
        person_id: Uuid,
        required_complete: Option<bool>,
        token: &str,
        now: i64,
    ) -> bool {
        let verdict = self.verify(token, now).and_then(|claims| {
            if claims.iss != self.issuer {
                return Err(TokenError::InvalidIssuer);
            }
            if claims.sub.person_id != person_id {
                return Err(TokenError::SubjectMismatch);
            }
            if let Some(required) = required_complete {
                if claims.sub.complete != required {
                    return Err(TokenError::CompletenessMismatch);
                }
            }
            Ok(())
        });

        match verdict {
            Ok(()) => true,
            Err(err) if err.is_suspicious() => {
                warn!("rejected session token for {person_id}: {err}");
                false
            }
            Err(err) => {
                debug!("rejected session token: {err}");
                false
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const NOW: i64 = 1_700_000_000;
    const ISSUER: &str = "https://id.donaci.dev";

    fn tokens() -> SessionTokens {
        SessionTokens::new(ISSUER.to_string(), SecretString::from("test-secret".to_string()))
            .expect("non-empty secret")
    }

    fn person() -> Uuid {
        Uuid::parse_str("7f8b9c0d-1e2f-4a3b-8c4d-5e6f7a8b9c0d").expect("uuid literal")
    }

    #[test]
    fn empty_secret_is_rejected_at_construction() {
        let result = SessionTokens::new(ISSUER.to_string(), SecretString::from(String::new()));
        assert!(matches!(result, Err(TokenError::EmptySecret)));
    }

    #[test]
    fn round_trip_both_completeness_classes() -> Result<(), TokenError> {
        let tokens = tokens();
        for complete in [true, false] {
            let token = tokens.create(person(), complete, Some("cus_abc"), NOW)?;
            assert!(tokens.check(person(), Some(complete), &token, NOW));
            assert!(tokens.check(person(), None, &token, NOW));
        }
        Ok(())
    }

    #[test]
    fn claims_carry_subject_and_expiry() -> Result<(), TokenError> {
        let tokens = tokens();
        let token = tokens.create(person(), true, Some("cus_abc"), NOW)?;
        let claims = tokens.verify(&token, NOW)?;

        assert_eq!(claims.iss, ISSUER);
        assert_eq!(claims.iat, NOW);
        assert_eq!(claims.exp, NOW + DEFAULT_TOKEN_TTL_SECONDS);
        assert_eq!(claims.sub.person_id, person());
        assert!(claims.sub.complete);
        assert_eq!(claims.sub.psp_id.as_deref(), Some("cus_abc"));
        Ok(())
    }

    #[test]
    fn psp_id_is_omitted_when_absent() -> Result<(), TokenError> {
        let tokens = tokens();
        let token = tokens.create(person(), false, None, NOW)?;
        let claims = tokens.verify(&token, NOW)?;
        assert_eq!(claims.sub.psp_id, None);

        // The claim must not appear in the payload at all when unset.
        let payload_b64 = token.split('.').nth(1).expect("payload segment");
        let payload = Base64UrlUnpadded::decode_vec(payload_b64).expect("valid base64");
        let payload = String::from_utf8(payload).expect("utf8 payload");
        assert!(!payload.contains("psp_id"));
        Ok(())
    }

    #[test]
    fn login_scenario() -> Result<(), TokenError> {
        let tokens = tokens();
        let other = Uuid::parse_str("00000000-0000-4000-8000-000000000999").expect("uuid literal");
        let token = tokens.create(person(), true, Some("cus_abc"), NOW)?;

        assert!(tokens.check(person(), Some(true), &token, NOW));
        assert!(!tokens.check(person(), Some(false), &token, NOW));
        assert!(!tokens.check(other, Some(true), &token, NOW));
        Ok(())
    }

    #[test]
    fn expired_token_is_rejected() -> Result<(), TokenError> {
        let tokens = tokens();
        let issued_at = NOW - (DEFAULT_TOKEN_TTL_SECONDS + 1);
        let token = tokens.create(person(), true, None, issued_at)?;

        assert!(!tokens.check(person(), Some(true), &token, NOW));
        assert!(matches!(tokens.verify(&token, NOW), Err(TokenError::Expired)));

        // Still valid when checked within its window.
        assert!(tokens.check(person(), Some(true), &token, issued_at + 60));
        Ok(())
    }

    #[test]
    fn expiry_boundary_is_exclusive() -> Result<(), TokenError> {
        let tokens = tokens();
        let token = tokens.create(person(), true, None, NOW)?;
        assert!(!tokens.check(person(), None, &token, NOW + DEFAULT_TOKEN_TTL_SECONDS));
        assert!(tokens.check(person(), None, &token, NOW + DEFAULT_TOKEN_TTL_SECONDS - 1));
        Ok(())
    }

    #[test]
    fn any_mutation_invalidates_the_token() -> Result<(), TokenError> {
        let tokens = tokens();
        let token = tokens.create(person(), true, Some("cus_abc"), NOW)?;

        // Appending a character.
        assert!(!tokens.check(person(), Some(true), &format!("{token}A"), NOW));

        // Mutating one character in each position.
        for index in 0..token.len() {
            let mut bytes = token.clone().into_bytes();
            bytes[index] = if bytes[index] == b'A' { b'B' } else { b'A' };
            let Ok(tampered) = String::from_utf8(bytes) else {
                continue;
            };
            if tampered == token {
                continue;
            }
            assert!(
                !tokens.check(person(), Some(true), &tampered, NOW),
                "mutation at {index} was accepted"
            );
        }
        Ok(())
    }

    #[test]
    fn wrong_secret_fails_verification() -> Result<(), TokenError> {
        let tokens = tokens();
        let others = SessionTokens::new(
            ISSUER.to_string(),
            SecretString::from("other-secret".to_string()),
        )?;
        let token = tokens.create(person(), true, None, NOW)?;

        assert!(!others.check(person(), Some(true), &token, NOW));
        assert!(matches!(
            others.verify(&token, NOW),
            Err(TokenError::InvalidSignature)
        ));
        Ok(())
    }

    #[test]
    fn issuer_mismatch_is_rejected() -> Result<(), TokenError> {
        let secret = SecretString::from("shared-secret".to_string());
        let ours = SessionTokens::new(ISSUER.to_string(), secret.clone())?;
        let theirs = SessionTokens::new("https://elsewhere.test".to_string(), secret)?;
        let token = theirs.create(person(), true, None, NOW)?;

        assert!(!ours.check(person(), Some(true), &token, NOW));
        Ok(())
    }

    #[test]
    fn unsupported_algorithm_is_rejected() -> Result<(), TokenError> {
        let tokens = tokens();
        let header = b64e_json(&SessionHeader {
            alg: "none".to_string(),
            typ: "JWT".to_string(),
        })?;
        let claims = b64e_json(&SessionClaims {
            iss: ISSUER.to_string(),
            iat: NOW,
            exp: NOW + 60,
            sub: SessionSubject {
                person_id: person(),
                complete: true,
                psp_id: None,
            },
        })?;
        let forged = format!("{header}.{claims}.");

        assert!(matches!(
            tokens.verify(&forged, NOW),
            Err(TokenError::UnsupportedAlg(alg)) if alg == "none"
        ));
        assert!(!tokens.check(person(), Some(true), &forged, NOW));
        Ok(())
    }

    #[test]
    fn malformed_tokens_are_rejected() {
        let tokens = tokens();
        for garbage in ["", "a", "a.b", "a.b.c.d", "not a token at all"] {
            assert!(!tokens.check(person(), None, garbage, NOW), "{garbage:?}");
        }
    }
}
