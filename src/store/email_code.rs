//! Email verification code persistence.

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use sqlx::{PgPool, Row};
use tracing::Instrument;

use crate::auth::code::EmailCode;

/// A persisted verification code.
#[derive(Debug, Clone)]
pub struct EmailCodeRecord {
    pub id: i64,
    pub email: String,
    pub code: String,
    pub created_at: DateTime<Utc>,
}

pub async fn insert_email_code(pool: &PgPool, code: &EmailCode) -> Result<EmailCodeRecord> {
    let query = r"
        INSERT INTO email_verification_tokens (email_address, random_code, created_at)
        VALUES ($1, $2, $3)
        RETURNING id
    ";
    let span = tracing::info_span!(
        "db.query",
        db.system = "postgresql",
        db.operation = "INSERT",
        db.statement = query
    );
    let row = sqlx::query(query)
        .bind(&code.email)
        .bind(&code.code)
        .bind(code.created_at)
        .fetch_one(pool)
        .instrument(span)
        .await
        .context("failed to insert email verification code")?;

    Ok(EmailCodeRecord {
        id: row.get("id"),
        email: code.email.clone(),
        code: code.code.clone(),
        created_at: code.created_at,
    })
}

/// Find the most recently created code matching `email` and `code`, created
/// strictly after `created_since`.
///
/// Repeated requests leave several live codes for one address; the newest
/// match supersedes older ones. Expired codes are filtered here, never
/// deleted.
pub async fn find_email_code(
    pool: &PgPool,
    email: &str,
    code: &str,
    created_since: DateTime<Utc>,
) -> Result<Option<EmailCodeRecord>> {
    let query = r"
        SELECT id, email_address, random_code, created_at
        FROM email_verification_tokens
        WHERE email_address = $1
          AND random_code = $2
          AND created_at > $3
        ORDER BY created_at DESC
        LIMIT 1
    ";
    let span = tracing::info_span!(
        "db.query",
        db.system = "postgresql",
        db.operation = "SELECT",
        db.statement = query
    );
    let row = sqlx::query(query)
        .bind(email)
        .bind(code)
        .bind(created_since)
        .fetch_optional(pool)
        .instrument(span)
        .await
        .context("failed to find email verification code")?;

    Ok(row.map(|row| EmailCodeRecord {
        id: row.get("id"),
        email: row.get("email_address"),
        code: row.get("random_code"),
        created_at: row.get("created_at"),
    }))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn record_holds_values() {
        let created_at = DateTime::from_timestamp(1_700_000_000, 0).expect("timestamp literal");
        let record = EmailCodeRecord {
            id: 7,
            email: "donor@example.com".to_string(),
            code: "012345".to_string(),
            created_at,
        };
        assert_eq!(record.id, 7);
        assert_eq!(record.code, "012345");
    }
}
