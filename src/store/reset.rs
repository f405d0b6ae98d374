//! Password reset secret persistence.
//!
//! The consume step is a conditional update so two concurrent redemptions of
//! the same secret serialize to exactly one winner inside the store.

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use sqlx::{PgPool, Row};
use tracing::Instrument;
use uuid::Uuid;

/// A persisted reset secret. `used_at` is set exactly once.
#[derive(Debug, Clone)]
pub struct ResetSecretRecord {
    pub secret: String,
    pub person_id: Uuid,
    pub created_at: DateTime<Utc>,
    pub used_at: Option<DateTime<Utc>>,
}

pub async fn insert_reset_secret(
    pool: &PgPool,
    person_id: Uuid,
    secret: &str,
    now: DateTime<Utc>,
) -> Result<ResetSecretRecord> {
    let query = r"
        INSERT INTO password_reset_tokens (secret, person_id, created_at)
        VALUES ($1, $2, $3)
    ";
    let span = tracing::info_span!(
        "db.query",
        db.system = "postgresql",
        db.operation = "INSERT",
        db.statement = query
    );
    sqlx::query(query)
        .bind(secret)
        .bind(person_id)
        .bind(now)
        .execute(pool)
        .instrument(span)
        .await
        .context("failed to insert reset secret")?;

    Ok(ResetSecretRecord {
        secret: secret.to_string(),
        person_id,
        created_at: now,
        used_at: None,
    })
}

/// Find a secret still eligible for use: exact match, never consumed,
/// created after `oldest`. Expired, used, and unknown secrets are all the
/// same absence to the caller.
pub async fn find_reset_secret_for_use(
    tx: &mut sqlx::Transaction<'_, sqlx::Postgres>,
    secret: &str,
    oldest: DateTime<Utc>,
) -> Result<Option<ResetSecretRecord>> {
    let query = r"
        SELECT secret, person_id, created_at, used_at
        FROM password_reset_tokens
        WHERE secret = $1
          AND used_at IS NULL
          AND created_at > $2
        LIMIT 1
    ";
    let span = tracing::info_span!(
        "db.query",
        db.system = "postgresql",
        db.operation = "SELECT",
        db.statement = query
    );
    let row = sqlx::query(query)
        .bind(secret)
        .bind(oldest)
        .fetch_optional(&mut **tx)
        .instrument(span)
        .await
        .context("failed to find reset secret")?;

    Ok(row.map(|row| ResetSecretRecord {
        secret: row.get("secret"),
        person_id: row.get("person_id"),
        created_at: row.get("created_at"),
        used_at: row.get("used_at"),
    }))
}

/// Mark a secret used if nobody got there first. Returns false when the
/// secret was already consumed (or never existed), in which case the caller
/// must abandon the password change.
pub async fn consume_reset_secret(
    tx: &mut sqlx::Transaction<'_, sqlx::Postgres>,
    secret: &str,
    at: DateTime<Utc>,
) -> Result<bool> {
    let query = r"
        UPDATE password_reset_tokens
        SET used_at = $2
        WHERE secret = $1
          AND used_at IS NULL
        RETURNING secret
    ";
    let span = tracing::info_span!(
        "db.query",
        db.system = "postgresql",
        db.operation = "UPDATE",
        db.statement = query
    );
    let row = sqlx::query(query)
        .bind(secret)
        .bind(at)
        .fetch_optional(&mut **tx)
        .instrument(span)
        .await
        .context("failed to consume reset secret")?;

    Ok(row.is_some())
}
