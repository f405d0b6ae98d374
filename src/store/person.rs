//! Person lookups and credential persistence.

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use sqlx::{PgPool, Row};
use tracing::Instrument;
use uuid::Uuid;

use crate::store::is_unique_violation;

/// A donor identity as the auth core sees it.
///
/// `password_hash = NULL` means the account is incomplete. Email addresses
/// are unique only among password-holding people (partial unique index);
/// incomplete records may share an address transiently.
#[derive(Debug, Clone)]
pub struct Person {
    pub id: Uuid,
    pub email: String,
    pub password_hash: Option<String>,
    pub psp_customer_id: Option<String>,
    pub email_verified_at: Option<DateTime<Utc>>,
}

/// Outcome of attaching a first password to a person.
#[derive(Debug)]
pub enum CompletionOutcome {
    Completed,
    /// Another password-holding person already owns the email address.
    EmailTaken,
    /// No eligible row: the person is gone or already holds a password.
    NotEligible,
}

const PERSON_COLUMNS: &str = "id, email, password_hash, psp_customer_id, email_verified_at";

fn person_from_row(row: &sqlx::postgres::PgRow) -> Person {
    Person {
        id: row.get("id"),
        email: row.get("email"),
        password_hash: row.get("password_hash"),
        psp_customer_id: row.get("psp_customer_id"),
        email_verified_at: row.get("email_verified_at"),
    }
}

pub async fn lookup_person(pool: &PgPool, id: Uuid) -> Result<Option<Person>> {
    let query = format!("SELECT {PERSON_COLUMNS} FROM people WHERE id = $1");
    let span = tracing::info_span!(
        "db.query",
        db.system = "postgresql",
        db.operation = "SELECT",
        db.statement = query.as_str()
    );
    let row = sqlx::query(&query)
        .bind(id)
        .fetch_optional(pool)
        .instrument(span)
        .await
        .context("failed to lookup person")?;

    Ok(row.as_ref().map(person_from_row))
}

/// Look up the password-holding person for a login email.
///
/// Incomplete records with the same address are invisible here; only one
/// complete record can exist per email.
pub async fn lookup_login_person(pool: &PgPool, email: &str) -> Result<Option<Person>> {
    let query = format!(
        "SELECT {PERSON_COLUMNS} FROM people WHERE email = $1 AND password_hash IS NOT NULL LIMIT 1"
    );
    let span = tracing::info_span!(
        "db.query",
        db.system = "postgresql",
        db.operation = "SELECT",
        db.statement = query.as_str()
    );
    let row = sqlx::query(&query)
        .bind(email)
        .fetch_optional(pool)
        .instrument(span)
        .await
        .context("failed to lookup login person")?;

    Ok(row.as_ref().map(person_from_row))
}

/// Attach a first password and mark the email verified, only if the person
/// does not already hold a password. A second password can never be attached
/// through this path.
pub async fn complete_person(
    tx: &mut sqlx::Transaction<'_, sqlx::Postgres>,
    id: Uuid,
    password_hash: &str,
    at: DateTime<Utc>,
) -> Result<CompletionOutcome> {
    let query = r"
        UPDATE people
        SET password_hash = $2,
            email_verified_at = COALESCE(email_verified_at, $3)
        WHERE id = $1
          AND password_hash IS NULL
        RETURNING id
    ";
    let span = tracing::info_span!(
        "db.query",
        db.system = "postgresql",
        db.operation = "UPDATE",
        db.statement = query
    );
    let row = sqlx::query(query)
        .bind(id)
        .bind(password_hash)
        .bind(at)
        .fetch_optional(&mut **tx)
        .instrument(span)
        .await;

    match row {
        Ok(Some(_)) => Ok(CompletionOutcome::Completed),
        Ok(None) => Ok(CompletionOutcome::NotEligible),
        Err(err) if is_unique_violation(&err) => Ok(CompletionOutcome::EmailTaken),
        Err(err) => Err(err).context("failed to complete person"),
    }
}

/// Replace the stored hash (password reset, lazy rehash on login).
pub async fn update_password_hash(
    executor: impl sqlx::PgExecutor<'_>,
    id: Uuid,
    password_hash: &str,
) -> Result<bool> {
    let query = "UPDATE people SET password_hash = $2 WHERE id = $1 AND password_hash IS NOT NULL";
    let span = tracing::info_span!(
        "db.query",
        db.system = "postgresql",
        db.operation = "UPDATE",
        db.statement = query
    );
    let result = sqlx::query(query)
        .bind(id)
        .bind(password_hash)
        .execute(executor)
        .instrument(span)
        .await
        .context("failed to update password hash")?;

    Ok(result.rows_affected() > 0)
}

/// Remove a person. Outstanding reset secrets go with the row (FK cascade).
/// Deletion is idempotent.
pub async fn delete_person(pool: &PgPool, id: Uuid) -> Result<bool> {
    let query = "DELETE FROM people WHERE id = $1";
    let span = tracing::info_span!(
        "db.query",
        db.system = "postgresql",
        db.operation = "DELETE",
        db.statement = query
    );
    let result = sqlx::query(query)
        .bind(id)
        .execute(pool)
        .instrument(span)
        .await
        .context("failed to delete person")?;

    Ok(result.rows_affected() > 0)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn completion_outcome_debug_names() {
        assert_eq!(format!("{:?}", CompletionOutcome::Completed), "Completed");
        assert_eq!(format!("{:?}", CompletionOutcome::EmailTaken), "EmailTaken");
        assert_eq!(
            format!("{:?}", CompletionOutcome::NotEligible),
            "NotEligible"
        );
    }

    #[test]
    fn person_holds_values() {
        let person = Person {
            id: Uuid::new_v4(),
            email: "donor@example.com".to_string(),
            password_hash: None,
            psp_customer_id: Some("cus_abc".to_string()),
            email_verified_at: None,
        };
        assert!(person.password_hash.is_none());
        assert_eq!(person.psp_customer_id.as_deref(), Some("cus_abc"));
    }
}
