//! Password reset: request a single-use secret, exchange it for a new
//! password.
//!
//! Expired, consumed, and unknown secrets are all the same "not found"; the
//! consume step races through the store so one of two concurrent
//! redemptions loses.

use axum::{extract::Extension, http::StatusCode, response::IntoResponse, Json};
use chrono::Utc;
use serde::{Deserialize, Serialize};
use sqlx::PgPool;
use std::sync::Arc;
use tracing::error;
use utoipa::ToSchema;

use crate::auth::password::hash_password;
use crate::auth::reset;
use crate::donaci::handlers::{normalize_email, valid_email};
use crate::donaci::AppState;
use crate::store::person::update_password_hash;
use crate::store::reset::{
    consume_reset_secret, find_reset_secret_for_use, insert_reset_secret,
};

#[derive(ToSchema, Serialize, Deserialize, Debug)]
pub struct RequestResetRequest {
    email: String,
}

#[derive(ToSchema, Serialize, Deserialize, Debug)]
pub struct ConfirmResetRequest {
    secret: String,
    password: String,
}

/// Mint a reset secret for a password-holding account (always returns 204
/// to avoid account probing). Mailing the reset link is the mailer
/// collaborator's job.
#[utoipa::path(
    post,
    path = "/v1/auth/password-resets",
    request_body = RequestResetRequest,
    responses(
        (status = 204, description = "Reset request accepted")
    ),
    tag = "auth"
)]
pub async fn request_reset(
    pool: Extension<PgPool>,
    payload: Option<Json<RequestResetRequest>>,
) -> impl IntoResponse {
    let Some(Json(request)) = payload else {
        return (StatusCode::BAD_REQUEST, "Missing payload".to_string()).into_response();
    };

    let email = normalize_email(&request.email);
    if !valid_email(&email) {
        return StatusCode::NO_CONTENT.into_response();
    }

    let person = match crate::store::person::lookup_login_person(&pool, &email).await {
        Ok(person) => person,
        Err(err) => {
            error!("Failed to lookup person for reset: {err}");
            // Fail closed but keep the response opaque.
            return StatusCode::NO_CONTENT.into_response();
        }
    };

    if let Some(person) = person {
        let secret = reset::generate_secret();
        if let Err(err) = insert_reset_secret(&pool, person.id, &secret, Utc::now()).await {
            error!("Failed to persist reset secret: {err}");
        }
    }

    StatusCode::NO_CONTENT.into_response()
}

/// Exchange a live secret for a password change, consuming it exactly once.
#[utoipa::path(
    post,
    path = "/v1/auth/password-resets/confirm",
    request_body = ConfirmResetRequest,
    responses(
        (status = 204, description = "Password changed, secret consumed"),
        (status = 400, description = "Missing password", body = String),
        (status = 404, description = "Secret expired, used, or unknown", body = String)
    ),
    tag = "auth"
)]
pub async fn confirm_reset(
    pool: Extension<PgPool>,
    state: Extension<Arc<AppState>>,
    payload: Option<Json<ConfirmResetRequest>>,
) -> impl IntoResponse {
    let Some(Json(request)) = payload else {
        return (StatusCode::BAD_REQUEST, "Missing payload".to_string()).into_response();
    };

    if request.password.is_empty() {
        return (StatusCode::BAD_REQUEST, "Missing password".to_string()).into_response();
    }

    // Hash before opening the transaction; bcrypt is the slow part.
    let password_hash = match hash_password(&request.password) {
        Ok(hash) => hash,
        Err(err) => {
            error!("Failed to hash password: {err}");
            return (
                StatusCode::INTERNAL_SERVER_ERROR,
                "Reset failed".to_string(),
            )
                .into_response();
        }
    };

    let now = Utc::now();
    let secret = request.secret.trim();
    let not_found = || (StatusCode::NOT_FOUND, "Secret not found".to_string()).into_response();

    let mut tx = match pool.begin().await {
        Ok(tx) => tx,
        Err(err) => {
            error!("Failed to start reset transaction: {err}");
            return (
                StatusCode::INTERNAL_SERVER_ERROR,
                "Reset failed".to_string(),
            )
                .into_response();
        }
    };

    let oldest = reset::oldest_valid(state.config(), now);
    let record = match find_reset_secret_for_use(&mut tx, secret, oldest).await {
        Ok(Some(record)) => record,
        Ok(None) => {
            let _ = tx.rollback().await;
            return not_found();
        }
        Err(err) => {
            error!("Failed to find reset secret: {err}");
            let _ = tx.rollback().await;
            return (
                StatusCode::INTERNAL_SERVER_ERROR,
                "Reset failed".to_string(),
            )
                .into_response();
        }
    };

    match consume_reset_secret(&mut tx, secret, now).await {
        Ok(true) => {}
        Ok(false) => {
            // A concurrent redemption won the race.
            let _ = tx.rollback().await;
            return not_found();
        }
        Err(err) => {
            error!("Failed to consume reset secret: {err}");
            let _ = tx.rollback().await;
            return (
                StatusCode::INTERNAL_SERVER_ERROR,
                "Reset failed".to_string(),
            )
                .into_response();
        }
    }

    match update_password_hash(&mut *tx, record.person_id, &password_hash).await {
        Ok(true) => {}
        Ok(false) => {
            let _ = tx.rollback().await;
            return not_found();
        }
        Err(err) => {
            error!("Failed to update password hash: {err}");
            let _ = tx.rollback().await;
            return (
                StatusCode::INTERNAL_SERVER_ERROR,
                "Reset failed".to_string(),
            )
                .into_response();
        }
    }

    if let Err(err) = tx.commit().await {
        error!("Failed to commit reset transaction: {err}");
        return (
            StatusCode::INTERNAL_SERVER_ERROR,
            "Reset failed".to_string(),
        )
            .into_response();
    }

    StatusCode::NO_CONTENT.into_response()
}
