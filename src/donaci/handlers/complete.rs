//! Account completion: exchange a live email code for a first password.
//!
//! Gated on an incomplete-class token for the same person. The narrowed
//! code window applies here so a code about to expire fails up front rather
//! than mid-form.

use axum::{
    extract::{Extension, Path},
    http::{HeaderMap, StatusCode},
    response::IntoResponse,
    Json,
};
use chrono::Utc;
use serde::{Deserialize, Serialize};
use sqlx::PgPool;
use std::sync::Arc;
use tracing::error;
use utoipa::ToSchema;
use uuid::Uuid;

use crate::auth::code;
use crate::auth::password::hash_password;
use crate::auth::{authorize, AccessPolicy};
use crate::donaci::handlers::{bearer_token, normalize_email, valid_email};
use crate::donaci::AppState;
use crate::store::email_code::find_email_code;
use crate::store::person::{complete_person, lookup_person, CompletionOutcome};

#[derive(ToSchema, Serialize, Deserialize, Debug)]
pub struct CompleteRequest {
    email: String,
    code: String,
    password: String,
}

#[utoipa::path(
    put,
    path = "/v1/people/{id}/password",
    request_body = CompleteRequest,
    params(
        ("id" = Uuid, Path, description = "Person to attach the first password to")
    ),
    responses(
        (status = 204, description = "Password set, email verified"),
        (status = 400, description = "Invalid email, code, or password", body = String),
        (status = 401, description = "Missing or invalid incomplete-class token", body = String),
        (status = 409, description = "Password already set or email already registered", body = String)
    ),
    tag = "people"
)]
pub async fn set_first_password(
    pool: Extension<PgPool>,
    state: Extension<Arc<AppState>>,
    Path(person_id): Path<Uuid>,
    headers: HeaderMap,
    payload: Option<Json<CompleteRequest>>,
) -> impl IntoResponse {
    let Some(Json(request)) = payload else {
        return (StatusCode::BAD_REQUEST, "Missing payload".to_string()).into_response();
    };

    let now = Utc::now();
    let bearer = bearer_token(&headers);
    if !authorize(
        state.tokens(),
        person_id,
        AccessPolicy::Incomplete,
        bearer.as_deref(),
        now.timestamp(),
    ) {
        return (StatusCode::UNAUTHORIZED, "Invalid token".to_string()).into_response();
    }

    let email = normalize_email(&request.email);
    if !valid_email(&email) {
        return (StatusCode::BAD_REQUEST, "Invalid email".to_string()).into_response();
    }
    if request.password.is_empty() {
        return (StatusCode::BAD_REQUEST, "Missing password".to_string()).into_response();
    }

    let person = match lookup_person(&pool, person_id).await {
        Ok(person) => person,
        Err(err) => {
            error!("Failed to lookup person: {err}");
            return (
                StatusCode::INTERNAL_SERVER_ERROR,
                "Completion failed".to_string(),
            )
                .into_response();
        }
    };
    let Some(person) = person else {
        return (StatusCode::NOT_FOUND, "Person not found".to_string()).into_response();
    };
    if person.password_hash.is_some() {
        // A second password can never be attached through this path.
        return (StatusCode::CONFLICT, "Password already set".to_string()).into_response();
    }
    if person.email != email {
        // The code proves control of the person's own address, no other.
        return (StatusCode::BAD_REQUEST, "Invalid code".to_string()).into_response();
    }

    let oldest = code::oldest_valid_for_completion(state.config(), now);
    match find_email_code(&pool, &email, request.code.trim(), oldest).await {
        Ok(Some(_)) => {}
        Ok(None) => {
            return (StatusCode::BAD_REQUEST, "Invalid code".to_string()).into_response();
        }
        Err(err) => {
            error!("Failed to lookup email verification code: {err}");
            return (
                StatusCode::INTERNAL_SERVER_ERROR,
                "Completion failed".to_string(),
            )
                .into_response();
        }
    }

    let password_hash = match hash_password(&request.password) {
        Ok(hash) => hash,
        Err(err) => {
            error!("Failed to hash password: {err}");
            return (
                StatusCode::INTERNAL_SERVER_ERROR,
                "Completion failed".to_string(),
            )
                .into_response();
        }
    };

    let mut tx = match pool.begin().await {
        Ok(tx) => tx,
        Err(err) => {
            error!("Failed to start completion transaction: {err}");
            return (
                StatusCode::INTERNAL_SERVER_ERROR,
                "Completion failed".to_string(),
            )
                .into_response();
        }
    };

    match complete_person(&mut tx, person_id, &password_hash, now).await {
        Ok(CompletionOutcome::Completed) => {
            if let Err(err) = tx.commit().await {
                error!("Failed to commit completion transaction: {err}");
                return (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "Completion failed".to_string(),
                )
                    .into_response();
            }
            StatusCode::NO_CONTENT.into_response()
        }
        Ok(CompletionOutcome::NotEligible) => {
            let _ = tx.rollback().await;
            (StatusCode::CONFLICT, "Password already set".to_string()).into_response()
        }
        Ok(CompletionOutcome::EmailTaken) => {
            let _ = tx.rollback().await;
            (
                StatusCode::CONFLICT,
                "Email already registered".to_string(),
            )
                .into_response()
        }
        Err(err) => {
            error!("Failed to complete person: {err}");
            let _ = tx.rollback().await;
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                "Completion failed".to_string(),
            )
                .into_response()
        }
    }
}
