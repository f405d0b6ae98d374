//! Email verification codes: request a new code, confirm a code is live.

use axum::{extract::Extension, http::StatusCode, response::IntoResponse, Json};
use chrono::Utc;
use serde::{Deserialize, Serialize};
use sqlx::PgPool;
use std::sync::Arc;
use tracing::error;
use utoipa::ToSchema;

use crate::auth::code::{self, EmailCode};
use crate::donaci::handlers::{normalize_email, valid_email};
use crate::donaci::AppState;
use crate::store::email_code::{find_email_code, insert_email_code};

#[derive(ToSchema, Serialize, Deserialize, Debug)]
pub struct RequestCodeRequest {
    email: String,
}

#[derive(ToSchema, Serialize, Deserialize, Debug)]
pub struct CheckCodeRequest {
    email: String,
    code: String,
}

/// Mint a code proving control of an email address (always returns 204 to
/// avoid account probing). Delivering the code is the mailer collaborator's
/// job; this endpoint only persists it.
#[utoipa::path(
    post,
    path = "/v1/auth/email-codes",
    request_body = RequestCodeRequest,
    responses(
        (status = 204, description = "Code request accepted")
    ),
    tag = "auth"
)]
pub async fn request_code(
    pool: Extension<PgPool>,
    payload: Option<Json<RequestCodeRequest>>,
) -> impl IntoResponse {
    let Some(Json(request)) = payload else {
        return (StatusCode::BAD_REQUEST, "Missing payload".to_string()).into_response();
    };

    let email = normalize_email(&request.email);
    if !valid_email(&email) {
        // Always return 204 for invalid emails to keep the response opaque.
        return StatusCode::NO_CONTENT.into_response();
    }

    let code = EmailCode::for_address(&email, Utc::now());
    if let Err(err) = insert_email_code(&pool, &code).await {
        error!("Failed to persist email verification code: {err}");
        // Fail closed but keep the response opaque.
    }

    StatusCode::NO_CONTENT.into_response()
}

/// Confirm that a code is still inside its plain validity window.
#[utoipa::path(
    post,
    path = "/v1/auth/email-codes/check",
    request_body = CheckCodeRequest,
    responses(
        (status = 204, description = "Code is live"),
        (status = 404, description = "No live code for this email/code pair", body = String)
    ),
    tag = "auth"
)]
pub async fn check_code(
    pool: Extension<PgPool>,
    state: Extension<Arc<AppState>>,
    payload: Option<Json<CheckCodeRequest>>,
) -> impl IntoResponse {
    let Some(Json(request)) = payload else {
        return (StatusCode::BAD_REQUEST, "Missing payload".to_string()).into_response();
    };

    let email = normalize_email(&request.email);
    let oldest = code::oldest_valid(state.config(), Utc::now());

    match find_email_code(&pool, &email, request.code.trim(), oldest).await {
        Ok(Some(_)) => StatusCode::NO_CONTENT.into_response(),
        Ok(None) => (StatusCode::NOT_FOUND, "Code not found".to_string()).into_response(),
        Err(err) => {
            error!("Failed to check email verification code: {err}");
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                "Check failed".to_string(),
            )
                .into_response()
        }
    }
}
