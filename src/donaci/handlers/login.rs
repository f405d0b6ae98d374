//! Password login: verify the credential, lazily upgrade stale hashes, and
//! issue a complete session token.

use axum::{extract::Extension, http::StatusCode, response::IntoResponse, Json};
use chrono::Utc;
use serde::{Deserialize, Serialize};
use sqlx::PgPool;
use std::sync::Arc;
use tracing::{debug, error};
use utoipa::ToSchema;
use uuid::Uuid;

use crate::auth::password::{hash_password, needs_rehash, verify_password};
use crate::auth::PasswordError;
use crate::donaci::handlers::{normalize_email, valid_email};
use crate::donaci::AppState;
use crate::store::person::{lookup_login_person, update_password_hash};

#[derive(ToSchema, Serialize, Deserialize, Debug)]
pub struct LoginRequest {
    email: String,
    password: String,
}

#[derive(ToSchema, Serialize, Deserialize, Debug)]
pub struct LoginResponse {
    person_id: Uuid,
    token: String,
}

/// The one public-safe rejection; callers can never tell an unknown email
/// from a wrong password.
fn unauthorized() -> axum::response::Response {
    (
        StatusCode::UNAUTHORIZED,
        PasswordError::AuthenticationFailed.to_string(),
    )
        .into_response()
}

#[utoipa::path(
    post,
    path = "/v1/auth/login",
    request_body = LoginRequest,
    responses(
        (status = 200, description = "Session token issued", body = LoginResponse),
        (status = 401, description = "Email or password incorrect", body = String)
    ),
    tag = "auth"
)]
pub async fn login(
    pool: Extension<PgPool>,
    state: Extension<Arc<AppState>>,
    payload: Option<Json<LoginRequest>>,
) -> impl IntoResponse {
    let Some(Json(request)) = payload else {
        return (StatusCode::BAD_REQUEST, "Missing payload".to_string()).into_response();
    };

    let email = normalize_email(&request.email);
    if !valid_email(&email) {
        return unauthorized();
    }

    let person = match lookup_login_person(&pool, &email).await {
        Ok(person) => person,
        Err(err) => {
            error!("Failed to lookup login person: {err}");
            return (StatusCode::INTERNAL_SERVER_ERROR, "Login failed".to_string())
                .into_response();
        }
    };

    let Some(person) = person else {
        // Burn a verification so unknown emails cost the same as wrong passwords.
        let _ = verify_password(&request.password, None);
        return unauthorized();
    };

    if verify_password(&request.password, person.password_hash.as_deref()).is_err() {
        debug!("rejected login for person {}", person.id);
        return unauthorized();
    }

    // Lazy upgrade: a hash with stale parameters is replaced now, while the
    // plaintext is available. Login proceeds even if persisting fails.
    if let Some(stored) = person.password_hash.as_deref() {
        if needs_rehash(stored) {
            match hash_password(&request.password) {
                Ok(new_hash) => {
                    if let Err(err) = update_password_hash(&*pool, person.id, &new_hash).await {
                        error!("Failed to persist rehashed password: {err}");
                    }
                }
                Err(err) => error!("Failed to rehash password: {err}"),
            }
        }
    }

    let now = Utc::now().timestamp();
    match state
        .tokens()
        .create(person.id, true, person.psp_customer_id.as_deref(), now)
    {
        Ok(token) => (
            StatusCode::OK,
            Json(LoginResponse {
                person_id: person.id,
                token,
            }),
        )
            .into_response(),
        Err(err) => {
            error!("Failed to create session token: {err}");
            (StatusCode::INTERNAL_SERVER_ERROR, "Login failed".to_string()).into_response()
        }
    }
}
