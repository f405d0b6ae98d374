//! Person reads and owner deletion, gated on complete-class tokens.

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

use crate::auth::{authorize, AccessPolicy};
use crate::donaci::handlers::bearer_token;
use crate::donaci::AppState;
use crate::store::person::{delete_person as delete_person_record, lookup_person};

#[derive(ToSchema, Serialize, Deserialize, Debug)]
pub struct PersonResponse {
    id: Uuid,
    email: String,
    email_verified: bool,
    psp_customer_id: Option<String>,
}

#[utoipa::path(
    get,
    path = "/v1/people/{id}",
    params(
        ("id" = Uuid, Path, description = "Person to read")
    ),
    responses(
        (status = 200, description = "Person record", body = PersonResponse),
        (status = 401, description = "Missing or invalid complete-class token", body = String),
        (status = 404, description = "Person not found", body = String)
    ),
    tag = "people"
)]
pub async fn person(
    pool: Extension<PgPool>,
    state: Extension<Arc<AppState>>,
    Path(person_id): Path<Uuid>,
    headers: HeaderMap,
) -> impl IntoResponse {
    let bearer = bearer_token(&headers);
    if !authorize(
        state.tokens(),
        person_id,
        AccessPolicy::Complete,
        bearer.as_deref(),
        Utc::now().timestamp(),
    ) {
        return (StatusCode::UNAUTHORIZED, "Invalid token".to_string()).into_response();
    }

    match lookup_person(&pool, person_id).await {
        Ok(Some(person)) => (
            StatusCode::OK,
            Json(PersonResponse {
                id: person.id,
                email: person.email,
                email_verified: person.email_verified_at.is_some(),
                psp_customer_id: person.psp_customer_id,
            }),
        )
            .into_response(),
        Ok(None) => (StatusCode::NOT_FOUND, "Person not found".to_string()).into_response(),
        Err(err) => {
            error!("Failed to lookup person: {err}");
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                "Lookup failed".to_string(),
            )
                .into_response()
        }
    }
}

/// Owner deletion. The FK cascade clears outstanding reset secrets with the
/// row; deleting an already-absent person is a quiet success.
#[utoipa::path(
    delete,
    path = "/v1/people/{id}",
    params(
        ("id" = Uuid, Path, description = "Person to delete")
    ),
    responses(
        (status = 204, description = "Person deleted"),
        (status = 401, description = "Missing or invalid complete-class token", body = String)
    ),
    tag = "people"
)]
pub async fn delete_person(
    pool: Extension<PgPool>,
    state: Extension<Arc<AppState>>,
    Path(person_id): Path<Uuid>,
    headers: HeaderMap,
) -> impl IntoResponse {
    let bearer = bearer_token(&headers);
    if !authorize(
        state.tokens(),
        person_id,
        AccessPolicy::Complete,
        bearer.as_deref(),
        Utc::now().timestamp(),
    ) {
        return (StatusCode::UNAUTHORIZED, "Invalid token".to_string()).into_response();
    }

    match delete_person_record(&pool, person_id).await {
        Ok(_) => StatusCode::NO_CONTENT.into_response(),
        Err(err) => {
            error!("Failed to delete person: {err}");
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                "Delete failed".to_string(),
            )
                .into_response()
        }
    }
}
