//! Token verdicts for sibling services.
//!
//! The response is a bare status: accepted or forbidden. The rejection
//! reason stays in this service's logs.

use axum::{extract::Extension, http::StatusCode, response::IntoResponse, Json};
use chrono::Utc;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use utoipa::ToSchema;
use uuid::Uuid;

use crate::donaci::AppState;

#[derive(ToSchema, Serialize, Deserialize, Debug)]
pub struct VerifyRequest {
    person_id: Uuid,
    #[serde(default)]
    required_complete: Option<bool>,
    token: String,
}

#[utoipa::path(
    post,
    path = "/v1/auth/verify",
    request_body = VerifyRequest,
    responses(
        (status = 202, description = "Token is valid for the person and required completeness"),
        (status = 403, description = "Token expired or invalid")
    ),
    tag = "auth"
)]
pub async fn verify(
    state: Extension<Arc<AppState>>,
    payload: Option<Json<VerifyRequest>>,
) -> impl IntoResponse {
    let Some(Json(request)) = payload else {
        return StatusCode::BAD_REQUEST;
    };

    let now = Utc::now().timestamp();
    if state.tokens().check(
        request.person_id,
        request.required_complete,
        &request.token,
        now,
    ) {
        StatusCode::ACCEPTED
    } else {
        StatusCode::FORBIDDEN
    }
}
