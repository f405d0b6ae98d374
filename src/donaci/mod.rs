//! Service wiring: state, router, and the listening loop.

use anyhow::{Context, Result};
use axum::{
    body::Body,
    extract::MatchedPath,
    http::{HeaderName, HeaderValue, Request},
    routing::{get, post, put},
    Extension, Router,
};
use sqlx::postgres::PgPoolOptions;
use std::{sync::Arc, time::Duration};
use tokio::net::TcpListener;
use tower::ServiceBuilder;
use tower_http::{
    request_id::PropagateRequestIdLayer, set_header::SetRequestHeaderLayer, trace::TraceLayer,
};
use tracing::{info, info_span, Span};
use ulid::Ulid;
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

use crate::auth::{AuthConfig, SessionTokens};
use crate::cli::globals::GlobalArgs;

pub mod handlers;
mod openapi;

/// Shared per-process state: the token signer and the window policies.
pub struct AppState {
    tokens: SessionTokens,
    config: AuthConfig,
}

impl AppState {
    #[must_use]
    pub fn new(tokens: SessionTokens, config: AuthConfig) -> Self {
        Self { tokens, config }
    }

    #[must_use]
    pub fn tokens(&self) -> &SessionTokens {
        &self.tokens
    }

    #[must_use]
    pub fn config(&self) -> &AuthConfig {
        &self.config
    }
}

fn make_span(request: &Request<Body>) -> Span {
    let path = request.extensions().get::<MatchedPath>().map_or_else(
        || request.uri().path().to_string(),
        |matched| matched.as_str().to_string(),
    );
    info_span!(
        "http.request",
        method = %request.method(),
        path = %path,
    )
}

#[must_use]
pub fn router() -> Router {
    Router::new()
        .route("/health", get(handlers::health))
        .route("/v1/auth/login", post(handlers::login::login))
        .route("/v1/auth/verify", post(handlers::token::verify))
        .route(
            "/v1/auth/email-codes",
            post(handlers::email_code::request_code),
        )
        .route(
            "/v1/auth/email-codes/check",
            post(handlers::email_code::check_code),
        )
        .route(
            "/v1/auth/password-resets",
            post(handlers::reset::request_reset),
        )
        .route(
            "/v1/auth/password-resets/confirm",
            post(handlers::reset::confirm_reset),
        )
        .route(
            "/v1/people/:id",
            get(handlers::person::person).delete(handlers::person::delete_person),
        )
        .route(
            "/v1/people/:id/password",
            put(handlers::complete::set_first_password),
        )
        .merge(
            SwaggerUi::new("/swagger-ui")
                .url("/api-docs/openapi.json", openapi::ApiDoc::openapi()),
        )
}

/// Start the server.
///
/// # Errors
///
/// Returns an error if the token signer is misconfigured, the database is
/// unreachable, or the listener cannot bind.
pub async fn new(port: u16, dsn: String, globals: &GlobalArgs) -> Result<()> {
    // Connect to database
    let pool = PgPoolOptions::new()
        .min_connections(1)
        .max_connections(5)
        .max_lifetime(Duration::from_secs(60 * 2))
        .test_before_acquire(true)
        .connect(&dsn)
        .await
        .context("Failed to connect to database")?;

    // An empty signing secret fails here, before anything is served.
    let tokens = SessionTokens::new(globals.base_url.clone(), globals.token_secret.clone())
        .context("Failed to initialize session token signer")?;
    let state = Arc::new(AppState::new(
        tokens,
        AuthConfig::new(globals.base_url.clone()),
    ));

    let app = router().layer(
        ServiceBuilder::new()
            .layer(SetRequestHeaderLayer::if_not_present(
                HeaderName::from_static("x-request-id"),
                |_req: &Request<Body>| HeaderValue::from_str(Ulid::new().to_string().as_str()).ok(),
            ))
            .layer(PropagateRequestIdLayer::new(HeaderName::from_static(
                "x-request-id",
            )))
            .layer(TraceLayer::new_for_http().make_span_with(make_span))
            .layer(Extension(state))
            .layer(Extension(pool)),
    );

    let listener = TcpListener::bind(format!("::0:{port}")).await?;

    info!("Listening on [::]:{}", port);

    axum::serve(listener, app.into_make_service()).await?;

    Ok(())
}
