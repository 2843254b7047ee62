// Web server — Axum-based moderation endpoint.
//
// One route does the work (`/`, aliased at `/api/moderate`) and gates on the
// HTTP method itself so OPTIONS and unsupported verbs get the exact status
// codes and bodies callers expect. Every response, whatever the route or
// status, carries the same three CORS headers.

use std::sync::Arc;

use anyhow::Result;
use axum::extract::DefaultBodyLimit;
use axum::http::{header, HeaderValue, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::routing::{any, get};
use axum::Router;
use tower_http::set_header::SetResponseHeaderLayer;
use tower_http::trace::TraceLayer;
use tracing::{info, warn};

use crate::config::{Config, DEFAULT_CORS_ORIGIN};
use crate::moderation::Moderator;

pub mod handlers;

pub const ALLOW_METHODS: &str = "POST,OPTIONS";
pub const ALLOW_HEADERS: &str = "Content-Type, Authorization";

/// Largest request body the endpoint will read.
pub const MAX_BODY_BYTES: usize = 64 * 1024;

/// Shared application state threaded through all Axum handlers.
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<Config>,
    pub moderator: Arc<Moderator>,
}

impl AppState {
    pub fn new(config: Config, moderator: Moderator) -> Self {
        Self {
            config: Arc::new(config),
            moderator: Arc::new(moderator),
        }
    }
}

/// Start the Axum web server and block until it exits.
pub async fn run_server(state: AppState, port: u16, bind: &str) -> Result<()> {
    let app = build_router(state);

    let addr = format!("{bind}:{port}");
    info!("foulcheck listening on http://{addr}");

    let listener = tokio::net::TcpListener::bind(&addr).await?;
    axum::serve(listener, app).await?;
    Ok(())
}

pub fn build_router(state: AppState) -> Router {
    let origin = cors_origin_header(&state.config.cors_origin);

    Router::new()
        .route("/", any(handlers::moderate::moderate))
        .route("/api/moderate", any(handlers::moderate::moderate))
        .route("/health", get(health))
        .layer(DefaultBodyLimit::max(MAX_BODY_BYTES))
        .layer(TraceLayer::new_for_http())
        .layer(SetResponseHeaderLayer::overriding(
            header::ACCESS_CONTROL_ALLOW_ORIGIN,
            origin,
        ))
        .layer(SetResponseHeaderLayer::overriding(
            header::ACCESS_CONTROL_ALLOW_METHODS,
            HeaderValue::from_static(ALLOW_METHODS),
        ))
        .layer(SetResponseHeaderLayer::overriding(
            header::ACCESS_CONTROL_ALLOW_HEADERS,
            HeaderValue::from_static(ALLOW_HEADERS),
        ))
        .with_state(state)
}

/// Header value for the configured origin, falling back to `*` if the
/// configured string isn't a legal header value.
fn cors_origin_header(origin: &str) -> HeaderValue {
    HeaderValue::from_str(origin).unwrap_or_else(|_| {
        warn!(origin = %origin, "CORS_ORIGIN is not a valid header value, using *");
        HeaderValue::from_static(DEFAULT_CORS_ORIGIN)
    })
}

/// Liveness check — always returns 200 OK.
async fn health() -> impl IntoResponse {
    (
        StatusCode::OK,
        axum::Json(serde_json::json!({ "status": "ok" })),
    )
}

/// Typed JSON error response helper.
pub fn api_error(status: StatusCode, code: &str) -> Response {
    (status, axum::Json(serde_json::json!({ "error": code }))).into_response()
}
