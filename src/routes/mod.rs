//! Router assembly: quiz API endpoints, SSE stream, JSON 404, CORS, and HTTP tracing.

use std::sync::Arc;

use axum::{
    routing::{get, post},
    Router,
};
use tower_http::{
    cors::{Any, CorsLayer},
    trace::{DefaultMakeSpan, DefaultOnRequest, DefaultOnResponse, TraceLayer},
};
use tracing::Level;

use crate::state::AppState;

pub mod http;
pub mod sse;

/// Build the application router with:
/// - REST-ish API under `/api/...`
/// - SSE batch stream at `/api/generate-quiz/stream`
/// - JSON 404 for everything else
/// - CORS (allow any origin/method/headers); tighten for production if needed
/// - HTTP trace layer (per-request spans w/ method, path, status, latency)
pub fn build_router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/api/health", get(http::http_health))
        .route("/api/generate-quiz", post(http::http_generate_quiz))
        .route("/api/generate-quiz/stream", get(sse::sse_generate_quiz))
        .route("/api/submit-quiz", post(http::http_submit_quiz))
        .fallback(http::http_not_found)
        // State + CORS + HTTP tracing
        .with_state(state)
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any),
        )
        .layer(
            TraceLayer::new_for_http()
                .make_span_with(DefaultMakeSpan::new().level(Level::INFO))
                .on_request(DefaultOnRequest::new().level(Level::INFO))
                .on_response(DefaultOnResponse::new().level(Level::INFO)),
        )
}
