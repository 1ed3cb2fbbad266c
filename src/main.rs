//! Quiz Engine · question-generation backend
//!
//! - Axum HTTP API + server-sent-events batch stream
//! - Batched, bounded-parallel calls to an OpenAI-compatible generator
//! - In-memory result cache (TTL + insertion-order eviction)
//!
//! Important env variables:
//!   PORT                : u16 (default 3001)
//!   LLAMA_API_KEY       : enables generation (aliases: LLama_API_KEY, OPENROUTER_API_KEY)
//!   LLAMA_BASE_URL      : default "https://openrouter.ai/api/v1"
//!   LLAMA_MODEL         : default "meta-llama/llama-3.1-8b-instruct"
//!   LLAMA_BATCH_SIZE    : questions per generator call (default 10)
//!   LLAMA_MAX_PARALLEL  : concurrent generator calls per request (default 3)
//!   CACHE_TTL_MS        : result cache TTL (default 6h)
//!   QUIZ_CONFIG_PATH    : path to TOML prompt overrides
//!   LOG_LEVEL           : tracing filter, e.g. "debug" or full directives
//!   LOG_FORMAT          : "pretty" (default) or "json"

mod cache;
mod config;
mod domain;
mod error;
mod llm;
mod orchestrator;
mod protocol;
mod quality;
mod recovery;
mod routes;
mod scoring;
mod state;
mod stream;
mod telemetry;
mod util;
mod validator;

use std::{net::SocketAddr, sync::Arc};
use tokio::net::TcpListener;
use tracing::info;

use crate::config::EngineConfig;
use crate::routes::build_router;
use crate::state::AppState;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
  telemetry::init_tracing();

  // One shared state for the whole process: cache, generator, config.
  let state = Arc::new(AppState::new(EngineConfig::from_env()));

  let app = build_router(state);

  let addr: SocketAddr = std::env::var("PORT")
    .ok()
    .and_then(|p| p.parse::<u16>().ok())
    .map(|port| SocketAddr::from(([0, 0, 0, 0], port)))
    .unwrap_or_else(|| SocketAddr::from(([0, 0, 0, 0], 3001)));

  let listener = TcpListener::bind(addr).await?;
  info!(target: "quiz_engine", %addr, "HTTP server listening");
  axum::serve(listener, app)
    .with_graceful_shutdown(shutdown_signal())
    .await?;
  info!(target: "quiz_engine", "Server stopped");
  Ok(())
}

async fn shutdown_signal() {
  if let Err(e) = tokio::signal::ctrl_c().await {
    tracing::error!(target: "quiz_engine", error = %e, "Failed to listen for shutdown signal");
    std::future::pending::<()>().await;
  }
  info!(target: "quiz_engine", "Shutdown signal received");
}
