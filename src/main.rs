//! Tango · vocabulary builder and adaptive quiz backend
//!
//! - Turns OCR text from photographed word lists into English/Japanese pairs
//! - Drills stored words with four-option quizzes; difficulty follows answers
//! - Axum HTTP + WebSocket API, static SPA fallback (./static/index.html)
//!
//! Important env variables:
//!   PORT              : u16 (default 3000)
//!   TANGO_CONFIG_PATH : path to TOML config (store backend, study constants, samples)
//!   TANGO_SESSION_IDLE_SECS : idle timeout for HTTP study sessions (default 1800)
//!   OPENAI_API_KEY    : enables the vision OCR adapter if present
//!   OPENAI_BASE_URL   : default "https://api.openai.com/v1"
//!   OPENAI_OCR_MODEL  : default "gpt-4o-mini"
//!   LOG_LEVEL         : tracing filter, e.g. "debug" or full directives
//!   LOG_FORMAT        : "pretty" (default) or "json"

mod telemetry;
mod error;
mod domain;
mod config;
mod seeds;
mod extract;
mod difficulty;
mod quiz;
mod store;
mod session;
mod ocr;
mod state;
mod protocol;
mod logic;
mod routes;

use std::{net::SocketAddr, sync::Arc};
use tokio::net::TcpListener;
use tracing::info;

use crate::routes::build_router;
use crate::state::AppState;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
  telemetry::init_tracing();

  // Shared state: configured store, sample set, OCR engine, live sessions.
  let state = Arc::new(AppState::new());

  let app = build_router(state.clone());

  let addr: SocketAddr = std::env::var("PORT")
    .ok()
    .and_then(|p| p.parse::<u16>().ok())
    .map(|port| SocketAddr::from(([0, 0, 0, 0], port)))
    .unwrap_or_else(|| SocketAddr::from(([0, 0, 0, 0], 3000)));

  let listener = TcpListener::bind(addr).await?;
  info!(target: "tango_backend", %addr, "HTTP server listening");
  axum::serve(listener, app)
    .with_graceful_shutdown(shutdown_signal())
    .await?;
  Ok(())
}

async fn shutdown_signal() {
  if let Err(e) = tokio::signal::ctrl_c().await {
    tracing::error!(target: "tango_backend", error = %e, "Failed to listen for ctrl-c");
  }
  info!(target: "tango_backend", "Shutdown signal received");
}
