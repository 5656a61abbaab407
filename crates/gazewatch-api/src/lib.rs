//! Axum WebSocket server for streaming face cue analysis.
//!
//! This crate provides:
//! - `/ws/:client_id` session loop: one analysis outcome per frame
//! - Health and readiness probes
//! - Prometheus metrics

pub mod config;
pub mod error;
pub mod handlers;
pub mod metrics;
pub mod middleware;
pub mod routes;
pub mod state;
pub mod ws;

pub use config::ApiConfig;
pub use error::{ApiError, ApiResult};
pub use routes::create_router;
pub use state::AppState;
pub use ws::{run_session, SessionEnd};
