//! HTTP request handlers organized by domain
//!
//! Each submodule contains handlers for a specific API area.

pub mod budget;
pub mod testers;
pub mod transactions;
pub mod users;

// Re-export all handlers for use in router
pub use budget::*;
pub use testers::*;
pub use transactions::*;
pub use users::*;

use std::sync::Arc;

use axum::{extract::State, Json};
use serde::Serialize;

use crate::AppState;

#[derive(Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub version: &'static str,
    pub classify_workers: usize,
}

/// GET /health - Liveness check
pub async fn health(State(state): State<Arc<AppState>>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok",
        version: env!("CARGO_PKG_VERSION"),
        classify_workers: state.config.classify_workers,
    })
}
