//! Health check endpoint

use axum::{extract::State, routing::get, Json, Router};
use serde::Serialize;

use crate::convert::BackendKind;
use crate::state::AppState;

#[derive(Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub version: &'static str,
    pub service: &'static str,
    pub backend: BackendKind,
    pub backend_available: bool,
}

/// Reports which backend is active and whether its tools were found at startup
pub async fn health_check(State(state): State<AppState>) -> Json<HealthResponse> {
    let backend_available = state.backend_available();

    Json(HealthResponse {
        status: if backend_available { "healthy" } else { "degraded" },
        version: env!("CARGO_PKG_VERSION"),
        service: "nbpdf-server",
        backend: state.converter().backend().kind(),
        backend_available,
    })
}

pub fn router() -> Router<AppState> {
    Router::new().route("/health", get(health_check))
}
