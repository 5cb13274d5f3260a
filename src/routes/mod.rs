//! Route modules for the nbpdf server

pub mod convert;
pub mod health;

use axum::Router;

use crate::state::AppState;

/// Build the application router
pub fn app(state: AppState) -> Router {
    let max_upload_bytes = state.config().staging.max_upload_bytes;

    Router::new()
        .merge(convert::router(max_upload_bytes))
        .merge(health::router())
        .with_state(state)
}
