//! Health check

use axum::{Router, routing::get};
use serde::Serialize;

use super::{ApiResult, ok};
use crate::state::AppState;

pub fn router() -> Router<AppState> {
    Router::new().route("/health", get(health))
}

#[derive(Serialize)]
pub struct HealthResponse {
    status: &'static str,
    service: &'static str,
    version: &'static str,
}

pub async fn health() -> ApiResult<HealthResponse> {
    ok(HealthResponse {
        status: "ok",
        service: "kos-server",
        version: env!("CARGO_PKG_VERSION"),
    })
}
