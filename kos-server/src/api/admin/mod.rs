//! Admin-only reporting: dashboard and tenant directory

mod handler;

use axum::{Router, routing::get};

use super::admin_only;
use crate::state::AppState;

pub fn router(state: &AppState) -> Router<AppState> {
    let routes = Router::new()
        .route("/dashboard", get(handler::dashboard))
        .route("/tenants", get(handler::list_tenants));
    admin_only(state, routes)
}
