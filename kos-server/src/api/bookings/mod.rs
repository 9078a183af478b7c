//! Booking API

mod handler;

use axum::{
    Router,
    routing::{get, post, put},
};

use super::{admin_only, authed};
use crate::state::AppState;

pub fn router(state: &AppState) -> Router<AppState> {
    Router::new().nest("/bookings", routes(state))
}

fn routes(state: &AppState) -> Router<AppState> {
    let tenant = Router::new()
        .route("/", get(handler::list_mine).post(handler::create))
        .route("/with-proof", post(handler::create_with_proof))
        .route("/{id}", get(handler::get_by_id))
        .route("/{id}/cancel", post(handler::cancel))
        .route("/{id}/extend", post(handler::extend));

    let manage = Router::new()
        .route("/all", get(handler::list_all))
        .route("/stats", get(handler::stats))
        .route("/{id}", put(handler::update));

    authed(state, tenant).merge(admin_only(state, manage))
}
