//! Room (kamar) API

mod handler;

use axum::{
    Router,
    routing::{get, put},
};

use super::admin_only;
use crate::state::AppState;

pub fn router(state: &AppState) -> Router<AppState> {
    Router::new().nest("/kamar", routes(state))
}

fn routes(state: &AppState) -> Router<AppState> {
    let public = Router::new()
        .route("/", get(handler::list))
        .route("/{id}", get(handler::get_by_id))
        .route("/{id}/reviews", get(handler::list_reviews));

    let manage = Router::new()
        .route("/", axum::routing::post(handler::create))
        .route("/{id}", put(handler::update).delete(handler::delete))
        .route("/{id}/status", put(handler::update_status));

    public.merge(admin_only(state, manage))
}
