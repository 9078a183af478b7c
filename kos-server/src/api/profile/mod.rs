//! Profile API (the caller's own account)

mod handler;

use axum::{
    Router,
    routing::{get, post, put},
};

use super::authed;
use crate::state::AppState;

pub fn router(state: &AppState) -> Router<AppState> {
    let routes = Router::new()
        .route("/", get(handler::get).put(handler::update))
        .route("/change-password", put(handler::change_password))
        .route("/photo", post(handler::upload_photo));
    Router::new().nest("/profile", authed(state, routes))
}
