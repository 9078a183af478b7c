//! Public content: gallery, reviews, contact form

mod handler;

use axum::{
    Router, middleware,
    routing::{delete, get, post},
};

use super::{admin_only, authed};
use crate::auth::rate_limit::moderate_rate_limit;
use crate::state::AppState;

pub fn router(state: &AppState) -> Router<AppState> {
    let public = Router::new()
        .route("/galleries", get(handler::list_galleries))
        .route("/reviews", get(handler::list_reviews));

    let contact = Router::new()
        .route("/contact", post(handler::contact))
        .layer(middleware::from_fn_with_state(state.clone(), moderate_rate_limit));

    let tenant = Router::new().route("/reviews", post(handler::create_review));

    let manage = Router::new()
        .route("/galleries", post(handler::create_gallery))
        .route("/galleries/{id}", delete(handler::delete_gallery));

    public
        .merge(contact)
        .merge(authed(state, tenant))
        .merge(admin_only(state, manage))
}
