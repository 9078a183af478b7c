//! Payment API
//!
//! `/api/payments/notification` is called by Midtrans and authenticated by
//! its signature, not by a JWT.

mod handler;

use axum::{
    Router,
    routing::{get, post, put},
};

use super::{admin_only, authed};
use crate::state::AppState;

pub fn router(state: &AppState) -> Router<AppState> {
    Router::new().nest("/payments", routes(state))
}

fn routes(state: &AppState) -> Router<AppState> {
    let public = Router::new().route("/notification", post(handler::midtrans_notification));

    let tenant = Router::new()
        .route("/", post(handler::create))
        .route("/reminders", get(handler::list_reminders))
        .route("/{id}/proof", post(handler::upload_proof))
        .route("/{id}/snap", post(handler::create_snap));

    let manage = Router::new()
        .route("/", get(handler::list))
        .route("/{id}/confirm", put(handler::confirm))
        .route("/{id}/reject", put(handler::reject))
        .route("/confirm-cash/{id}", post(handler::confirm_cash));

    public
        .merge(authed(state, tenant))
        .merge(admin_only(state, manage))
}
