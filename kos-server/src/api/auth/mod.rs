//! Auth API
//!
//! | Path | Method | Limit |
//! |------|--------|-------|
//! | /api/auth/login | POST | strict |
//! | /api/auth/register | POST | strict |
//! | /api/auth/google-login | POST | strict |
//! | /api/auth/forgot-password | POST | strict |
//! | /api/auth/reset-password | POST | moderate |
//! | /api/auth/refresh | POST | - |
//! | /api/auth/logout | POST | - |

mod handler;

use axum::{Router, middleware, routing::post};

use crate::auth::rate_limit::{moderate_rate_limit, strict_rate_limit};
use crate::state::AppState;

pub fn router(state: &AppState) -> Router<AppState> {
    Router::new().nest("/auth", routes(state))
}

fn routes(state: &AppState) -> Router<AppState> {
    let strict = Router::new()
        .route("/login", post(handler::login))
        .route("/register", post(handler::register))
        .route("/google-login", post(handler::google_login))
        .route("/forgot-password", post(handler::forgot_password))
        .layer(middleware::from_fn_with_state(state.clone(), strict_rate_limit));

    let moderate = Router::new()
        .route("/reset-password", post(handler::reset_password))
        .layer(middleware::from_fn_with_state(state.clone(), moderate_rate_limit));

    Router::new()
        .route("/refresh", post(handler::refresh))
        .route("/logout", post(handler::logout))
        .merge(strict)
        .merge(moderate)
}
