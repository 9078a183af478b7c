//! HTTP API
//!
//! Every route lives under `/api` and answers with the [`ApiResponse`]
//! envelope. Each resource module exposes `router(&AppState)`, layering
//! `require_auth` / `require_admin` on its protected groups.

pub mod admin;
pub mod auth;
pub mod bookings;
pub mod content;
pub mod health;
pub mod payments;
pub mod profile;
pub mod rooms;
pub mod ws;

use axum::extract::DefaultBodyLimit;
use axum::{Json, Router, middleware};
use http::{HeaderName, HeaderValue, Method};
use shared::error::{ApiResponse, AppError};
use tower_http::compression::CompressionLayer;
use tower_http::cors::{AllowOrigin, Any, CorsLayer};
use tower_http::request_id::{MakeRequestId, PropagateRequestIdLayer, RequestId, SetRequestIdLayer};
use tower_http::services::ServeDir;
use tower_http::trace::TraceLayer;
use uuid::Uuid;

use crate::auth::{require_admin, require_auth};
use crate::state::AppState;

/// Largest accepted request body (multipart uploads included)
pub const MAX_BODY_BYTES: usize = 10 * 1024 * 1024;

const REQUEST_ID_HEADER: &str = "x-request-id";

pub type ApiResult<T> = Result<Json<ApiResponse<T>>, AppError>;

/// Wrap data in a success envelope
pub fn ok<T>(data: T) -> ApiResult<T> {
    Ok(Json(ApiResponse::success(data)))
}

pub fn ok_with_message<T>(message: impl Into<String>, data: T) -> ApiResult<T> {
    Ok(Json(ApiResponse::success_with_message(message, data)))
}

#[derive(Clone)]
struct XRequestId;

impl MakeRequestId for XRequestId {
    fn make_request_id<B>(&mut self, _request: &http::Request<B>) -> Option<RequestId> {
        HeaderValue::from_str(&Uuid::new_v4().to_string())
            .ok()
            .map(RequestId::new)
    }
}

/// Routes that require a logged-in user
pub(crate) fn authed(state: &AppState, router: Router<AppState>) -> Router<AppState> {
    router.layer(middleware::from_fn_with_state(state.clone(), require_auth))
}

/// Routes that require the admin role
pub(crate) fn admin_only(state: &AppState, router: Router<AppState>) -> Router<AppState> {
    router
        .layer(middleware::from_fn(require_admin))
        .layer(middleware::from_fn_with_state(state.clone(), require_auth))
}

/// All `/api` routes, without global middleware
pub fn build_router(state: &AppState) -> Router<AppState> {
    let api = Router::new()
        .merge(health::router())
        .merge(auth::router(state))
        .merge(rooms::router(state))
        .merge(bookings::router(state))
        .merge(payments::router(state))
        .merge(profile::router(state))
        .merge(content::router(state))
        .merge(admin::router(state))
        .merge(ws::router());

    Router::new().nest("/api", api)
}

fn cors_layer(state: &AppState) -> CorsLayer {
    let origins: Vec<HeaderValue> = state
        .config
        .allowed_origins
        .iter()
        .filter_map(|o| HeaderValue::from_str(o).ok())
        .collect();

    let layer = CorsLayer::new()
        .allow_methods([Method::GET, Method::POST, Method::PUT, Method::DELETE, Method::OPTIONS])
        .allow_headers([http::header::AUTHORIZATION, http::header::CONTENT_TYPE]);
    if origins.is_empty() {
        layer.allow_origin(Any)
    } else {
        layer.allow_origin(AllowOrigin::list(origins))
    }
}

/// Fully configured application: routes, static uploads and middleware
pub fn build_app(state: AppState) -> Router {
    let request_id = HeaderName::from_static(REQUEST_ID_HEADER);

    build_router(&state)
        .nest_service("/uploads", ServeDir::new(state.uploads.dir()))
        .layer(DefaultBodyLimit::max(MAX_BODY_BYTES))
        .layer(cors_layer(&state))
        .layer(CompressionLayer::new())
        .layer(TraceLayer::new_for_http())
        .layer(PropagateRequestIdLayer::new(request_id.clone()))
        .layer(SetRequestIdLayer::new(request_id, XRequestId))
        .with_state(state)
}
