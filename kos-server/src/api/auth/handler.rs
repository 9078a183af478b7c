//! Auth API Handlers

use axum::{Json, extract::State};
use shared::error::{ApiResponse, AppError};
use shared::models::{
    ForgotPasswordRequest, GoogleLoginRequest, LoginRequest, LoginResponse, RefreshRequest,
    RegisterRequest, ResetPasswordRequest, UserInfo,
};
use validator::Validate;

use crate::api::{ApiResult, ok, ok_with_message};
use crate::services::auth as service;
use crate::state::AppState;

/// POST /api/auth/login
pub async fn login(State(state): State<AppState>, Json(req): Json<LoginRequest>) -> ApiResult<LoginResponse> {
    req.validate().map_err(|_| AppError::invalid_credentials())?;
    ok(service::login(&state, &req).await?)
}

/// POST /api/auth/register
pub async fn register(State(state): State<AppState>, Json(req): Json<RegisterRequest>) -> ApiResult<UserInfo> {
    let user = service::register(state.pool(), &req).await?;
    ok_with_message("Registration successful", user)
}

/// POST /api/auth/refresh
pub async fn refresh(State(state): State<AppState>, Json(req): Json<RefreshRequest>) -> ApiResult<LoginResponse> {
    ok(service::refresh(&state, &req.refresh_token).await?)
}

/// POST /api/auth/logout - tokens are stateless, the client drops them
pub async fn logout() -> Json<ApiResponse<()>> {
    Json(ApiResponse::ok())
}

/// POST /api/auth/forgot-password
pub async fn forgot_password(
    State(state): State<AppState>,
    Json(req): Json<ForgotPasswordRequest>,
) -> Json<ApiResponse<()>> {
    if req.validate().is_ok()
        && let Err(e) = service::forgot_password(&state, &req.email).await
    {
        tracing::error!(error = %e, "Forgot password failed");
    }
    Json(ApiResponse::success_with_message(
        "If the email is registered, a reset link has been sent",
        (),
    ))
}

/// POST /api/auth/reset-password
pub async fn reset_password(
    State(state): State<AppState>,
    Json(req): Json<ResetPasswordRequest>,
) -> ApiResult<()> {
    service::reset_password(state.pool(), &req).await?;
    ok_with_message("Password has been reset", ())
}

/// POST /api/auth/google-login
pub async fn google_login(
    State(state): State<AppState>,
    Json(req): Json<GoogleLoginRequest>,
) -> ApiResult<LoginResponse> {
    ok(service::google_login(&state, &req.id_token).await?)
}
