//! Authentication middleware

use axum::{
    extract::{Request, State},
    middleware::Next,
    response::Response,
};
use shared::error::AppError;

use super::{CurrentUser, JwtError, JwtService};
use crate::state::AppState;

/// Require a valid access token
///
/// Reads `Authorization: Bearer <token>` and inserts [`CurrentUser`] into
/// the request extensions. CORS preflight requests pass through.
pub async fn require_auth(
    State(state): State<AppState>,
    mut req: Request,
    next: Next,
) -> Result<Response, AppError> {
    if req.method() == http::Method::OPTIONS {
        return Ok(next.run(req).await);
    }

    let header = req
        .headers()
        .get(http::header::AUTHORIZATION)
        .and_then(|h| h.to_str().ok());

    let token = match header {
        Some(header) => JwtService::extract_from_header(header)
            .ok_or_else(|| AppError::invalid_token("Invalid authorization header"))?,
        None => {
            tracing::debug!(uri = %req.uri(), "Missing authorization header");
            return Err(AppError::not_authenticated());
        }
    };

    let user = authenticate(&state.jwt, token)?;
    req.extensions_mut().insert(user);
    Ok(next.run(req).await)
}

/// Validate an access token into a [`CurrentUser`]
pub fn authenticate(jwt: &JwtService, token: &str) -> Result<CurrentUser, AppError> {
    let claims = jwt.validate_access(token).map_err(|e| {
        tracing::warn!(error = %e, "Authentication failed");
        match e {
            JwtError::ExpiredToken => AppError::token_expired(),
            _ => AppError::invalid_token("Invalid token"),
        }
    })?;
    CurrentUser::try_from(claims).map_err(|e| AppError::invalid_token(e.to_string()))
}

/// Require the admin role (layer after `require_auth`)
pub async fn require_admin(req: Request, next: Next) -> Result<Response, AppError> {
    let user = req
        .extensions()
        .get::<CurrentUser>()
        .ok_or_else(AppError::not_authenticated)?;
    if !user.is_admin() {
        tracing::warn!(user_id = user.id, username = %user.username, "Admin required");
        return Err(AppError::admin_required());
    }
    Ok(next.run(req).await)
}
