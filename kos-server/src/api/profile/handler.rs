//! Profile API Handlers

use axum::{
    Extension, Json,
    extract::{Multipart, State},
};
use shared::models::{ChangePasswordRequest, ProfileResponse, ProfileUpdate, TenantProfile};

use crate::api::{ApiResult, ok, ok_with_message};
use crate::auth::CurrentUser;
use crate::services::profile as service;
use crate::state::AppState;
use crate::uploads::MultipartForm;

/// GET /api/profile
pub async fn get(State(state): State<AppState>, Extension(user): Extension<CurrentUser>) -> ApiResult<ProfileResponse> {
    ok(service::get_profile(state.pool(), user.id).await?)
}

/// PUT /api/profile
pub async fn update(
    State(state): State<AppState>,
    Extension(user): Extension<CurrentUser>,
    Json(payload): Json<ProfileUpdate>,
) -> ApiResult<ProfileResponse> {
    ok_with_message("Profile updated", service::update_profile(state.pool(), user.id, &payload).await?)
}

/// PUT /api/profile/change-password
pub async fn change_password(
    State(state): State<AppState>,
    Extension(user): Extension<CurrentUser>,
    Json(payload): Json<ChangePasswordRequest>,
) -> ApiResult<()> {
    service::change_password(state.pool(), user.id, &payload).await?;
    ok_with_message("Password changed", ())
}

/// POST /api/profile/photo (multipart)
pub async fn upload_photo(
    State(state): State<AppState>,
    Extension(user): Extension<CurrentUser>,
    multipart: Multipart,
) -> ApiResult<TenantProfile> {
    let file = MultipartForm::read(multipart).await?.take_file()?;
    ok_with_message("Photo updated", service::upload_photo(&state, user.id, &file).await?)
}
