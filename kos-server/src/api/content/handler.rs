//! Content API Handlers

use axum::{
    Extension, Json,
    extract::{Multipart, Path, Query, State},
};
use shared::models::{ContactRequest, Gallery, GalleryQuery, ReviewCreate, ReviewDetail};

use crate::api::{ApiResult, ok, ok_with_message};
use crate::auth::CurrentUser;
use crate::services::content as service;
use crate::state::AppState;
use crate::uploads::MultipartForm;

/// GET /api/galleries?category=
pub async fn list_galleries(
    State(state): State<AppState>,
    Query(query): Query<GalleryQuery>,
) -> ApiResult<Vec<Gallery>> {
    ok(service::list_galleries(state.pool(), query.category.as_deref()).await?)
}

/// POST /api/galleries (multipart: `title`, optional `category`, image)
pub async fn create_gallery(State(state): State<AppState>, multipart: Multipart) -> ApiResult<Gallery> {
    let mut form = MultipartForm::read(multipart).await?;
    let file = form.take_file()?;
    let title = form.require_field("title")?;
    let gallery = service::create_gallery(&state, title, form.field("category"), &file).await?;
    ok_with_message("Photo added", gallery)
}

/// DELETE /api/galleries/{id}
pub async fn delete_gallery(State(state): State<AppState>, Path(id): Path<i64>) -> ApiResult<()> {
    service::delete_gallery(&state, id).await?;
    ok_with_message("Photo deleted", ())
}

/// GET /api/reviews - most recent reviews across rooms
pub async fn list_reviews(State(state): State<AppState>) -> ApiResult<Vec<ReviewDetail>> {
    ok(service::list_recent_reviews(state.pool()).await?)
}

/// POST /api/reviews
pub async fn create_review(
    State(state): State<AppState>,
    Extension(user): Extension<CurrentUser>,
    Json(payload): Json<ReviewCreate>,
) -> ApiResult<ReviewDetail> {
    ok_with_message("Thank you for your review", service::create_review(state.pool(), &user, &payload).await?)
}

/// POST /api/contact
pub async fn contact(State(state): State<AppState>, Json(payload): Json<ContactRequest>) -> ApiResult<()> {
    service::send_contact(&state, &payload).await?;
    ok_with_message("Message sent", ())
}
