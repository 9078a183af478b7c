//! Gallery, reviews and the contact form

use shared::error::{AppError, ErrorCode};
use shared::models::{ContactRequest, Gallery, ReviewCreate, ReviewDetail};
use sqlx::SqlitePool;
use validator::Validate;

use crate::auth::CurrentUser;
use crate::db;
use crate::email::templates;
use crate::error::ServiceResult;
use crate::state::AppState;
use crate::uploads::UploadedFile;

const RECENT_REVIEWS: i64 = 20;
const DEFAULT_GALLERY_CATEGORY: &str = "umum";

pub async fn list_galleries(pool: &SqlitePool, category: Option<&str>) -> ServiceResult<Vec<Gallery>> {
    let category = category.map(str::trim).filter(|c| !c.is_empty());
    Ok(db::galleries::list(pool, category).await?)
}

pub async fn create_gallery(
    state: &AppState,
    title: &str,
    category: Option<&str>,
    file: &UploadedFile,
) -> ServiceResult<Gallery> {
    let title = title.trim();
    if title.is_empty() {
        return Err(AppError::validation("title is required").into());
    }
    let category = category
        .map(str::trim)
        .filter(|c| !c.is_empty())
        .unwrap_or(DEFAULT_GALLERY_CATEGORY);

    let url = state.uploads.save_image("galleries", &file.data, &file.filename).await?;
    let gallery = db::galleries::create(state.pool(), title, category, &url).await?;
    tracing::info!(gallery_id = gallery.id, category = %category, "Gallery photo added");
    Ok(gallery)
}

/// Removes the row and, best effort, the stored file
pub async fn delete_gallery(state: &AppState, id: i64) -> ServiceResult<()> {
    let gallery = db::galleries::find_by_id(state.pool(), id)
        .await?
        .ok_or_else(|| AppError::new(ErrorCode::GalleryNotFound))?;
    db::galleries::delete(state.pool(), id).await?;
    state.uploads.remove(&gallery.image_url).await;
    Ok(())
}

pub async fn list_room_reviews(pool: &SqlitePool, room_id: i64) -> ServiceResult<Vec<ReviewDetail>> {
    Ok(db::reviews::list_for_room(pool, room_id).await?)
}

pub async fn list_recent_reviews(pool: &SqlitePool) -> ServiceResult<Vec<ReviewDetail>> {
    Ok(db::reviews::list_recent(pool, RECENT_REVIEWS).await?)
}

/// Only tenants who held the room may review it
pub async fn create_review(pool: &SqlitePool, user: &CurrentUser, req: &ReviewCreate) -> ServiceResult<ReviewDetail> {
    if !req.rating_in_range() {
        return Err(AppError::new(ErrorCode::InvalidRating).into());
    }
    req.validate().map_err(AppError::from)?;

    db::rooms::find_listing(pool, req.room_id)
        .await?
        .ok_or_else(|| AppError::new(ErrorCode::RoomNotFound))?;
    if !db::bookings::has_stayed(pool, user.id, req.room_id).await? {
        return Err(AppError::new(ErrorCode::ReviewNotAllowed).into());
    }

    let review = db::reviews::create(pool, user.id, req.room_id, req.rating, req.comment.trim()).await?;
    tracing::info!(review_id = review.id, room_id = req.room_id, rating = req.rating, "Review created");

    db::reviews::list_for_room(pool, req.room_id)
        .await?
        .into_iter()
        .find(|r| r.review.id == review.id)
        .ok_or_else(|| AppError::new(ErrorCode::ReviewNotFound).into())
}

/// Forward a contact form message to the admin mailbox
pub async fn send_contact(state: &AppState, req: &ContactRequest) -> ServiceResult<()> {
    req.validate().map_err(AppError::from)?;
    let (subject, html) = templates::contact(&req.name, &req.email, req.phone.as_deref(), &req.message);
    state
        .mailer
        .send(&state.config.admin_email, &subject, &html)
        .await
        .map_err(|e| {
            tracing::error!(error = %e, "Contact email failed");
            AppError::new(ErrorCode::EmailDeliveryFailed)
        })?;
    tracing::info!(from = %req.email, "Contact message forwarded");
    Ok(())
}
