//! Room reviews

use shared::models::{Review, ReviewDetail};
use shared::util::now_millis;
use sqlx::SqlitePool;

const DETAIL_SELECT: &str = "SELECT v.*, u.username, p.full_name AS reviewer_name, r.name AS room_name
     FROM reviews v
     JOIN users u ON u.id = v.user_id
     JOIN rooms r ON r.id = v.room_id
     LEFT JOIN tenant_profiles p ON p.user_id = v.user_id";

pub async fn create(
    pool: &SqlitePool,
    user_id: i64,
    room_id: i64,
    rating: f64,
    comment: &str,
) -> Result<Review, sqlx::Error> {
    sqlx::query_as(
        "INSERT INTO reviews (user_id, room_id, rating, comment, created_at)
         VALUES (?, ?, ?, ?, ?) RETURNING *",
    )
    .bind(user_id)
    .bind(room_id)
    .bind(rating)
    .bind(comment)
    .bind(now_millis())
    .fetch_one(pool)
    .await
}

pub async fn list_for_room(pool: &SqlitePool, room_id: i64) -> Result<Vec<ReviewDetail>, sqlx::Error> {
    sqlx::query_as(&format!(
        "{DETAIL_SELECT} WHERE v.room_id = ? ORDER BY v.created_at DESC, v.id DESC"
    ))
    .bind(room_id)
    .fetch_all(pool)
    .await
}

/// Latest reviews across all rooms
pub async fn list_recent(pool: &SqlitePool, limit: i64) -> Result<Vec<ReviewDetail>, sqlx::Error> {
    sqlx::query_as(&format!(
        "{DETAIL_SELECT} ORDER BY v.created_at DESC, v.id DESC LIMIT ?"
    ))
    .bind(limit)
    .fetch_all(pool)
    .await
}
