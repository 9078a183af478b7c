//! Rooms

use shared::models::{Room, RoomCreate, RoomListing, RoomStatus, RoomType, RoomUpdate};
use shared::util::now_millis;
use sqlx::types::Json;
use sqlx::{QueryBuilder, Sqlite, SqliteConnection, SqlitePool};

const LISTING_SELECT: &str = "SELECT r.*,
        COALESCE((SELECT AVG(v.rating) FROM reviews v WHERE v.room_id = r.id), 0.0) AS rating,
        (SELECT COUNT(*) FROM reviews v WHERE v.room_id = r.id) AS review_count
     FROM rooms r";

pub async fn list(
    pool: &SqlitePool,
    status: Option<RoomStatus>,
    room_type: Option<RoomType>,
) -> Result<Vec<RoomListing>, sqlx::Error> {
    let mut qb = QueryBuilder::<Sqlite>::new(LISTING_SELECT);
    qb.push(" WHERE 1 = 1");
    if let Some(status) = status {
        qb.push(" AND r.status = ").push_bind(status);
    }
    if let Some(room_type) = room_type {
        qb.push(" AND r.room_type = ").push_bind(room_type);
    }
    qb.push(" ORDER BY r.name");
    qb.build_query_as().fetch_all(pool).await
}

pub async fn find_listing(pool: &SqlitePool, id: i64) -> Result<Option<RoomListing>, sqlx::Error> {
    sqlx::query_as(&format!("{LISTING_SELECT} WHERE r.id = ?"))
        .bind(id)
        .fetch_optional(pool)
        .await
}

pub async fn find_by_id(conn: &mut SqliteConnection, id: i64) -> Result<Option<Room>, sqlx::Error> {
    sqlx::query_as("SELECT * FROM rooms WHERE id = ?")
        .bind(id)
        .fetch_optional(conn)
        .await
}

pub async fn find_all(pool: &SqlitePool) -> Result<Vec<Room>, sqlx::Error> {
    sqlx::query_as("SELECT * FROM rooms ORDER BY name")
        .fetch_all(pool)
        .await
}

pub async fn create(pool: &SqlitePool, data: &RoomCreate) -> Result<i64, sqlx::Error> {
    let now = now_millis();
    let result = sqlx::query(
        "INSERT INTO rooms (name, room_type, price, status, capacity, floor, size, bedrooms,
            bathrooms, facilities, description, image_url, created_at, updated_at)
         VALUES (?, ?, ?, 'Available', ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)",
    )
    .bind(&data.name)
    .bind(data.room_type)
    .bind(data.price)
    .bind(data.capacity)
    .bind(data.floor)
    .bind(&data.size)
    .bind(data.bedrooms)
    .bind(data.bathrooms)
    .bind(Json(&data.facilities))
    .bind(&data.description)
    .bind(&data.image_url)
    .bind(now)
    .bind(now)
    .execute(pool)
    .await?;
    Ok(result.last_insert_rowid())
}

/// Partial update; status is not touched here
pub async fn update(pool: &SqlitePool, id: i64, data: &RoomUpdate) -> Result<bool, sqlx::Error> {
    let result = sqlx::query(
        "UPDATE rooms SET
            name = COALESCE(?, name),
            room_type = COALESCE(?, room_type),
            price = COALESCE(?, price),
            capacity = COALESCE(?, capacity),
            floor = COALESCE(?, floor),
            size = COALESCE(?, size),
            bedrooms = COALESCE(?, bedrooms),
            bathrooms = COALESCE(?, bathrooms),
            facilities = COALESCE(?, facilities),
            description = COALESCE(?, description),
            image_url = COALESCE(?, image_url),
            updated_at = ?
         WHERE id = ?",
    )
    .bind(&data.name)
    .bind(data.room_type)
    .bind(data.price)
    .bind(data.capacity)
    .bind(data.floor)
    .bind(&data.size)
    .bind(data.bedrooms)
    .bind(data.bathrooms)
    .bind(data.facilities.as_ref().map(Json))
    .bind(&data.description)
    .bind(&data.image_url)
    .bind(now_millis())
    .bind(id)
    .execute(pool)
    .await?;
    Ok(result.rows_affected() > 0)
}

pub async fn set_status(conn: &mut SqliteConnection, id: i64, status: RoomStatus) -> Result<(), sqlx::Error> {
    sqlx::query("UPDATE rooms SET status = ?, updated_at = ? WHERE id = ? AND status != ?")
        .bind(status)
        .bind(now_millis())
        .bind(id)
        .bind(status)
        .execute(conn)
        .await?;
    Ok(())
}

pub async fn delete(pool: &SqlitePool, id: i64) -> Result<bool, sqlx::Error> {
    let result = sqlx::query("DELETE FROM rooms WHERE id = ?")
        .bind(id)
        .execute(pool)
        .await?;
    Ok(result.rows_affected() > 0)
}

pub async fn count_by_status(pool: &SqlitePool, status: RoomStatus) -> Result<i64, sqlx::Error> {
    sqlx::query_scalar("SELECT COUNT(*) FROM rooms WHERE status = ?")
        .bind(status)
        .fetch_one(pool)
        .await
}

pub async fn total_price(pool: &SqlitePool) -> Result<f64, sqlx::Error> {
    sqlx::query_scalar("SELECT COALESCE(SUM(price), 0.0) FROM rooms")
        .fetch_one(pool)
        .await
}
