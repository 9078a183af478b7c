//! Bookings (never deleted)

use chrono::NaiveDate;
use shared::models::{Booking, BookingStatus, BookingSummary, RecentCheckout};
use shared::util::now_millis;
use sqlx::{QueryBuilder, Sqlite, SqliteConnection, SqlitePool};

const SUMMARY_SELECT: &str = "SELECT b.*, r.name AS room_name, u.username, p.full_name AS tenant_name
     FROM bookings b
     JOIN rooms r ON r.id = b.room_id
     JOIN users u ON u.id = b.user_id
     LEFT JOIN tenant_profiles p ON p.user_id = b.user_id";

pub struct NewBooking<'a> {
    pub user_id: i64,
    pub room_id: i64,
    pub start_date: NaiveDate,
    pub duration_months: i64,
    pub monthly_rent: f64,
    pub notes: Option<&'a str>,
}

pub async fn create(conn: &mut SqliteConnection, new: &NewBooking<'_>) -> Result<i64, sqlx::Error> {
    let now = now_millis();
    let result = sqlx::query(
        "INSERT INTO bookings (user_id, room_id, start_date, duration_months, monthly_rent,
            total_paid, status, notes, created_at, updated_at)
         VALUES (?, ?, ?, ?, ?, 0.0, 'Pending', ?, ?, ?)",
    )
    .bind(new.user_id)
    .bind(new.room_id)
    .bind(new.start_date)
    .bind(new.duration_months)
    .bind(new.monthly_rent)
    .bind(new.notes)
    .bind(now)
    .bind(now)
    .execute(conn)
    .await?;
    Ok(result.last_insert_rowid())
}

pub async fn find_by_id(conn: &mut SqliteConnection, id: i64) -> Result<Option<Booking>, sqlx::Error> {
    sqlx::query_as("SELECT * FROM bookings WHERE id = ?")
        .bind(id)
        .fetch_optional(conn)
        .await
}

pub async fn find_by_user_and_status(
    conn: &mut SqliteConnection,
    user_id: i64,
    statuses: &[BookingStatus],
) -> Result<Vec<Booking>, sqlx::Error> {
    let mut qb = QueryBuilder::<Sqlite>::new("SELECT * FROM bookings WHERE user_id = ");
    qb.push_bind(user_id);
    push_status_in(&mut qb, "status", statuses);
    qb.push(" ORDER BY created_at DESC, id DESC");
    qb.build_query_as().fetch_all(conn).await
}

pub async fn find_by_status(pool: &SqlitePool, statuses: &[BookingStatus]) -> Result<Vec<Booking>, sqlx::Error> {
    let mut qb = QueryBuilder::<Sqlite>::new("SELECT * FROM bookings WHERE 1 = 1");
    push_status_in(&mut qb, "status", statuses);
    qb.push(" ORDER BY id");
    qb.build_query_as().fetch_all(pool).await
}

pub async fn list_for_user(pool: &SqlitePool, user_id: i64) -> Result<Vec<Booking>, sqlx::Error> {
    sqlx::query_as("SELECT * FROM bookings WHERE user_id = ? ORDER BY created_at DESC, id DESC")
        .bind(user_id)
        .fetch_all(pool)
        .await
}

pub async fn list_summaries(
    pool: &SqlitePool,
    status: Option<BookingStatus>,
    user_id: Option<i64>,
) -> Result<Vec<BookingSummary>, sqlx::Error> {
    let mut qb = QueryBuilder::<Sqlite>::new(SUMMARY_SELECT);
    qb.push(" WHERE 1 = 1");
    if let Some(status) = status {
        qb.push(" AND b.status = ").push_bind(status);
    }
    if let Some(user_id) = user_id {
        qb.push(" AND b.user_id = ").push_bind(user_id);
    }
    qb.push(" ORDER BY b.created_at DESC, b.id DESC");
    qb.build_query_as().fetch_all(pool).await
}

pub async fn set_status(conn: &mut SqliteConnection, id: i64, status: BookingStatus) -> Result<(), sqlx::Error> {
    sqlx::query("UPDATE bookings SET status = ?, updated_at = ? WHERE id = ?")
        .bind(status)
        .bind(now_millis())
        .bind(id)
        .execute(conn)
        .await?;
    Ok(())
}

pub async fn set_notes(conn: &mut SqliteConnection, id: i64, notes: &str) -> Result<(), sqlx::Error> {
    sqlx::query("UPDATE bookings SET notes = ?, updated_at = ? WHERE id = ?")
        .bind(notes)
        .bind(now_millis())
        .bind(id)
        .execute(conn)
        .await?;
    Ok(())
}

pub async fn add_months(conn: &mut SqliteConnection, id: i64, months: i64) -> Result<(), sqlx::Error> {
    sqlx::query(
        "UPDATE bookings SET duration_months = duration_months + ?, updated_at = ? WHERE id = ?",
    )
    .bind(months)
    .bind(now_millis())
    .bind(id)
    .execute(conn)
    .await?;
    Ok(())
}

/// Store `total` as the booking's paid amount
pub async fn set_total_paid(conn: &mut SqliteConnection, id: i64, total: f64) -> Result<(), sqlx::Error> {
    sqlx::query("UPDATE bookings SET total_paid = ?, updated_at = ? WHERE id = ?")
        .bind(total)
        .bind(now_millis())
        .bind(id)
        .execute(conn)
        .await?;
    Ok(())
}

/// (Confirmed + Active, Pending) booking counts for a room
pub async fn room_occupancy(conn: &mut SqliteConnection, room_id: i64) -> Result<(i64, i64), sqlx::Error> {
    sqlx::query_as(
        "SELECT
            COALESCE(SUM(CASE WHEN status IN ('Confirmed', 'Active') THEN 1 ELSE 0 END), 0),
            COALESCE(SUM(CASE WHEN status = 'Pending' THEN 1 ELSE 0 END), 0)
         FROM bookings WHERE room_id = ?",
    )
    .bind(room_id)
    .fetch_one(conn)
    .await
}

pub async fn count_for_room(pool: &SqlitePool, room_id: i64) -> Result<i64, sqlx::Error> {
    sqlx::query_scalar("SELECT COUNT(*) FROM bookings WHERE room_id = ?")
        .bind(room_id)
        .fetch_one(pool)
        .await
}

/// Pending bookings created before `cutoff` (epoch millis)
pub async fn stale_pending(pool: &SqlitePool, cutoff: i64) -> Result<Vec<Booking>, sqlx::Error> {
    sqlx::query_as("SELECT * FROM bookings WHERE status = 'Pending' AND created_at < ? ORDER BY id")
        .bind(cutoff)
        .fetch_all(pool)
        .await
}

pub async fn count_all(pool: &SqlitePool) -> Result<i64, sqlx::Error> {
    sqlx::query_scalar("SELECT COUNT(*) FROM bookings")
        .fetch_one(pool)
        .await
}

pub async fn count_active(pool: &SqlitePool) -> Result<i64, sqlx::Error> {
    sqlx::query_scalar("SELECT COUNT(*) FROM bookings WHERE status IN ('Confirmed', 'Active')")
        .fetch_one(pool)
        .await
}

/// Has the user held this room (Confirmed, Active or Completed)
pub async fn has_stayed(pool: &SqlitePool, user_id: i64, room_id: i64) -> Result<bool, sqlx::Error> {
    let count: i64 = sqlx::query_scalar(
        "SELECT COUNT(*) FROM bookings
         WHERE user_id = ? AND room_id = ? AND status IN ('Confirmed', 'Active', 'Completed')",
    )
    .bind(user_id)
    .bind(room_id)
    .fetch_one(pool)
    .await?;
    Ok(count > 0)
}

pub async fn recent_cancelled(pool: &SqlitePool, limit: i64) -> Result<Vec<RecentCheckout>, sqlx::Error> {
    sqlx::query_as(
        "SELECT b.id AS booking_id, r.name AS room_name,
            COALESCE(p.full_name, u.username) AS tenant_name, b.updated_at
         FROM bookings b
         JOIN rooms r ON r.id = b.room_id
         JOIN users u ON u.id = b.user_id
         LEFT JOIN tenant_profiles p ON p.user_id = b.user_id
         WHERE b.status = 'Cancelled'
         ORDER BY b.updated_at DESC, b.id DESC
         LIMIT ?",
    )
    .bind(limit)
    .fetch_all(pool)
    .await
}

fn push_status_in(qb: &mut QueryBuilder<'_, Sqlite>, column: &str, statuses: &[BookingStatus]) {
    if statuses.is_empty() {
        return;
    }
    qb.push(format!(" AND {column} IN ("));
    let mut separated = qb.separated(", ");
    for status in statuses {
        separated.push_bind(*status);
    }
    separated.push_unseparated(")");
}
