//! Payments

use chrono::NaiveDate;
use shared::models::{Payment, PaymentMethod, PaymentStatus, PaymentSummary, PaymentType, RoomType};
use shared::util::now_millis;
use sqlx::{QueryBuilder, Sqlite, SqliteConnection, SqlitePool};

pub struct NewPayment<'a> {
    pub booking_id: i64,
    pub amount: f64,
    pub method: PaymentMethod,
    pub payment_type: PaymentType,
    pub down_payment_amount: f64,
    pub due_date: Option<NaiveDate>,
    pub extend_months: i64,
    pub proof_url: Option<&'a str>,
}

pub async fn create(conn: &mut SqliteConnection, new: &NewPayment<'_>) -> Result<i64, sqlx::Error> {
    let now = now_millis();
    let result = sqlx::query(
        "INSERT INTO payments (booking_id, amount, proof_url, status, method, payment_type,
            down_payment_amount, due_date, extend_months, created_at, updated_at)
         VALUES (?, ?, ?, 'Pending', ?, ?, ?, ?, ?, ?, ?)",
    )
    .bind(new.booking_id)
    .bind(new.amount)
    .bind(new.proof_url)
    .bind(new.method)
    .bind(new.payment_type)
    .bind(new.down_payment_amount)
    .bind(new.due_date)
    .bind(new.extend_months)
    .bind(now)
    .bind(now)
    .execute(conn)
    .await?;
    Ok(result.last_insert_rowid())
}

pub async fn find_by_id(conn: &mut SqliteConnection, id: i64) -> Result<Option<Payment>, sqlx::Error> {
    sqlx::query_as("SELECT * FROM payments WHERE id = ?")
        .bind(id)
        .fetch_optional(conn)
        .await
}

pub async fn find_by_order_id(pool: &SqlitePool, order_id: &str) -> Result<Option<Payment>, sqlx::Error> {
    sqlx::query_as("SELECT * FROM payments WHERE order_id = ?")
        .bind(order_id)
        .fetch_optional(pool)
        .await
}

/// Newest first
pub async fn list_for_booking(pool: &SqlitePool, booking_id: i64) -> Result<Vec<Payment>, sqlx::Error> {
    sqlx::query_as("SELECT * FROM payments WHERE booking_id = ? ORDER BY created_at DESC, id DESC")
        .bind(booking_id)
        .fetch_all(pool)
        .await
}

pub async fn list_summaries(
    pool: &SqlitePool,
    status: Option<PaymentStatus>,
) -> Result<Vec<PaymentSummary>, sqlx::Error> {
    let mut qb = QueryBuilder::<Sqlite>::new(
        "SELECT pm.*, r.name AS room_name, u.username, p.full_name AS tenant_name
         FROM payments pm
         JOIN bookings b ON b.id = pm.booking_id
         JOIN rooms r ON r.id = b.room_id
         JOIN users u ON u.id = b.user_id
         LEFT JOIN tenant_profiles p ON p.user_id = b.user_id
         WHERE 1 = 1",
    );
    if let Some(status) = status {
        qb.push(" AND pm.status = ").push_bind(status);
    }
    qb.push(" ORDER BY pm.created_at DESC, pm.id DESC");
    qb.build_query_as().fetch_all(pool).await
}

/// Mark confirmed; returns false when the payment was already confirmed
pub async fn confirm(conn: &mut SqliteConnection, id: i64, paid_at: i64) -> Result<bool, sqlx::Error> {
    let result = sqlx::query(
        "UPDATE payments SET status = 'Confirmed', paid_at = ?, updated_at = ?
         WHERE id = ? AND status != 'Confirmed'",
    )
    .bind(paid_at)
    .bind(paid_at)
    .bind(id)
    .execute(conn)
    .await?;
    Ok(result.rows_affected() > 0)
}

/// Move a Pending payment to `status`; returns false if it was not Pending
pub async fn close_pending(conn: &mut SqliteConnection, id: i64, status: PaymentStatus) -> Result<bool, sqlx::Error> {
    let result = sqlx::query(
        "UPDATE payments SET status = ?, updated_at = ? WHERE id = ? AND status = 'Pending'",
    )
    .bind(status)
    .bind(now_millis())
    .bind(id)
    .execute(conn)
    .await?;
    Ok(result.rows_affected() > 0)
}

pub async fn set_method(conn: &mut SqliteConnection, id: i64, method: PaymentMethod) -> Result<(), sqlx::Error> {
    sqlx::query("UPDATE payments SET method = ?, updated_at = ? WHERE id = ?")
        .bind(method)
        .bind(now_millis())
        .bind(id)
        .execute(conn)
        .await?;
    Ok(())
}

pub async fn set_proof(conn: &mut SqliteConnection, id: i64, proof_url: &str) -> Result<(), sqlx::Error> {
    sqlx::query("UPDATE payments SET proof_url = ?, updated_at = ? WHERE id = ?")
        .bind(proof_url)
        .bind(now_millis())
        .bind(id)
        .execute(conn)
        .await?;
    Ok(())
}

pub async fn set_snap(pool: &SqlitePool, id: i64, order_id: &str, snap_token: &str) -> Result<(), sqlx::Error> {
    sqlx::query(
        "UPDATE payments SET order_id = ?, snap_token = ?, method = 'midtrans', updated_at = ?
         WHERE id = ?",
    )
    .bind(order_id)
    .bind(snap_token)
    .bind(now_millis())
    .bind(id)
    .execute(pool)
    .await?;
    Ok(())
}

/// Amounts of a booking's confirmed payments
pub async fn confirmed_amounts(conn: &mut SqliteConnection, booking_id: i64) -> Result<Vec<f64>, sqlx::Error> {
    sqlx::query_scalar("SELECT amount FROM payments WHERE booking_id = ? AND status = 'Confirmed'")
        .bind(booking_id)
        .fetch_all(conn)
        .await
}

/// Delete a booking's Pending payments (their reminders cascade)
pub async fn delete_pending_for_booking(conn: &mut SqliteConnection, booking_id: i64) -> Result<u64, sqlx::Error> {
    let result = sqlx::query("DELETE FROM payments WHERE booking_id = ? AND status = 'Pending'")
        .bind(booking_id)
        .execute(conn)
        .await?;
    Ok(result.rows_affected())
}

/// Confirmed down payments of open bookings that are due another reminder:
/// no unsent Pending reminder, and no reminder due after `latest_previous_due`
pub async fn down_payments_without_reminder(
    pool: &SqlitePool,
    latest_previous_due: NaiveDate,
) -> Result<Vec<Payment>, sqlx::Error> {
    sqlx::query_as(
        "SELECT pm.* FROM payments pm
         JOIN bookings b ON b.id = pm.booking_id
         WHERE pm.payment_type = 'dp' AND pm.status = 'Confirmed'
           AND b.status IN ('Confirmed', 'Active')
           AND NOT EXISTS (
               SELECT 1 FROM payment_reminders pr
               WHERE pr.payment_id = pm.id
                 AND ((pr.status = 'Pending' AND pr.is_sent = 0) OR pr.due_date > ?)
           )
         ORDER BY pm.id",
    )
    .bind(latest_previous_due)
    .fetch_all(pool)
    .await
}

/// (sum, count) of payments in a status
pub async fn totals_by_status(pool: &SqlitePool, status: PaymentStatus) -> Result<(f64, i64), sqlx::Error> {
    sqlx::query_as("SELECT COALESCE(SUM(amount), 0.0), COUNT(*) FROM payments WHERE status = ?")
        .bind(status)
        .fetch_one(pool)
        .await
}

/// Confirmed revenue grouped by `YYYY-MM` of paid_at, from `since` (epoch millis)
pub async fn monthly_confirmed(pool: &SqlitePool, since: i64) -> Result<Vec<(String, f64)>, sqlx::Error> {
    sqlx::query_as(
        "SELECT strftime('%Y-%m', paid_at / 1000, 'unixepoch') AS month, SUM(amount) AS revenue
         FROM payments
         WHERE status = 'Confirmed' AND paid_at IS NOT NULL AND paid_at >= ?
         GROUP BY month",
    )
    .bind(since)
    .fetch_all(pool)
    .await
}

/// Confirmed revenue per room type
pub async fn confirmed_by_room_type(pool: &SqlitePool) -> Result<Vec<(RoomType, f64)>, sqlx::Error> {
    sqlx::query_as(
        "SELECT r.room_type, SUM(pm.amount)
         FROM payments pm
         JOIN bookings b ON b.id = pm.booking_id
         JOIN rooms r ON r.id = b.room_id
         WHERE pm.status = 'Confirmed'
         GROUP BY r.room_type",
    )
    .fetch_all(pool)
    .await
}
