//! Tenant profiles

use chrono::NaiveDate;
use shared::models::{Gender, ProfileLevel, TenantProfile, TenantSummary};
use shared::util::now_millis;
use sqlx::{QueryBuilder, Sqlite, SqliteConnection, SqlitePool};

pub async fn create(
    conn: &mut SqliteConnection,
    user_id: i64,
    full_name: Option<&str>,
    email: Option<&str>,
) -> Result<i64, sqlx::Error> {
    let now = now_millis();
    let result = sqlx::query(
        "INSERT INTO tenant_profiles (user_id, full_name, email, level, created_at, updated_at)
         VALUES (?, ?, ?, 'Guest', ?, ?)",
    )
    .bind(user_id)
    .bind(full_name)
    .bind(email)
    .bind(now)
    .bind(now)
    .execute(conn)
    .await?;
    Ok(result.last_insert_rowid())
}

pub async fn find_by_user(pool: &SqlitePool, user_id: i64) -> Result<Option<TenantProfile>, sqlx::Error> {
    sqlx::query_as("SELECT * FROM tenant_profiles WHERE user_id = ?")
        .bind(user_id)
        .fetch_optional(pool)
        .await
}

/// Guest becomes Tenant; no-op for profiles already at Tenant level
pub async fn promote_to_tenant(conn: &mut SqliteConnection, user_id: i64) -> Result<bool, sqlx::Error> {
    let result = sqlx::query(
        "UPDATE tenant_profiles SET level = 'Tenant', updated_at = ?
         WHERE user_id = ? AND level = 'Guest'",
    )
    .bind(now_millis())
    .bind(user_id)
    .execute(conn)
    .await?;
    Ok(result.rows_affected() > 0)
}

/// Validated profile fields; `None` keeps the stored value
#[derive(Debug, Default)]
pub struct ProfileChanges {
    pub full_name: Option<String>,
    pub email: Option<String>,
    pub nik: Option<String>,
    pub phone: Option<String>,
    pub birth_date: Option<NaiveDate>,
    pub home_address: Option<String>,
    pub gender: Option<Gender>,
}

pub async fn update(pool: &SqlitePool, user_id: i64, changes: &ProfileChanges) -> Result<(), sqlx::Error> {
    sqlx::query(
        "UPDATE tenant_profiles SET
            full_name = COALESCE(?, full_name),
            email = COALESCE(?, email),
            nik = COALESCE(?, nik),
            phone = COALESCE(?, phone),
            birth_date = COALESCE(?, birth_date),
            home_address = COALESCE(?, home_address),
            gender = COALESCE(?, gender),
            updated_at = ?
         WHERE user_id = ?",
    )
    .bind(&changes.full_name)
    .bind(&changes.email)
    .bind(&changes.nik)
    .bind(&changes.phone)
    .bind(changes.birth_date)
    .bind(&changes.home_address)
    .bind(changes.gender)
    .bind(now_millis())
    .bind(user_id)
    .execute(pool)
    .await?;
    Ok(())
}

pub async fn set_photo(pool: &SqlitePool, user_id: i64, photo_url: &str) -> Result<(), sqlx::Error> {
    sqlx::query("UPDATE tenant_profiles SET photo_url = ?, updated_at = ? WHERE user_id = ?")
        .bind(photo_url)
        .bind(now_millis())
        .bind(user_id)
        .execute(pool)
        .await?;
    Ok(())
}

pub async fn email_in_use(pool: &SqlitePool, email: &str, except_user: i64) -> Result<bool, sqlx::Error> {
    let count: i64 = sqlx::query_scalar(
        "SELECT COUNT(*) FROM tenant_profiles WHERE lower(email) = lower(?) AND user_id != ?",
    )
    .bind(email)
    .bind(except_user)
    .fetch_one(pool)
    .await?;
    Ok(count > 0)
}

pub async fn count_by_level(pool: &SqlitePool, level: ProfileLevel) -> Result<i64, sqlx::Error> {
    sqlx::query_scalar(
        "SELECT COUNT(*) FROM tenant_profiles p JOIN users u ON u.id = p.user_id
         WHERE u.role = 'tenant' AND p.level = ?",
    )
    .bind(level)
    .fetch_one(pool)
    .await
}

/// Birth dates of tenant-level profiles (demographics)
pub async fn tenant_birth_dates(pool: &SqlitePool) -> Result<Vec<NaiveDate>, sqlx::Error> {
    sqlx::query_scalar(
        "SELECT p.birth_date FROM tenant_profiles p JOIN users u ON u.id = p.user_id
         WHERE u.role = 'tenant' AND p.level = 'Tenant' AND p.birth_date IS NOT NULL",
    )
    .fetch_all(pool)
    .await
}

fn push_tenant_filters<'a>(
    qb: &mut QueryBuilder<'a, Sqlite>,
    search: Option<&'a str>,
    level: Option<ProfileLevel>,
) {
    qb.push(" WHERE u.role = 'tenant'");
    if let Some(term) = search {
        let pattern = format!("%{}%", term.to_lowercase());
        qb.push(" AND (lower(COALESCE(p.full_name, '')) LIKE ")
            .push_bind(pattern.clone())
            .push(" OR lower(COALESCE(p.email, '')) LIKE ")
            .push_bind(pattern.clone())
            .push(" OR lower(COALESCE(p.phone, '')) LIKE ")
            .push_bind(pattern)
            .push(")");
    }
    if let Some(level) = level {
        qb.push(" AND p.level = ").push_bind(level);
    }
}

/// Paged tenant list; returns the page and the total match count
pub async fn search(
    pool: &SqlitePool,
    search: Option<&str>,
    level: Option<ProfileLevel>,
    limit: i64,
    offset: i64,
) -> Result<(Vec<TenantSummary>, i64), sqlx::Error> {
    let mut count_qb = QueryBuilder::<Sqlite>::new(
        "SELECT COUNT(*) FROM tenant_profiles p JOIN users u ON u.id = p.user_id",
    );
    push_tenant_filters(&mut count_qb, search, level);
    let total: i64 = count_qb.build_query_scalar().fetch_one(pool).await?;

    let mut qb = QueryBuilder::<Sqlite>::new(
        "SELECT p.*, u.username,
            (SELECT COUNT(*) FROM bookings b WHERE b.user_id = p.user_id) AS booking_count
         FROM tenant_profiles p JOIN users u ON u.id = p.user_id",
    );
    push_tenant_filters(&mut qb, search, level);
    qb.push(" ORDER BY p.created_at DESC, p.id DESC LIMIT ")
        .push_bind(limit)
        .push(" OFFSET ")
        .push_bind(offset);
    let rows = qb.build_query_as().fetch_all(pool).await?;

    Ok((rows, total))
}
