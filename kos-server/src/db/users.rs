//! User accounts

use shared::models::{User, UserRole};
use shared::util::now_millis;
use sqlx::{SqliteConnection, SqlitePool};

pub async fn find_by_id(pool: &SqlitePool, id: i64) -> Result<Option<User>, sqlx::Error> {
    sqlx::query_as("SELECT * FROM users WHERE id = ?")
        .bind(id)
        .fetch_optional(pool)
        .await
}

pub async fn find_by_username(pool: &SqlitePool, username: &str) -> Result<Option<User>, sqlx::Error> {
    sqlx::query_as("SELECT * FROM users WHERE username = ?")
        .bind(username)
        .fetch_optional(pool)
        .await
}

/// User owning the profile with this email
pub async fn find_by_email(pool: &SqlitePool, email: &str) -> Result<Option<User>, sqlx::Error> {
    sqlx::query_as(
        "SELECT u.* FROM users u JOIN tenant_profiles p ON p.user_id = u.id
         WHERE lower(p.email) = lower(?)",
    )
    .bind(email)
    .fetch_optional(pool)
    .await
}

pub async fn find_by_reset_token(pool: &SqlitePool, token: &str) -> Result<Option<User>, sqlx::Error> {
    sqlx::query_as("SELECT * FROM users WHERE reset_token = ?")
        .bind(token)
        .fetch_optional(pool)
        .await
}

pub async fn create(
    conn: &mut SqliteConnection,
    username: &str,
    password_hash: &str,
    role: UserRole,
) -> Result<i64, sqlx::Error> {
    let result = sqlx::query(
        "INSERT INTO users (username, password_hash, role, created_at) VALUES (?, ?, ?, ?)",
    )
    .bind(username)
    .bind(password_hash)
    .bind(role)
    .bind(now_millis())
    .execute(conn)
    .await?;
    Ok(result.last_insert_rowid())
}

pub async fn count_admins(pool: &SqlitePool) -> Result<i64, sqlx::Error> {
    sqlx::query_scalar("SELECT COUNT(*) FROM users WHERE role = 'admin'")
        .fetch_one(pool)
        .await
}

pub async fn update_password(pool: &SqlitePool, id: i64, password_hash: &str) -> Result<(), sqlx::Error> {
    sqlx::query(
        "UPDATE users SET password_hash = ?, reset_token = NULL, reset_token_expires_at = NULL
         WHERE id = ?",
    )
    .bind(password_hash)
    .bind(id)
    .execute(pool)
    .await?;
    Ok(())
}

pub async fn set_reset_token(
    pool: &SqlitePool,
    id: i64,
    token: &str,
    expires_at: i64,
) -> Result<(), sqlx::Error> {
    sqlx::query("UPDATE users SET reset_token = ?, reset_token_expires_at = ? WHERE id = ?")
        .bind(token)
        .bind(expires_at)
        .bind(id)
        .execute(pool)
        .await?;
    Ok(())
}

/// Create the initial admin account unless an admin already exists.
/// Returns the new user id when one was created.
pub async fn seed_admin(
    pool: &SqlitePool,
    username: &str,
    password_hash: &str,
) -> Result<Option<i64>, sqlx::Error> {
    if count_admins(pool).await? > 0 {
        return Ok(None);
    }
    let mut tx = pool.begin().await?;
    let id = create(&mut tx, username, password_hash, UserRole::Admin).await?;
    super::tenants::create(&mut tx, id, Some("Administrator"), None).await?;
    tx.commit().await?;
    Ok(Some(id))
}
