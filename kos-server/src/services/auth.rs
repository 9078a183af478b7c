//! Account registration, login and password recovery

use serde::Deserialize;
use shared::error::{AppError, ErrorCode};
use shared::models::{
    LoginRequest, LoginResponse, MIN_PASSWORD_LEN, RegisterRequest, ResetPasswordRequest, User,
    UserInfo, UserRole,
};
use shared::util::now_millis;
use sqlx::SqlitePool;
use validator::Validate;

use crate::auth::{JwtService, hash_password, verify_password};
use crate::db;
use crate::email::{self, templates};
use crate::error::ServiceResult;
use crate::state::AppState;

const GOOGLE_TOKENINFO_URL: &str = "https://oauth2.googleapis.com/tokeninfo";
const RESET_TOKEN_TTL_MILLIS: i64 = 60 * 60 * 1000;

pub(crate) fn check_password_length(password: &str) -> ServiceResult<()> {
    if (password.chars().count() as u64) < MIN_PASSWORD_LEN {
        return Err(AppError::with_message(
            ErrorCode::PasswordTooShort,
            format!("Password must be at least {MIN_PASSWORD_LEN} characters"),
        )
        .into());
    }
    Ok(())
}

fn hash(password: &str) -> ServiceResult<String> {
    hash_password(password).map_err(|e| AppError::internal(format!("Password hashing failed: {e}")).into())
}

/// Access + refresh pair for `user`
pub fn issue_tokens(jwt: &JwtService, user: &User) -> ServiceResult<LoginResponse> {
    let to_app = |e: crate::auth::JwtError| AppError::internal(e.to_string());
    Ok(LoginResponse {
        access_token: jwt
            .generate_access_token(user.id, &user.username, user.role)
            .map_err(to_app)?,
        refresh_token: jwt
            .generate_refresh_token(user.id, &user.username, user.role)
            .map_err(to_app)?,
        token_type: "Bearer".to_string(),
        expires_in: jwt.access_ttl_secs(),
        user: UserInfo::from(user),
    })
}

/// Public sign-up; always creates a Tenant account with a Guest profile
pub async fn register(pool: &SqlitePool, req: &RegisterRequest) -> ServiceResult<UserInfo> {
    let username = req.username.trim();
    check_password_length(&req.password)?;
    req.validate().map_err(AppError::from)?;

    if db::users::find_by_username(pool, username).await?.is_some() {
        return Err(AppError::new(ErrorCode::UsernameTaken).into());
    }
    let email = req.email.as_deref().map(str::trim).filter(|e| !e.is_empty());
    if let Some(email) = email
        && db::tenants::email_in_use(pool, email, 0).await?
    {
        return Err(AppError::new(ErrorCode::EmailTaken).into());
    }

    let password_hash = hash(&req.password)?;
    let mut tx = pool.begin().await?;
    let id = db::users::create(&mut tx, username, &password_hash, UserRole::Tenant)
        .await
        .map_err(|e| match db::unique_violation(e, "Username") {
            crate::error::ServiceError::App(_) => AppError::new(ErrorCode::UsernameTaken).into(),
            other => other,
        })?;
    db::tenants::create(&mut tx, id, req.full_name.as_deref(), email).await?;
    tx.commit().await?;

    tracing::info!(user_id = id, username = %username, "User registered");
    Ok(UserInfo {
        id,
        username: username.to_string(),
        role: UserRole::Tenant,
    })
}

/// Unknown user and wrong password are indistinguishable
pub async fn login(state: &AppState, req: &LoginRequest) -> ServiceResult<LoginResponse> {
    let user = db::users::find_by_username(state.pool(), req.username.trim()).await?;
    let Some(user) = user.filter(|u| verify_password(&req.password, &u.password_hash)) else {
        tracing::warn!(username = %req.username, "Login failed");
        return Err(AppError::invalid_credentials().into());
    };

    tracing::info!(user_id = user.id, username = %user.username, "User logged in");
    issue_tokens(&state.jwt, &user)
}

pub async fn refresh(state: &AppState, refresh_token: &str) -> ServiceResult<LoginResponse> {
    let claims = state.jwt.validate_refresh(refresh_token).map_err(|e| match e {
        crate::auth::JwtError::ExpiredToken => AppError::token_expired(),
        other => AppError::invalid_token(other.to_string()),
    })?;
    let user_id: i64 = claims
        .sub
        .parse()
        .map_err(|_| AppError::invalid_token("Invalid subject"))?;
    let user = db::users::find_by_id(state.pool(), user_id)
        .await?
        .ok_or_else(|| AppError::invalid_token("User no longer exists"))?;
    issue_tokens(&state.jwt, &user)
}

/// Always succeeds so callers cannot probe which emails are registered
pub async fn forgot_password(state: &AppState, email: &str) -> ServiceResult<()> {
    let Some(user) = db::users::find_by_email(state.pool(), email.trim()).await? else {
        tracing::info!("Password reset requested for unknown email");
        return Ok(());
    };

    let token = uuid::Uuid::new_v4().to_string();
    db::users::set_reset_token(state.pool(), user.id, &token, now_millis() + RESET_TOKEN_TTL_MILLIS).await?;

    let link = format!(
        "{}/reset-password?token={token}",
        state.config.public_base_url.trim_end_matches('/')
    );
    let (subject, html) = templates::password_reset(&link);
    email::send_in_background(state.mailer.clone(), email.trim().to_string(), subject, html);

    tracing::info!(user_id = user.id, "Password reset token issued");
    Ok(())
}

pub async fn reset_password(pool: &SqlitePool, req: &ResetPasswordRequest) -> ServiceResult<()> {
    check_password_length(&req.new_password)?;

    let user = db::users::find_by_reset_token(pool, req.token.trim())
        .await?
        .filter(|u| u.reset_token_expires_at.is_some_and(|exp| exp > now_millis()))
        .ok_or_else(|| AppError::new(ErrorCode::ResetTokenInvalid))?;

    db::users::update_password(pool, user.id, &hash(&req.new_password)?).await?;
    tracing::info!(user_id = user.id, "Password reset");
    Ok(())
}

/// Identity asserted by a verified Google ID token
#[derive(Debug, Clone)]
pub struct GoogleIdentity {
    pub email: String,
    pub name: Option<String>,
}

#[derive(Debug, Deserialize)]
struct TokenInfo {
    aud: String,
    email: Option<String>,
    #[serde(default)]
    email_verified: serde_json::Value,
    name: Option<String>,
}

/// Check an ID token with Google's tokeninfo endpoint
pub async fn verify_google_token(
    http: &reqwest::Client,
    client_id: &str,
    id_token: &str,
) -> ServiceResult<GoogleIdentity> {
    let rejected = |msg: &str| AppError::with_message(ErrorCode::ExternalLoginFailed, msg.to_string());

    let resp = http
        .get(GOOGLE_TOKENINFO_URL)
        .query(&[("id_token", id_token)])
        .send()
        .await
        .map_err(|e| {
            tracing::error!(error = %e, "Google tokeninfo request failed");
            AppError::with_message(ErrorCode::NetworkError, "Could not reach Google")
        })?;
    if !resp.status().is_success() {
        return Err(rejected("Google rejected the token").into());
    }
    let info: TokenInfo = resp
        .json()
        .await
        .map_err(|_| rejected("Unreadable Google token info"))?;

    if info.aud != client_id {
        return Err(rejected("Token was issued for another client").into());
    }
    let verified = match &info.email_verified {
        serde_json::Value::Bool(b) => *b,
        serde_json::Value::String(s) => s == "true",
        _ => false,
    };
    let email = info
        .email
        .filter(|_| verified)
        .ok_or_else(|| rejected("Google account email is not verified"))?;
    Ok(GoogleIdentity { email, name: info.name })
}

pub async fn google_login(state: &AppState, id_token: &str) -> ServiceResult<LoginResponse> {
    let Some(client_id) = state.config.google_client_id.as_deref() else {
        return Err(AppError::with_message(ErrorCode::FeatureDisabled, "Google login is not configured").into());
    };
    let identity = verify_google_token(&state.http, client_id, id_token).await?;
    login_with_identity(state, &identity).await
}

/// Find the account owning the email, or create a Tenant with a Guest profile
pub async fn login_with_identity(state: &AppState, identity: &GoogleIdentity) -> ServiceResult<LoginResponse> {
    let pool = state.pool();
    if let Some(user) = db::users::find_by_email(pool, &identity.email).await? {
        tracing::info!(user_id = user.id, "Google login");
        return issue_tokens(&state.jwt, &user);
    }

    let username = available_username(pool, &identity.email).await?;
    let random_password = uuid::Uuid::new_v4().to_string();
    let password_hash = hash(&random_password)?;

    let mut tx = pool.begin().await?;
    let id = db::users::create(&mut tx, &username, &password_hash, UserRole::Tenant).await?;
    db::tenants::create(&mut tx, id, identity.name.as_deref(), Some(&identity.email)).await?;
    tx.commit().await?;

    let user = db::users::find_by_id(pool, id)
        .await?
        .ok_or_else(|| AppError::internal("Created user not found"))?;
    tracing::info!(user_id = id, username = %username, "User registered via Google");
    issue_tokens(&state.jwt, &user)
}

/// Local part of the email, suffixed until unused
async fn available_username(pool: &SqlitePool, email: &str) -> ServiceResult<String> {
    let base: String = email
        .split('@')
        .next()
        .unwrap_or_default()
        .chars()
        .filter(|c| c.is_ascii_alphanumeric() || matches!(c, '.' | '_' | '-'))
        .collect();
    let base = if base.len() < 3 { format!("user{base}") } else { base };

    if db::users::find_by_username(pool, &base).await?.is_none() {
        return Ok(base);
    }
    for suffix in 1..100 {
        let candidate = format!("{base}{suffix}");
        if db::users::find_by_username(pool, &candidate).await?.is_none() {
            return Ok(candidate);
        }
    }
    Ok(format!("{base}-{}", &uuid::Uuid::new_v4().simple().to_string()[..8]))
}
