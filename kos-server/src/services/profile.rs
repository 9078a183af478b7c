//! The caller's own profile

use shared::error::{AppError, ErrorCode};
use shared::models::{
    ChangePasswordRequest, ProfileResponse, ProfileUpdate, TenantProfile, UserInfo,
    validate_nik, validate_phone,
};
use shared::util::parse_date;
use sqlx::SqlitePool;
use validator::Validate;

use super::auth::check_password_length;
use crate::auth::{hash_password, verify_password};
use crate::db;
use crate::db::tenants::ProfileChanges;
use crate::error::ServiceResult;
use crate::state::AppState;
use crate::uploads::UploadedFile;

fn trimmed(value: &Option<String>) -> Option<String> {
    value.as_deref().map(str::trim).filter(|v| !v.is_empty()).map(str::to_string)
}

async fn load_profile(pool: &SqlitePool, user_id: i64) -> ServiceResult<TenantProfile> {
    db::tenants::find_by_user(pool, user_id)
        .await?
        .ok_or_else(|| AppError::new(ErrorCode::ProfileNotFound).into())
}

pub async fn get_profile(pool: &SqlitePool, user_id: i64) -> ServiceResult<ProfileResponse> {
    let user = db::users::find_by_id(pool, user_id)
        .await?
        .ok_or_else(|| AppError::not_found("User"))?;
    let profile = load_profile(pool, user_id).await?;
    Ok(ProfileResponse {
        user: UserInfo::from(&user),
        profile,
    })
}

/// Check and normalize an update; `None` fields keep their stored values
pub fn validate_update(update: &ProfileUpdate) -> ServiceResult<ProfileChanges> {
    let nik = trimmed(&update.nik);
    if let Some(nik) = &nik
        && !validate_nik(nik)
    {
        return Err(AppError::new(ErrorCode::InvalidNik).into());
    }
    let phone = trimmed(&update.phone);
    if let Some(phone) = &phone
        && !validate_phone(phone)
    {
        return Err(AppError::new(ErrorCode::InvalidPhone).into());
    }
    let birth_date = match trimmed(&update.birth_date) {
        Some(raw) => Some(parse_date(&raw).ok_or_else(|| {
            AppError::with_message(ErrorCode::InvalidDate, "Birth date must be YYYY-MM-DD")
        })?),
        None => None,
    };

    let normalized = ProfileUpdate {
        nik: nik.clone(),
        phone: phone.clone(),
        ..update.clone()
    };
    normalized.validate().map_err(AppError::from)?;

    Ok(ProfileChanges {
        full_name: trimmed(&update.full_name),
        email: trimmed(&update.email).map(|e| e.to_lowercase()),
        nik,
        phone,
        birth_date,
        home_address: trimmed(&update.home_address),
        gender: update.gender,
    })
}

pub async fn update_profile(pool: &SqlitePool, user_id: i64, update: &ProfileUpdate) -> ServiceResult<ProfileResponse> {
    let changes = validate_update(update)?;
    load_profile(pool, user_id).await?;

    if let Some(email) = &changes.email
        && db::tenants::email_in_use(pool, email, user_id).await?
    {
        return Err(AppError::new(ErrorCode::EmailTaken).into());
    }

    db::tenants::update(pool, user_id, &changes).await?;
    tracing::info!(user_id, "Profile updated");
    get_profile(pool, user_id).await
}

pub async fn upload_photo(state: &AppState, user_id: i64, file: &UploadedFile) -> ServiceResult<TenantProfile> {
    load_profile(state.pool(), user_id).await?;
    let url = state.uploads.save_image("profiles", &file.data, &file.filename).await?;
    db::tenants::set_photo(state.pool(), user_id, &url).await?;
    load_profile(state.pool(), user_id).await
}

pub async fn change_password(pool: &SqlitePool, user_id: i64, req: &ChangePasswordRequest) -> ServiceResult<()> {
    let user = db::users::find_by_id(pool, user_id)
        .await?
        .ok_or_else(|| AppError::not_found("User"))?;
    if !verify_password(&req.old_password, &user.password_hash) {
        return Err(AppError::with_message(ErrorCode::InvalidCredentials, "Old password is incorrect").into());
    }
    check_password_length(&req.new_password)?;

    let hash = hash_password(&req.new_password)
        .map_err(|e| AppError::internal(format!("Password hashing failed: {e}")))?;
    db::users::update_password(pool, user_id, &hash).await?;
    tracing::info!(user_id, "Password changed");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn code_of(result: ServiceResult<ProfileChanges>) -> ErrorCode {
        match result {
            Err(crate::error::ServiceError::App(e)) => e.code,
            other => panic!("expected app error, got {other:?}"),
        }
    }

    #[test]
    fn test_validate_update_codes() {
        let bad_nik = ProfileUpdate {
            nik: Some("12345".into()),
            ..Default::default()
        };
        assert_eq!(code_of(validate_update(&bad_nik)), ErrorCode::InvalidNik);

        let bad_phone = ProfileUpdate {
            phone: Some("0712345678".into()),
            ..Default::default()
        };
        assert_eq!(code_of(validate_update(&bad_phone)), ErrorCode::InvalidPhone);

        let bad_date = ProfileUpdate {
            birth_date: Some("01-02-2000".into()),
            ..Default::default()
        };
        assert_eq!(code_of(validate_update(&bad_date)), ErrorCode::InvalidDate);
    }

    #[test]
    fn test_validate_update_normalizes() {
        let update = ProfileUpdate {
            full_name: Some("  Siti Aminah ".into()),
            email: Some("Siti@Example.com".into()),
            nik: Some(" 3201234567890123 ".into()),
            phone: Some("".into()),
            ..Default::default()
        };
        let changes = validate_update(&update).unwrap();
        assert_eq!(changes.full_name.as_deref(), Some("Siti Aminah"));
        assert_eq!(changes.email.as_deref(), Some("siti@example.com"));
        assert_eq!(changes.nik.as_deref(), Some("3201234567890123"));
        assert!(changes.phone.is_none());
    }
}
