//! Tenant Profile Models

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use validator::{Validate, ValidationError};

use super::user::UserInfo;

/// Guest until the first booking, then Tenant
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "db", derive(sqlx::Type))]
pub enum ProfileLevel {
    Guest,
    Tenant,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "db", derive(sqlx::Type))]
pub enum Gender {
    Male,
    Female,
}

/// Tenant profile entity (one per user)
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[cfg_attr(feature = "db", derive(sqlx::FromRow))]
pub struct TenantProfile {
    pub id: i64,
    pub user_id: i64,
    pub full_name: Option<String>,
    pub email: Option<String>,
    /// 16-digit national identity number
    pub nik: Option<String>,
    pub phone: Option<String>,
    pub birth_date: Option<NaiveDate>,
    pub home_address: Option<String>,
    pub gender: Option<Gender>,
    pub photo_url: Option<String>,
    pub level: ProfileLevel,
    pub created_at: i64,
    pub updated_at: i64,
}

/// `GET /profile` response
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProfileResponse {
    pub user: UserInfo,
    pub profile: TenantProfile,
}

/// Profile update payload
#[derive(Debug, Clone, Default, Serialize, Deserialize, Validate)]
pub struct ProfileUpdate {
    #[validate(length(min = 1, max = 100))]
    pub full_name: Option<String>,
    #[validate(email)]
    pub email: Option<String>,
    #[validate(custom(function = "nik_rule"))]
    pub nik: Option<String>,
    #[validate(custom(function = "phone_rule"))]
    pub phone: Option<String>,
    /// `YYYY-MM-DD`
    pub birth_date: Option<String>,
    #[validate(length(max = 255))]
    pub home_address: Option<String>,
    pub gender: Option<Gender>,
}

/// Tenant list filters (admin)
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TenantQuery {
    /// Matches name, email or phone, case-insensitive
    pub search: Option<String>,
    pub level: Option<ProfileLevel>,
    pub page: Option<u32>,
    pub limit: Option<u32>,
}

/// Tenant row for the admin list
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "db", derive(sqlx::FromRow))]
pub struct TenantSummary {
    #[serde(flatten)]
    #[cfg_attr(feature = "db", sqlx(flatten))]
    pub profile: TenantProfile,
    pub username: String,
    pub booking_count: i64,
}

/// NIK: exactly 16 ASCII digits
pub fn validate_nik(nik: &str) -> bool {
    nik.len() == 16 && nik.bytes().all(|b| b.is_ascii_digit())
}

/// Indonesian mobile number: starts with `08` or `62`, 10-15 digits.
/// A leading `+` is accepted.
pub fn validate_phone(phone: &str) -> bool {
    let digits = phone.strip_prefix('+').unwrap_or(phone);
    (10..=15).contains(&digits.len())
        && digits.bytes().all(|b| b.is_ascii_digit())
        && (digits.starts_with("08") || digits.starts_with("62"))
}

fn nik_rule(nik: &str) -> Result<(), ValidationError> {
    if validate_nik(nik) {
        Ok(())
    } else {
        Err(ValidationError::new("nik").with_message("NIK must be exactly 16 digits".into()))
    }
}

fn phone_rule(phone: &str) -> Result<(), ValidationError> {
    if validate_phone(phone) {
        Ok(())
    } else {
        Err(ValidationError::new("phone")
            .with_message("Phone must start with 08 or 62 and have 10-15 digits".into()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_nik() {
        assert!(validate_nik("3201234567890123"));
        assert!(!validate_nik("320123456789012"));
        assert!(!validate_nik("32012345678901234"));
        assert!(!validate_nik("32012345678901a3"));
    }

    #[test]
    fn test_validate_phone() {
        assert!(validate_phone("081234567890"));
        assert!(validate_phone("6281234567890"));
        assert!(validate_phone("+6281234567890"));
        assert!(!validate_phone("0812345"));
        assert!(!validate_phone("0712345678901"));
        assert!(!validate_phone("0812345678901234"));
        assert!(!validate_phone("0812-3456-7890"));
    }

    #[test]
    fn test_profile_update_custom_rules() {
        let update = ProfileUpdate {
            nik: Some("123".into()),
            phone: Some("081234567890".into()),
            ..Default::default()
        };
        let errors = update.validate().unwrap_err();
        let fields = errors.field_errors();
        assert!(fields.contains_key("nik"));
        assert!(!fields.contains_key("phone"));
    }
}
