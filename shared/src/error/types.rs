//! `AppError` and the JSON envelope every kos-server endpoint answers with

use super::codes::ErrorCode;
use chrono::NaiveDate;
use http::StatusCode;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::HashMap;
use thiserror::Error;

/// Error reported to tenants and admins.
///
/// Carries an [`ErrorCode`] the client can branch on, a message that is safe
/// to show, and optional details such as the offending field or the date a
/// lease ends.
#[derive(Debug, Clone, Error)]
#[error("{message}")]
pub struct AppError {
    pub code: ErrorCode,
    pub message: String,
    pub details: Option<HashMap<String, Value>>,
}

impl AppError {
    /// Error with the code's stock message
    pub fn new(code: ErrorCode) -> Self {
        Self {
            message: code.message().to_string(),
            code,
            details: None,
        }
    }

    pub fn with_message(code: ErrorCode, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
            details: None,
        }
    }

    pub fn with_detail(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.details
            .get_or_insert_with(HashMap::new)
            .insert(key.into(), value.into());
        self
    }

    pub fn http_status(&self) -> StatusCode {
        self.code.http_status()
    }

    pub fn validation(msg: impl Into<String>) -> Self {
        Self::with_message(ErrorCode::ValidationFailed, msg)
    }

    /// `{what} not found`, with `what` echoed under `resource`
    pub fn not_found(what: impl Into<String>) -> Self {
        let what = what.into();
        Self::with_message(ErrorCode::NotFound, format!("{what} not found")).with_detail("resource", what)
    }

    /// Unique column clash (username, email, room name)
    pub fn already_exists(what: impl Into<String>) -> Self {
        let what = what.into();
        Self::with_message(ErrorCode::AlreadyExists, format!("{what} already exists"))
            .with_detail("resource", what)
    }

    /// Tenant still holds a lease that ends after today
    pub fn lease_still_active(end: NaiveDate) -> Self {
        Self::with_message(ErrorCode::LeaseStillActive, format!("Your current lease runs until {end}"))
            .with_detail("end_date", end.to_string())
    }

    /// Room is Reserved, Occupied or under Maintenance
    pub fn room_not_available(room_name: &str, status: &str) -> Self {
        Self::with_message(ErrorCode::RoomNotAvailable, format!("Room {room_name} is {status}"))
            .with_detail("status", status)
    }

    pub fn not_authenticated() -> Self {
        Self::new(ErrorCode::NotAuthenticated)
    }

    pub fn invalid_token(msg: impl Into<String>) -> Self {
        Self::with_message(ErrorCode::TokenInvalid, msg)
    }

    pub fn token_expired() -> Self {
        Self::new(ErrorCode::TokenExpired)
    }

    pub fn invalid_credentials() -> Self {
        Self::new(ErrorCode::InvalidCredentials)
    }

    pub fn admin_required() -> Self {
        Self::new(ErrorCode::AdminRequired)
    }

    pub fn internal(msg: impl Into<String>) -> Self {
        Self::with_message(ErrorCode::InternalError, msg)
    }

    pub fn database(msg: impl Into<String>) -> Self {
        Self::with_message(ErrorCode::DatabaseError, msg)
    }
}

/// Field errors land in `details`, one entry per field
impl From<validator::ValidationErrors> for AppError {
    fn from(errors: validator::ValidationErrors) -> Self {
        let mut err = AppError::validation("Request validation failed");
        for (field, field_errors) in errors.field_errors() {
            let reasons: Vec<String> = field_errors
                .iter()
                .map(|e| {
                    e.message
                        .as_ref()
                        .map(|m| m.to_string())
                        .unwrap_or_else(|| e.code.to_string())
                })
                .collect();
            err = err.with_detail(field.to_string(), reasons.join(", "));
        }
        err
    }
}

/// Response body: `{code, message, data?, details?}`, `code` 0 on success
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiResponse<T> {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub code: Option<u16>,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<T>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<HashMap<String, Value>>,
}

impl<T> ApiResponse<T> {
    pub fn success(data: T) -> Self {
        Self::success_with_message("OK", data)
    }

    pub fn success_with_message(message: impl Into<String>, data: T) -> Self {
        Self {
            code: Some(0),
            message: message.into(),
            data: Some(data),
            details: None,
        }
    }
}

impl ApiResponse<()> {
    /// Acknowledgement without a payload (logout, webhooks)
    pub fn ok() -> Self {
        Self {
            code: Some(0),
            message: "OK".to_string(),
            data: None,
            details: None,
        }
    }

    pub fn error(err: &AppError) -> Self {
        Self {
            code: Some(err.code.code()),
            message: err.message.clone(),
            data: None,
            details: err.details.clone(),
        }
    }
}

impl axum::response::IntoResponse for AppError {
    fn into_response(self) -> axum::response::Response {
        let status = self.http_status();
        if matches!(self.code.category(), super::category::ErrorCategory::System) {
            tracing::error!(code = %self.code, message = %self.message, "System error occurred");
        }
        (status, axum::Json(ApiResponse::<()>::error(&self))).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use validator::Validate;

    #[test]
    fn test_stock_message() {
        let err = AppError::new(ErrorCode::RoomNotFound);
        assert_eq!(err.code, ErrorCode::RoomNotFound);
        assert_eq!(err.message, "Room not found");
        assert!(err.details.is_none());
    }

    #[test]
    fn test_lease_still_active_carries_end_date() {
        let end = NaiveDate::from_ymd_opt(2026, 3, 1).unwrap();
        let err = AppError::lease_still_active(end);
        assert_eq!(err.code, ErrorCode::LeaseStillActive);
        assert_eq!(err.message, "Your current lease runs until 2026-03-01");
        assert_eq!(err.details.as_ref().unwrap().get("end_date").unwrap(), "2026-03-01");
        assert_eq!(err.http_status(), StatusCode::CONFLICT);
    }

    #[test]
    fn test_room_not_available() {
        let err = AppError::room_not_available("A1", "Occupied");
        assert_eq!(err.message, "Room A1 is Occupied");
        assert_eq!(err.http_status(), StatusCode::CONFLICT);
    }

    #[test]
    fn test_auth_errors_status() {
        assert_eq!(AppError::not_authenticated().http_status(), StatusCode::UNAUTHORIZED);
        assert_eq!(AppError::token_expired().http_status(), StatusCode::UNAUTHORIZED);
        assert_eq!(AppError::admin_required().http_status(), StatusCode::FORBIDDEN);
    }

    #[test]
    fn test_resource_errors() {
        let err = AppError::not_found("User");
        assert_eq!(err.code, ErrorCode::NotFound);
        assert_eq!(err.message, "User not found");
        assert_eq!(err.details.unwrap().get("resource").unwrap(), "User");

        let err = AppError::already_exists("Room name");
        assert_eq!(err.code, ErrorCode::AlreadyExists);
        assert_eq!(err.message, "Room name already exists");
        assert!(err.http_status().is_client_error());

        assert!(AppError::database("disk I/O").http_status().is_server_error());
    }

    #[derive(Validate)]
    struct Sample {
        #[validate(length(min = 3, message = "too short"))]
        name: String,
    }

    #[test]
    fn test_from_validation_errors() {
        let sample = Sample { name: "ab".into() };
        let err: AppError = sample.validate().unwrap_err().into();
        assert_eq!(err.code, ErrorCode::ValidationFailed);
        assert_eq!(err.details.unwrap().get("name").unwrap(), "too short");
    }

    #[test]
    fn test_envelope_shape() {
        let response = ApiResponse::success(42);
        assert_eq!(response.code, Some(0));
        assert_eq!(response.data, Some(42));

        let err = AppError::new(ErrorCode::BookingPending).with_detail("booking_id", 7);
        let response = ApiResponse::<()>::error(&err);
        assert_eq!(response.code, Some(4002));
        assert!(response.details.is_some());

        let json = serde_json::to_string(&ApiResponse::<()>::ok()).unwrap();
        assert_eq!(json, r#"{"code":0,"message":"OK"}"#);

        let parsed: ApiResponse<i32> =
            serde_json::from_str(r#"{"code":6001,"message":"Room not found"}"#).unwrap();
        assert_eq!(parsed.code, Some(6001));
        assert!(parsed.data.is_none());
    }
}
