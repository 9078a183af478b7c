//! Unified error codes for the kos platform
//!
//! This module defines all error codes shared by kos-server and kos-client.
//! Error codes are organized by category:
//! - 0xxx: General errors
//! - 1xxx: Authentication errors
//! - 2xxx: Permission errors
//! - 3xxx: Tenant profile errors
//! - 4xxx: Booking errors
//! - 5xxx: Payment errors
//! - 6xxx: Room errors (65xx: file upload)
//! - 7xxx: Gallery and review errors
//! - 9xxx: System errors

use serde::{Deserialize, Serialize};
use std::fmt;

/// Unified error code enum
///
/// All error codes are represented as u16 values so that clients in any
/// language can match on them without string parsing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(into = "u16", try_from = "u16")]
#[repr(u16)]
pub enum ErrorCode {
    // ==================== 0xxx: General ====================
    /// Operation completed successfully
    Success = 0,
    /// Unknown error
    Unknown = 1,
    /// Validation failed
    ValidationFailed = 2,
    /// Resource not found
    NotFound = 3,
    /// Resource already exists
    AlreadyExists = 4,
    /// Invalid request
    InvalidRequest = 5,
    /// Invalid format
    InvalidFormat = 6,
    /// Required field missing
    RequiredField = 7,
    /// Value out of range
    ValueOutOfRange = 8,
    /// Too many requests from this client
    TooManyRequests = 9,
    /// Feature is not configured on this server
    FeatureDisabled = 10,

    // ==================== 1xxx: Auth ====================
    /// User is not authenticated
    NotAuthenticated = 1001,
    /// Invalid credentials (username/password)
    InvalidCredentials = 1002,
    /// Token has expired
    TokenExpired = 1003,
    /// Token is invalid
    TokenInvalid = 1004,
    /// Username already registered
    UsernameTaken = 1005,
    /// Password too short
    PasswordTooShort = 1006,
    /// Password reset token invalid or expired
    ResetTokenInvalid = 1007,
    /// External identity provider rejected the login
    ExternalLoginFailed = 1008,

    // ==================== 2xxx: Permission ====================
    /// Permission denied
    PermissionDenied = 2001,
    /// Admin role required
    AdminRequired = 2002,
    /// Resource belongs to another user
    NotResourceOwner = 2003,

    // ==================== 3xxx: Profile ====================
    /// Tenant profile not found
    ProfileNotFound = 3001,
    /// NIK must be 16 digits
    InvalidNik = 3002,
    /// Phone number format invalid
    InvalidPhone = 3003,
    /// Email already used by another profile
    EmailTaken = 3004,

    // ==================== 4xxx: Booking ====================
    /// Booking not found
    BookingNotFound = 4001,
    /// Tenant already has a pending booking
    BookingPending = 4002,
    /// Tenant lease is still running
    LeaseStillActive = 4003,
    /// Booking is already cancelled or completed
    BookingClosed = 4004,
    /// Only confirmed or active bookings can be extended
    BookingNotExtendable = 4005,
    /// Booking status transition not allowed
    InvalidBookingTransition = 4006,
    /// Date invalid or in the past
    InvalidDate = 4007,
    /// Lease duration out of range
    InvalidDuration = 4008,

    // ==================== 5xxx: Payment ====================
    /// Payment not found
    PaymentNotFound = 5001,
    /// Payment type must be full or dp
    InvalidPaymentType = 5002,
    /// Payment already confirmed
    PaymentAlreadyConfirmed = 5003,
    /// Payment is not pending
    PaymentNotPending = 5004,
    /// Payment notification signature mismatch
    InvalidSignature = 5005,
    /// Payment gateway call failed
    PaymentGatewayError = 5006,
    /// Payment reminder not found
    ReminderNotFound = 5007,

    // ==================== 6xxx: Room ====================
    /// Room not found
    RoomNotFound = 6001,
    /// Room is not available for booking
    RoomNotAvailable = 6002,
    /// Room has a running lease
    RoomOccupied = 6003,
    /// Room still has open bookings
    RoomHasBookings = 6004,
    /// Occupied/Reserved are derived from bookings
    RoomStatusDerived = 6005,
    /// Price must be positive
    InvalidPrice = 6006,

    // ==================== 65xx: File Upload ====================
    /// File too large
    FileTooLarge = 6501,
    /// Unsupported file format
    UnsupportedFileFormat = 6502,
    /// Invalid/corrupted image file
    InvalidImageFile = 6503,
    /// No file provided in request
    NoFileProvided = 6504,
    /// Empty file provided
    EmptyFile = 6505,
    /// File storage failed
    FileStorageFailed = 6509,

    // ==================== 7xxx: Gallery & Review ====================
    /// Gallery item not found
    GalleryNotFound = 7001,
    /// Review not found
    ReviewNotFound = 7101,
    /// Rating must be between 1 and 5
    InvalidRating = 7102,
    /// Only tenants who rented the room may review it
    ReviewNotAllowed = 7103,

    // ==================== 9xxx: System ====================
    /// Internal server error
    InternalError = 9001,
    /// Database error
    DatabaseError = 9002,
    /// Network error
    NetworkError = 9003,
    /// Operation timeout
    TimeoutError = 9004,
    /// Configuration error
    ConfigError = 9005,
    /// Email could not be delivered
    EmailDeliveryFailed = 9006,
}

impl ErrorCode {
    /// Get the numeric code value
    #[inline]
    pub const fn code(&self) -> u16 {
        *self as u16
    }

    /// Check if this is a success code
    #[inline]
    pub const fn is_success(&self) -> bool {
        matches!(self, ErrorCode::Success)
    }

    /// Get the default message for this error code
    pub const fn message(&self) -> &'static str {
        match self {
            // General
            ErrorCode::Success => "Operation completed successfully",
            ErrorCode::Unknown => "Unknown error",
            ErrorCode::ValidationFailed => "Validation failed",
            ErrorCode::NotFound => "Resource not found",
            ErrorCode::AlreadyExists => "Resource already exists",
            ErrorCode::InvalidRequest => "Invalid request",
            ErrorCode::InvalidFormat => "Invalid format",
            ErrorCode::RequiredField => "Required field missing",
            ErrorCode::ValueOutOfRange => "Value out of range",
            ErrorCode::TooManyRequests => "Too many requests, try again later",
            ErrorCode::FeatureDisabled => "Feature is not enabled",

            // Auth
            ErrorCode::NotAuthenticated => "Authentication required",
            ErrorCode::InvalidCredentials => "Invalid username or password",
            ErrorCode::TokenExpired => "Token has expired",
            ErrorCode::TokenInvalid => "Invalid token",
            ErrorCode::UsernameTaken => "Username already registered",
            ErrorCode::PasswordTooShort => "Password must be at least 6 characters",
            ErrorCode::ResetTokenInvalid => "Reset token is invalid or expired",
            ErrorCode::ExternalLoginFailed => "External login failed",

            // Permission
            ErrorCode::PermissionDenied => "Permission denied",
            ErrorCode::AdminRequired => "Admin role required",
            ErrorCode::NotResourceOwner => "Resource belongs to another user",

            // Profile
            ErrorCode::ProfileNotFound => "Tenant profile not found",
            ErrorCode::InvalidNik => "NIK must be exactly 16 digits",
            ErrorCode::InvalidPhone => "Phone number must start with 08 or 62",
            ErrorCode::EmailTaken => "Email already in use",

            // Booking
            ErrorCode::BookingNotFound => "Booking not found",
            ErrorCode::BookingPending => "A pending booking already exists",
            ErrorCode::LeaseStillActive => "Current lease is still active",
            ErrorCode::BookingClosed => "Booking is already closed",
            ErrorCode::BookingNotExtendable => "Only confirmed bookings can be extended",
            ErrorCode::InvalidBookingTransition => "Booking status change not allowed",
            ErrorCode::InvalidDate => "Invalid date",
            ErrorCode::InvalidDuration => "Invalid lease duration",

            // Payment
            ErrorCode::PaymentNotFound => "Payment not found",
            ErrorCode::InvalidPaymentType => "Invalid payment type",
            ErrorCode::PaymentAlreadyConfirmed => "Payment already confirmed",
            ErrorCode::PaymentNotPending => "Payment is not pending",
            ErrorCode::InvalidSignature => "Invalid signature",
            ErrorCode::PaymentGatewayError => "Payment gateway error",
            ErrorCode::ReminderNotFound => "Payment reminder not found",

            // Room
            ErrorCode::RoomNotFound => "Room not found",
            ErrorCode::RoomNotAvailable => "Room is not available",
            ErrorCode::RoomOccupied => "Room has a running lease",
            ErrorCode::RoomHasBookings => "Room still has open bookings",
            ErrorCode::RoomStatusDerived => "Room status is derived from bookings",
            ErrorCode::InvalidPrice => "Price must be positive",

            // File upload
            ErrorCode::FileTooLarge => "File too large",
            ErrorCode::UnsupportedFileFormat => "Unsupported file format",
            ErrorCode::InvalidImageFile => "Invalid image file",
            ErrorCode::NoFileProvided => "No file provided",
            ErrorCode::EmptyFile => "Empty file",
            ErrorCode::FileStorageFailed => "Failed to store file",

            // Gallery & review
            ErrorCode::GalleryNotFound => "Gallery item not found",
            ErrorCode::ReviewNotFound => "Review not found",
            ErrorCode::InvalidRating => "Rating must be between 1 and 5",
            ErrorCode::ReviewNotAllowed => "Only tenants of this room can review it",

            // System
            ErrorCode::InternalError => "Internal server error",
            ErrorCode::DatabaseError => "Database error",
            ErrorCode::NetworkError => "Network error",
            ErrorCode::TimeoutError => "Operation timed out",
            ErrorCode::ConfigError => "Configuration error",
            ErrorCode::EmailDeliveryFailed => "Email delivery failed",
        }
    }
}

impl From<ErrorCode> for u16 {
    #[inline]
    fn from(code: ErrorCode) -> Self {
        code.code()
    }
}

/// Error when converting from an invalid u16 to ErrorCode
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct InvalidErrorCode(pub u16);

impl fmt::Display for InvalidErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "invalid error code: {}", self.0)
    }
}

impl std::error::Error for InvalidErrorCode {}

impl TryFrom<u16> for ErrorCode {
    type Error = InvalidErrorCode;

    fn try_from(value: u16) -> Result<Self, Self::Error> {
        match value {
            // General
            0 => Ok(ErrorCode::Success),
            1 => Ok(ErrorCode::Unknown),
            2 => Ok(ErrorCode::ValidationFailed),
            3 => Ok(ErrorCode::NotFound),
            4 => Ok(ErrorCode::AlreadyExists),
            5 => Ok(ErrorCode::InvalidRequest),
            6 => Ok(ErrorCode::InvalidFormat),
            7 => Ok(ErrorCode::RequiredField),
            8 => Ok(ErrorCode::ValueOutOfRange),
            9 => Ok(ErrorCode::TooManyRequests),
            10 => Ok(ErrorCode::FeatureDisabled),

            // Auth
            1001 => Ok(ErrorCode::NotAuthenticated),
            1002 => Ok(ErrorCode::InvalidCredentials),
            1003 => Ok(ErrorCode::TokenExpired),
            1004 => Ok(ErrorCode::TokenInvalid),
            1005 => Ok(ErrorCode::UsernameTaken),
            1006 => Ok(ErrorCode::PasswordTooShort),
            1007 => Ok(ErrorCode::ResetTokenInvalid),
            1008 => Ok(ErrorCode::ExternalLoginFailed),

            // Permission
            2001 => Ok(ErrorCode::PermissionDenied),
            2002 => Ok(ErrorCode::AdminRequired),
            2003 => Ok(ErrorCode::NotResourceOwner),

            // Profile
            3001 => Ok(ErrorCode::ProfileNotFound),
            3002 => Ok(ErrorCode::InvalidNik),
            3003 => Ok(ErrorCode::InvalidPhone),
            3004 => Ok(ErrorCode::EmailTaken),

            // Booking
            4001 => Ok(ErrorCode::BookingNotFound),
            4002 => Ok(ErrorCode::BookingPending),
            4003 => Ok(ErrorCode::LeaseStillActive),
            4004 => Ok(ErrorCode::BookingClosed),
            4005 => Ok(ErrorCode::BookingNotExtendable),
            4006 => Ok(ErrorCode::InvalidBookingTransition),
            4007 => Ok(ErrorCode::InvalidDate),
            4008 => Ok(ErrorCode::InvalidDuration),

            // Payment
            5001 => Ok(ErrorCode::PaymentNotFound),
            5002 => Ok(ErrorCode::InvalidPaymentType),
            5003 => Ok(ErrorCode::PaymentAlreadyConfirmed),
            5004 => Ok(ErrorCode::PaymentNotPending),
            5005 => Ok(ErrorCode::InvalidSignature),
            5006 => Ok(ErrorCode::PaymentGatewayError),
            5007 => Ok(ErrorCode::ReminderNotFound),

            // Room
            6001 => Ok(ErrorCode::RoomNotFound),
            6002 => Ok(ErrorCode::RoomNotAvailable),
            6003 => Ok(ErrorCode::RoomOccupied),
            6004 => Ok(ErrorCode::RoomHasBookings),
            6005 => Ok(ErrorCode::RoomStatusDerived),
            6006 => Ok(ErrorCode::InvalidPrice),

            // File upload
            6501 => Ok(ErrorCode::FileTooLarge),
            6502 => Ok(ErrorCode::UnsupportedFileFormat),
            6503 => Ok(ErrorCode::InvalidImageFile),
            6504 => Ok(ErrorCode::NoFileProvided),
            6505 => Ok(ErrorCode::EmptyFile),
            6509 => Ok(ErrorCode::FileStorageFailed),

            // Gallery & review
            7001 => Ok(ErrorCode::GalleryNotFound),
            7101 => Ok(ErrorCode::ReviewNotFound),
            7102 => Ok(ErrorCode::InvalidRating),
            7103 => Ok(ErrorCode::ReviewNotAllowed),

            // System
            9001 => Ok(ErrorCode::InternalError),
            9002 => Ok(ErrorCode::DatabaseError),
            9003 => Ok(ErrorCode::NetworkError),
            9004 => Ok(ErrorCode::TimeoutError),
            9005 => Ok(ErrorCode::ConfigError),
            9006 => Ok(ErrorCode::EmailDeliveryFailed),

            _ => Err(InvalidErrorCode(value)),
        }
    }
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.code())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_code_values() {
        assert_eq!(ErrorCode::Success.code(), 0);
        assert_eq!(ErrorCode::TooManyRequests.code(), 9);
        assert_eq!(ErrorCode::NotAuthenticated.code(), 1001);
        assert_eq!(ErrorCode::AdminRequired.code(), 2002);
        assert_eq!(ErrorCode::InvalidNik.code(), 3002);
        assert_eq!(ErrorCode::BookingPending.code(), 4002);
        assert_eq!(ErrorCode::InvalidPaymentType.code(), 5002);
        assert_eq!(ErrorCode::RoomNotAvailable.code(), 6002);
        assert_eq!(ErrorCode::FileTooLarge.code(), 6501);
        assert_eq!(ErrorCode::InvalidRating.code(), 7102);
        assert_eq!(ErrorCode::InternalError.code(), 9001);
    }

    #[test]
    fn test_is_success() {
        assert!(ErrorCode::Success.is_success());
        assert!(!ErrorCode::Unknown.is_success());
        assert!(!ErrorCode::BookingNotFound.is_success());
    }

    #[test]
    fn test_try_from_covers_every_variant() {
        let all = [
            ErrorCode::Success,
            ErrorCode::FeatureDisabled,
            ErrorCode::ExternalLoginFailed,
            ErrorCode::NotResourceOwner,
            ErrorCode::EmailTaken,
            ErrorCode::InvalidDuration,
            ErrorCode::ReminderNotFound,
            ErrorCode::InvalidPrice,
            ErrorCode::FileStorageFailed,
            ErrorCode::ReviewNotAllowed,
            ErrorCode::EmailDeliveryFailed,
        ];
        for code in all {
            assert_eq!(ErrorCode::try_from(code.code()), Ok(code));
        }
    }

    #[test]
    fn test_try_from_invalid() {
        assert_eq!(ErrorCode::try_from(999), Err(InvalidErrorCode(999)));
        assert_eq!(ErrorCode::try_from(8001), Err(InvalidErrorCode(8001)));
    }

    #[test]
    fn test_serialize_as_number() {
        assert_eq!(serde_json::to_string(&ErrorCode::NotFound).unwrap(), "3");
        assert_eq!(
            serde_json::to_string(&ErrorCode::BookingNotFound).unwrap(),
            "4001"
        );
    }

    #[test]
    fn test_deserialize() {
        let code: ErrorCode = serde_json::from_str("4003").unwrap();
        assert_eq!(code, ErrorCode::LeaseStillActive);

        let result: Result<ErrorCode, _> = serde_json::from_str("10000");
        assert!(result.is_err());
    }

    #[test]
    fn test_display() {
        assert_eq!(format!("{}", ErrorCode::Success), "0");
        assert_eq!(format!("{}", ErrorCode::RoomNotFound), "6001");
    }

    #[test]
    fn test_message() {
        assert_eq!(ErrorCode::NotFound.message(), "Resource not found");
        assert_eq!(ErrorCode::RoomNotFound.message(), "Room not found");
        assert_eq!(
            ErrorCode::InvalidNik.message(),
            "NIK must be exactly 16 digits"
        );
    }

    #[test]
    fn test_invalid_error_code_display() {
        let err = InvalidErrorCode(999);
        assert_eq!(format!("{}", err), "invalid error code: 999");
    }
}
