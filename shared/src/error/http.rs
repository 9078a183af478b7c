//! HTTP status code mapping for error codes

use super::codes::ErrorCode;
use http::StatusCode;

impl ErrorCode {
    /// Get the appropriate HTTP status code for this error code
    pub fn http_status(&self) -> StatusCode {
        match self {
            // Success
            Self::Success => StatusCode::OK,

            // 404 Not Found
            Self::NotFound
            | Self::ProfileNotFound
            | Self::BookingNotFound
            | Self::PaymentNotFound
            | Self::ReminderNotFound
            | Self::RoomNotFound
            | Self::GalleryNotFound
            | Self::ReviewNotFound => StatusCode::NOT_FOUND,

            // 409 Conflict
            Self::AlreadyExists
            | Self::UsernameTaken
            | Self::EmailTaken
            | Self::BookingPending
            | Self::LeaseStillActive
            | Self::BookingClosed
            | Self::PaymentAlreadyConfirmed
            | Self::RoomNotAvailable
            | Self::RoomOccupied
            | Self::RoomHasBookings => StatusCode::CONFLICT,

            // 401 Unauthorized
            Self::NotAuthenticated
            | Self::InvalidCredentials
            | Self::TokenExpired
            | Self::TokenInvalid
            | Self::ExternalLoginFailed
            | Self::InvalidSignature => StatusCode::UNAUTHORIZED,

            // 403 Forbidden
            Self::PermissionDenied
            | Self::AdminRequired
            | Self::NotResourceOwner
            | Self::ReviewNotAllowed => StatusCode::FORBIDDEN,

            // 413 Payload Too Large
            Self::FileTooLarge => StatusCode::PAYLOAD_TOO_LARGE,

            // 429 Too Many Requests
            Self::TooManyRequests => StatusCode::TOO_MANY_REQUESTS,

            // 422 Unprocessable (business rule on a well-formed request)
            Self::InvalidBookingTransition
            | Self::BookingNotExtendable
            | Self::PaymentNotPending
            | Self::RoomStatusDerived => StatusCode::UNPROCESSABLE_ENTITY,

            // 502 Bad Gateway (upstream provider failed)
            Self::PaymentGatewayError | Self::EmailDeliveryFailed => StatusCode::BAD_GATEWAY,

            // 503 Service Unavailable (transient errors, client can retry)
            Self::NetworkError | Self::TimeoutError | Self::FeatureDisabled => {
                StatusCode::SERVICE_UNAVAILABLE
            }

            // 500 Internal Server Error
            Self::Unknown
            | Self::InternalError
            | Self::DatabaseError
            | Self::ConfigError
            | Self::FileStorageFailed => StatusCode::INTERNAL_SERVER_ERROR,

            // 400 Bad Request (default for validation errors)
            _ => StatusCode::BAD_REQUEST,
        }
    }
}
