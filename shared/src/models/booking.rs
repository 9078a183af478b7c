//! Booking Models

use chrono::{Months, NaiveDate};
use serde::{Deserialize, Serialize};
use validator::Validate;

use super::payment::{Payment, PaymentStatus};
use super::room::Room;

/// Longest lease a single booking or extension may request
pub const MAX_LEASE_MONTHS: i64 = 24;

/// Booking lifecycle
///
/// ```text
/// Pending ──▶ Confirmed ──▶ Active ──▶ Completed
///    │            │            │
///    └────────────┴────────────┴──▶ Cancelled
/// ```
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "db", derive(sqlx::Type))]
pub enum BookingStatus {
    Pending,
    Confirmed,
    Active,
    Completed,
    Cancelled,
}

impl BookingStatus {
    pub fn can_transition_to(&self, next: BookingStatus) -> bool {
        use BookingStatus::*;
        matches!(
            (self, next),
            (Pending, Confirmed)
                | (Pending, Cancelled)
                | (Confirmed, Active)
                | (Confirmed, Completed)
                | (Confirmed, Cancelled)
                | (Active, Completed)
                | (Active, Cancelled)
        )
    }

    /// Confirmed or Active: the tenant holds the room
    pub fn is_active_lease(&self) -> bool {
        matches!(self, Self::Confirmed | Self::Active)
    }

    /// Still open: not cancelled or completed
    pub fn is_open(&self) -> bool {
        matches!(self, Self::Pending | Self::Confirmed | Self::Active)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Pending => "Pending",
            Self::Confirmed => "Confirmed",
            Self::Active => "Active",
            Self::Completed => "Completed",
            Self::Cancelled => "Cancelled",
        }
    }
}

/// Booking entity
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[cfg_attr(feature = "db", derive(sqlx::FromRow))]
pub struct Booking {
    pub id: i64,
    pub user_id: i64,
    pub room_id: i64,
    pub start_date: NaiveDate,
    pub duration_months: i64,
    /// Room price captured when the booking was made
    pub monthly_rent: f64,
    /// Sum of confirmed payments
    pub total_paid: f64,
    pub status: BookingStatus,
    pub notes: Option<String>,
    pub created_at: i64,
    pub updated_at: i64,
}

impl Booking {
    /// Move-out date (start + duration months)
    pub fn end_date(&self) -> NaiveDate {
        lease_end(self.start_date, self.duration_months)
    }
}

/// `start + months`, clamped to the end of month like a calendar would.
pub fn lease_end(start: NaiveDate, months: i64) -> NaiveDate {
    u32::try_from(months)
        .ok()
        .and_then(|m| start.checked_add_months(Months::new(m)))
        .unwrap_or(NaiveDate::MAX)
}

/// Create booking payload
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct BookingCreate {
    pub room_id: i64,
    /// `YYYY-MM-DD`
    #[validate(length(equal = 10))]
    pub start_date: String,
    #[validate(range(min = 1, max = 24))]
    pub duration_months: i64,
    #[validate(length(max = 500))]
    pub notes: Option<String>,
}

/// Admin booking update payload
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct BookingUpdate {
    pub status: Option<BookingStatus>,
    pub notes: Option<String>,
}

/// Extend lease payload
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct ExtendBookingRequest {
    #[validate(range(min = 1, max = 24))]
    pub months: i64,
}

/// Booking list filter (admin)
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct BookingQuery {
    pub status: Option<BookingStatus>,
    pub user_id: Option<i64>,
}

/// Booking as seen by its tenant: room, payments and paid total
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BookingDetail {
    #[serde(flatten)]
    pub booking: Booking,
    pub end_date: NaiveDate,
    pub room: Room,
    pub last_payment_status: Option<PaymentStatus>,
    pub payments: Vec<Payment>,
}

/// Booking row for the admin list
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "db", derive(sqlx::FromRow))]
pub struct BookingSummary {
    #[serde(flatten)]
    #[cfg_attr(feature = "db", sqlx(flatten))]
    pub booking: Booking,
    pub room_name: String,
    pub username: String,
    pub tenant_name: Option<String>,
}

/// Aggregates exposed to the admin and to the client store
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct BookingStats {
    pub total_bookings: i64,
    pub total_revenue: f64,
    pub active_bookings: i64,
    pub occupied_rooms: i64,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(s: &str) -> NaiveDate {
        NaiveDate::parse_from_str(s, "%Y-%m-%d").unwrap()
    }

    #[test]
    fn test_transitions() {
        use BookingStatus::*;
        assert!(Pending.can_transition_to(Confirmed));
        assert!(Pending.can_transition_to(Cancelled));
        assert!(!Pending.can_transition_to(Active));
        assert!(Confirmed.can_transition_to(Active));
        assert!(Active.can_transition_to(Completed));
        assert!(!Cancelled.can_transition_to(Pending));
        assert!(!Completed.can_transition_to(Cancelled));
        assert!(!Confirmed.can_transition_to(Confirmed));
    }

    #[test]
    fn test_is_active_lease() {
        assert!(BookingStatus::Confirmed.is_active_lease());
        assert!(BookingStatus::Active.is_active_lease());
        assert!(!BookingStatus::Pending.is_active_lease());
        assert!(BookingStatus::Pending.is_open());
        assert!(!BookingStatus::Cancelled.is_open());
    }

    #[test]
    fn test_lease_end_clamps_month_end() {
        assert_eq!(lease_end(date("2025-01-15"), 6), date("2025-07-15"));
        assert_eq!(lease_end(date("2025-01-31"), 1), date("2025-02-28"));
        assert_eq!(lease_end(date("2024-11-30"), 3), date("2025-02-28"));
        assert_eq!(lease_end(date("2025-01-01"), -1), NaiveDate::MAX);
    }

    #[test]
    fn test_status_serializes_as_name() {
        let json = serde_json::to_string(&BookingStatus::Cancelled).unwrap();
        assert_eq!(json, "\"Cancelled\"");
    }

    #[test]
    fn test_booking_create_validation() {
        let ok = BookingCreate {
            room_id: 1,
            start_date: "2025-03-01".into(),
            duration_months: 6,
            notes: None,
        };
        assert!(ok.validate().is_ok());

        let too_long = BookingCreate {
            duration_months: 36,
            ..ok
        };
        assert!(too_long.validate().is_err());
    }
}
