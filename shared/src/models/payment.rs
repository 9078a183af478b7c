//! Payment and Reminder Models

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "db", derive(sqlx::Type))]
pub enum PaymentStatus {
    Pending,
    Confirmed,
    Failed,
    Rejected,
    Settled,
}

impl PaymentStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Pending => "Pending",
            Self::Confirmed => "Confirmed",
            Self::Failed => "Failed",
            Self::Rejected => "Rejected",
            Self::Settled => "Settled",
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
#[cfg_attr(feature = "db", derive(sqlx::Type))]
#[cfg_attr(feature = "db", sqlx(rename_all = "lowercase"))]
pub enum PaymentMethod {
    Midtrans,
    Cash,
    Manual,
}

impl FromStr for PaymentMethod {
    type Err = UnknownVariant;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "midtrans" => Ok(Self::Midtrans),
            "cash" => Ok(Self::Cash),
            "manual" | "transfer" => Ok(Self::Manual),
            _ => Err(UnknownVariant(s.to_string())),
        }
    }
}

/// What a payment pays for
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
#[cfg_attr(feature = "db", derive(sqlx::Type))]
#[cfg_attr(feature = "db", sqlx(rename_all = "lowercase"))]
pub enum PaymentType {
    /// Whole lease up front
    Full,
    /// 30% down payment, remainder tracked by a reminder
    #[serde(rename = "dp")]
    #[cfg_attr(feature = "db", sqlx(rename = "dp"))]
    DownPayment,
    /// Lease extension
    Extend,
}

impl FromStr for PaymentType {
    type Err = UnknownVariant;

    /// Only `full` and `dp` may be requested by a tenant; `extend` is
    /// created by the extension flow.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "full" => Ok(Self::Full),
            "dp" => Ok(Self::DownPayment),
            _ => Err(UnknownVariant(s.to_string())),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnknownVariant(pub String);

impl fmt::Display for UnknownVariant {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "unknown value: {}", self.0)
    }
}

impl std::error::Error for UnknownVariant {}

/// Payment entity
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[cfg_attr(feature = "db", derive(sqlx::FromRow))]
pub struct Payment {
    pub id: i64,
    pub booking_id: i64,
    pub amount: f64,
    pub paid_at: Option<i64>,
    pub proof_url: Option<String>,
    pub status: PaymentStatus,
    pub order_id: Option<String>,
    pub snap_token: Option<String>,
    pub method: PaymentMethod,
    pub payment_type: PaymentType,
    pub down_payment_amount: f64,
    /// Next installment due date (down payments)
    pub due_date: Option<NaiveDate>,
    /// Months added to the lease once confirmed (extensions)
    pub extend_months: i64,
    pub created_at: i64,
    pub updated_at: i64,
}

/// Create payment session payload
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PaymentCreate {
    pub booking_id: i64,
    /// `full` or `dp`
    pub payment_type: String,
}

/// Payment row for the admin list
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "db", derive(sqlx::FromRow))]
pub struct PaymentSummary {
    #[serde(flatten)]
    #[cfg_attr(feature = "db", sqlx(flatten))]
    pub payment: Payment,
    pub room_name: String,
    pub username: String,
    pub tenant_name: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PaymentQuery {
    pub status: Option<PaymentStatus>,
}

/// Midtrans Snap session handed to the browser
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SnapSession {
    pub payment_id: i64,
    pub order_id: String,
    pub token: String,
    pub redirect_url: String,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "db", derive(sqlx::Type))]
pub enum ReminderStatus {
    Pending,
    Paid,
    Expired,
}

/// Installment reminder attached to a payment
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[cfg_attr(feature = "db", derive(sqlx::FromRow))]
pub struct PaymentReminder {
    pub id: i64,
    pub payment_id: i64,
    pub amount: f64,
    pub due_date: NaiveDate,
    pub status: ReminderStatus,
    pub is_sent: bool,
    pub created_at: i64,
}

/// Reminder with the booking context a tenant needs ("my bills")
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "db", derive(sqlx::FromRow))]
pub struct ReminderDetail {
    #[serde(flatten)]
    #[cfg_attr(feature = "db", sqlx(flatten))]
    pub reminder: PaymentReminder,
    pub booking_id: i64,
    pub room_name: String,
    pub user_id: i64,
}
