//! Room Models

use serde::{Deserialize, Serialize};
use validator::Validate;

/// Room occupancy status
///
/// `Occupied` and `Reserved` are derived from bookings; only `Available`
/// and `Maintenance` can be requested by an admin.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "db", derive(sqlx::Type))]
pub enum RoomStatus {
    Available,
    Occupied,
    Maintenance,
    Reserved,
}

impl RoomStatus {
    /// Statuses an admin may set directly
    pub fn is_assignable(&self) -> bool {
        matches!(self, Self::Available | Self::Maintenance)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Available => "Available",
            Self::Occupied => "Occupied",
            Self::Maintenance => "Maintenance",
            Self::Reserved => "Reserved",
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "db", derive(sqlx::Type))]
pub enum RoomType {
    Standard,
    Deluxe,
    Premium,
    Executive,
}

impl RoomType {
    pub const ALL: [RoomType; 4] = [
        RoomType::Standard,
        RoomType::Deluxe,
        RoomType::Premium,
        RoomType::Executive,
    ];
}

/// Room entity
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[cfg_attr(feature = "db", derive(sqlx::FromRow))]
pub struct Room {
    pub id: i64,
    /// Room number shown to tenants, e.g. "A1"
    pub name: String,
    pub room_type: RoomType,
    /// Monthly rent in rupiah
    pub price: f64,
    pub status: RoomStatus,
    pub capacity: i64,
    pub floor: i64,
    /// Free text, e.g. "3x4m"
    pub size: String,
    pub bedrooms: i64,
    pub bathrooms: i64,
    #[cfg_attr(feature = "db", sqlx(json))]
    pub facilities: Vec<String>,
    pub description: String,
    pub image_url: Option<String>,
    pub created_at: i64,
    pub updated_at: i64,
}

/// Room with aggregated review data (listing view)
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "db", derive(sqlx::FromRow))]
pub struct RoomListing {
    #[serde(flatten)]
    #[cfg_attr(feature = "db", sqlx(flatten))]
    pub room: Room,
    pub rating: f64,
    pub review_count: i64,
}

/// Create room payload
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct RoomCreate {
    #[validate(length(min = 1, max = 50))]
    pub name: String,
    pub room_type: RoomType,
    #[validate(range(exclusive_min = 0.0))]
    pub price: f64,
    #[validate(range(min = 1, max = 10))]
    pub capacity: i64,
    #[serde(default)]
    pub floor: i64,
    #[serde(default)]
    pub size: String,
    #[validate(range(min = 0, max = 10))]
    #[serde(default = "default_one")]
    pub bedrooms: i64,
    #[validate(range(min = 0, max = 10))]
    #[serde(default = "default_one")]
    pub bathrooms: i64,
    #[serde(default)]
    pub facilities: Vec<String>,
    #[serde(default)]
    pub description: String,
    pub image_url: Option<String>,
}

fn default_one() -> i64 {
    1
}

/// Update room payload (all fields optional)
#[derive(Debug, Clone, Default, Serialize, Deserialize, Validate)]
pub struct RoomUpdate {
    #[validate(length(min = 1, max = 50))]
    pub name: Option<String>,
    pub room_type: Option<RoomType>,
    #[validate(range(exclusive_min = 0.0))]
    pub price: Option<f64>,
    #[validate(range(min = 1, max = 10))]
    pub capacity: Option<i64>,
    pub floor: Option<i64>,
    pub size: Option<String>,
    pub bedrooms: Option<i64>,
    pub bathrooms: Option<i64>,
    pub facilities: Option<Vec<String>>,
    pub description: Option<String>,
    pub image_url: Option<String>,
}

/// Admin status change payload
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RoomStatusUpdate {
    pub status: RoomStatus,
}

/// Room listing filters
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RoomQuery {
    pub status: Option<RoomStatus>,
    pub room_type: Option<RoomType>,
}
