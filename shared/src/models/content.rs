//! Gallery, Review and Contact Models

use serde::{Deserialize, Serialize};
use validator::Validate;

pub const MIN_RATING: f64 = 1.0;
pub const MAX_RATING: f64 = 5.0;

/// Gallery photo
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[cfg_attr(feature = "db", derive(sqlx::FromRow))]
pub struct Gallery {
    pub id: i64,
    pub title: String,
    pub category: String,
    pub image_url: String,
    pub created_at: i64,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct GalleryQuery {
    pub category: Option<String>,
}

/// Room review
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[cfg_attr(feature = "db", derive(sqlx::FromRow))]
pub struct Review {
    pub id: i64,
    pub user_id: i64,
    pub room_id: i64,
    pub rating: f64,
    pub comment: String,
    pub created_at: i64,
}

/// Review with author and room names
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "db", derive(sqlx::FromRow))]
pub struct ReviewDetail {
    #[serde(flatten)]
    #[cfg_attr(feature = "db", sqlx(flatten))]
    pub review: Review,
    pub username: String,
    pub reviewer_name: Option<String>,
    pub room_name: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct ReviewCreate {
    pub room_id: i64,
    pub rating: f64,
    #[validate(length(max = 1000))]
    #[serde(default)]
    pub comment: String,
}

impl ReviewCreate {
    pub fn rating_in_range(&self) -> bool {
        (MIN_RATING..=MAX_RATING).contains(&self.rating)
    }
}

/// Contact form payload
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct ContactRequest {
    #[validate(length(min = 1, max = 100))]
    pub name: String,
    #[validate(email)]
    pub email: String,
    #[validate(length(max = 30))]
    pub phone: Option<String>,
    #[validate(length(min = 1, max = 2000))]
    pub message: String,
}
