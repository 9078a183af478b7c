//! Dashboard Models

use serde::{Deserialize, Serialize};

use super::room::RoomType;

/// Age buckets shown on the demographics chart: (label, min, max, color)
pub const AGE_GROUPS: [(&str, i32, i32, &str); 4] = [
    ("18-25", 0, 25, "#f59e0b"),
    ("26-35", 26, 35, "#3b82f6"),
    ("36-45", 36, 45, "#10b981"),
    ("45+", 46, i32::MAX, "#8b5cf6"),
];

/// Index into [`AGE_GROUPS`] for an age
pub fn age_group(age: i32) -> usize {
    AGE_GROUPS
        .iter()
        .position(|(_, min, max, _)| (*min..=*max).contains(&age))
        .unwrap_or(0)
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct DashboardStats {
    pub total_revenue: f64,
    pub pending_revenue: f64,
    pub pending_payments: i64,
    pub rejected_payments: i64,
    pub available_rooms: i64,
    pub occupied_rooms: i64,
    pub maintenance_rooms: i64,
    pub total_rooms: i64,
    pub active_tenants: i64,
    /// Sum of all room prices (revenue at full occupancy)
    pub potential_revenue: f64,
    pub monthly_revenue: Vec<MonthlyRevenue>,
    pub room_types: Vec<RoomTypeStats>,
    pub demographics: Vec<DemographicSlice>,
    pub recent_checkouts: Vec<RecentCheckout>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct MonthlyRevenue {
    /// `YYYY-MM`
    pub month: String,
    pub revenue: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct RoomTypeStats {
    pub room_type: RoomType,
    pub count: i64,
    pub occupied: i64,
    pub revenue: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct DemographicSlice {
    pub label: String,
    pub count: i64,
    pub color: String,
}

/// Recently cancelled booking
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[cfg_attr(feature = "db", derive(sqlx::FromRow))]
pub struct RecentCheckout {
    pub booking_id: i64,
    pub room_name: String,
    pub tenant_name: String,
    pub updated_at: i64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_age_group_boundaries() {
        assert_eq!(AGE_GROUPS[age_group(18)].0, "18-25");
        assert_eq!(AGE_GROUPS[age_group(25)].0, "18-25");
        assert_eq!(AGE_GROUPS[age_group(26)].0, "26-35");
        assert_eq!(AGE_GROUPS[age_group(45)].0, "36-45");
        assert_eq!(AGE_GROUPS[age_group(46)].0, "45+");
        assert_eq!(AGE_GROUPS[age_group(80)].3, "#8b5cf6");
    }
}
