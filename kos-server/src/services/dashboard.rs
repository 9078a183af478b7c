//! Admin dashboard aggregates

use std::collections::HashMap;

use chrono::{Datelike, Months, NaiveDate};
use shared::models::{
    AGE_GROUPS, DashboardStats, DemographicSlice, MonthlyRevenue, PaymentStatus, ProfileLevel,
    Room, RoomStatus, RoomType, RoomTypeStats, age_group,
};
use shared::util::age_on;
use sqlx::SqlitePool;

use crate::db;
use crate::error::ServiceResult;

const REVENUE_MONTHS: u32 = 6;
const RECENT_CHECKOUTS: i64 = 5;

pub async fn get_stats(pool: &SqlitePool, today: NaiveDate) -> ServiceResult<DashboardStats> {
    let (total_revenue, _) = db::payments::totals_by_status(pool, PaymentStatus::Confirmed).await?;
    let (pending_revenue, pending_payments) =
        db::payments::totals_by_status(pool, PaymentStatus::Pending).await?;
    let (_, rejected_payments) = db::payments::totals_by_status(pool, PaymentStatus::Rejected).await?;

    let rooms = db::rooms::find_all(pool).await?;
    let count_status = |status: RoomStatus| rooms.iter().filter(|r| r.status == status).count() as i64;

    let months = month_labels(today, REVENUE_MONTHS);
    let since = months
        .first()
        .and_then(|(first, _)| first.and_hms_opt(0, 0, 0))
        .map(|dt| dt.and_utc().timestamp_millis())
        .unwrap_or_default();
    let revenue_by_month: HashMap<String, f64> =
        db::payments::monthly_confirmed(pool, since).await?.into_iter().collect();
    let monthly_revenue = months
        .into_iter()
        .map(|(_, month)| MonthlyRevenue {
            revenue: revenue_by_month.get(&month).copied().unwrap_or(0.0),
            month,
        })
        .collect();

    let revenue_by_type: HashMap<RoomType, f64> =
        db::payments::confirmed_by_room_type(pool).await?.into_iter().collect();

    let birth_dates = db::tenants::tenant_birth_dates(pool).await?;

    Ok(DashboardStats {
        total_revenue,
        pending_revenue,
        pending_payments,
        rejected_payments,
        available_rooms: count_status(RoomStatus::Available),
        occupied_rooms: count_status(RoomStatus::Occupied),
        maintenance_rooms: count_status(RoomStatus::Maintenance),
        total_rooms: rooms.len() as i64,
        active_tenants: db::tenants::count_by_level(pool, ProfileLevel::Tenant).await?,
        potential_revenue: db::rooms::total_price(pool).await?,
        monthly_revenue,
        room_types: room_type_breakdown(&rooms, &revenue_by_type),
        demographics: demographics(&birth_dates, today),
        recent_checkouts: db::bookings::recent_cancelled(pool, RECENT_CHECKOUTS).await?,
    })
}

/// First day and `YYYY-MM` label of the last `count` months, oldest first
fn month_labels(today: NaiveDate, count: u32) -> Vec<(NaiveDate, String)> {
    let Some(this_month) = today.with_day(1) else {
        return Vec::new();
    };
    (0..count)
        .rev()
        .filter_map(|back| this_month.checked_sub_months(Months::new(back)))
        .map(|first| (first, first.format("%Y-%m").to_string()))
        .collect()
}

fn room_type_breakdown(rooms: &[Room], revenue: &HashMap<RoomType, f64>) -> Vec<RoomTypeStats> {
    RoomType::ALL
        .iter()
        .map(|room_type| {
            let of_type = rooms.iter().filter(|r| r.room_type == *room_type);
            RoomTypeStats {
                room_type: *room_type,
                count: of_type.clone().count() as i64,
                occupied: of_type.filter(|r| r.status == RoomStatus::Occupied).count() as i64,
                revenue: revenue.get(room_type).copied().unwrap_or(0.0),
            }
        })
        .collect()
}

fn demographics(birth_dates: &[NaiveDate], today: NaiveDate) -> Vec<DemographicSlice> {
    let mut counts = [0i64; AGE_GROUPS.len()];
    for birth in birth_dates {
        counts[age_group(age_on(*birth, today))] += 1;
    }
    AGE_GROUPS
        .iter()
        .zip(counts)
        .map(|((label, _, _, color), count)| DemographicSlice {
            label: (*label).to_string(),
            count,
            color: (*color).to_string(),
        })
        .collect()
}
