//! Room catalogue and the derived room status

use shared::error::{AppError, ErrorCode};
use shared::models::{RoomCreate, RoomListing, RoomQuery, RoomStatus, RoomUpdate};
use sqlx::{SqliteConnection, SqlitePool};
use validator::Validate;

use crate::db;
use crate::error::ServiceResult;

pub async fn list_rooms(pool: &SqlitePool, query: &RoomQuery) -> ServiceResult<Vec<RoomListing>> {
    Ok(db::rooms::list(pool, query.status, query.room_type).await?)
}

pub async fn get_room(pool: &SqlitePool, id: i64) -> ServiceResult<RoomListing> {
    db::rooms::find_listing(pool, id)
        .await?
        .ok_or_else(|| AppError::new(ErrorCode::RoomNotFound).into())
}

pub async fn create_room(pool: &SqlitePool, data: &RoomCreate) -> ServiceResult<RoomListing> {
    data.validate().map_err(AppError::from)?;
    let id = db::rooms::create(pool, data)
        .await
        .map_err(|e| db::unique_violation(e, "Room name"))?;
    tracing::info!(room_id = id, name = %data.name, "Room created");
    get_room(pool, id).await
}

pub async fn update_room(pool: &SqlitePool, id: i64, data: &RoomUpdate) -> ServiceResult<RoomListing> {
    data.validate().map_err(AppError::from)?;
    let updated = db::rooms::update(pool, id, data)
        .await
        .map_err(|e| db::unique_violation(e, "Room name"))?;
    if !updated {
        return Err(AppError::new(ErrorCode::RoomNotFound).into());
    }
    get_room(pool, id).await
}

/// Rooms with booking history cannot be deleted
pub async fn delete_room(pool: &SqlitePool, id: i64) -> ServiceResult<()> {
    if db::bookings::count_for_room(pool, id).await? > 0 {
        return Err(AppError::new(ErrorCode::RoomHasBookings).into());
    }
    if !db::rooms::delete(pool, id).await? {
        return Err(AppError::new(ErrorCode::RoomNotFound).into());
    }
    tracing::info!(room_id = id, "Room deleted");
    Ok(())
}

/// Admin status change: only `Available` and `Maintenance` can be set.
pub async fn update_room_status(pool: &SqlitePool, id: i64, status: RoomStatus) -> ServiceResult<RoomListing> {
    if !status.is_assignable() {
        return Err(AppError::with_message(
            ErrorCode::RoomStatusDerived,
            format!("{} is derived from bookings and cannot be set", status.as_str()),
        )
        .into());
    }

    let mut tx = pool.begin().await?;
    db::rooms::find_by_id(&mut tx, id)
        .await?
        .ok_or_else(|| AppError::new(ErrorCode::RoomNotFound))?;

    match status {
        RoomStatus::Maintenance => {
            let (active, _) = db::bookings::room_occupancy(&mut tx, id).await?;
            if active > 0 {
                return Err(AppError::new(ErrorCode::RoomOccupied).into());
            }
            db::rooms::set_status(&mut tx, id, RoomStatus::Maintenance).await?;
        }
        _ => {
            db::rooms::set_status(&mut tx, id, RoomStatus::Available).await?;
            sync_room_status(&mut tx, id).await?;
        }
    }
    tx.commit().await?;

    tracing::info!(room_id = id, status = status.as_str(), "Room status updated");
    get_room(pool, id).await
}

/// Status implied by the bookings of a room
pub fn derive_status(current: RoomStatus, active_bookings: i64, pending_bookings: i64) -> RoomStatus {
    if current == RoomStatus::Maintenance {
        RoomStatus::Maintenance
    } else if active_bookings > 0 {
        RoomStatus::Occupied
    } else if pending_bookings > 0 {
        RoomStatus::Reserved
    } else {
        RoomStatus::Available
    }
}

/// Recompute and store a room's status. Call inside the transaction that
/// changed the room's bookings.
pub async fn sync_room_status(conn: &mut SqliteConnection, room_id: i64) -> ServiceResult<RoomStatus> {
    let room = db::rooms::find_by_id(conn, room_id)
        .await?
        .ok_or_else(|| AppError::new(ErrorCode::RoomNotFound))?;
    let (active, pending) = db::bookings::room_occupancy(conn, room_id).await?;
    let status = derive_status(room.status, active, pending);
    if status != room.status {
        db::rooms::set_status(conn, room_id, status).await?;
        tracing::debug!(room_id, from = room.status.as_str(), to = status.as_str(), "Room status synced");
    }
    Ok(status)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_derive_status() {
        use RoomStatus::*;
        assert_eq!(derive_status(Maintenance, 1, 1), Maintenance);
        assert_eq!(derive_status(Available, 1, 1), Occupied);
        assert_eq!(derive_status(Reserved, 0, 1), Reserved);
        assert_eq!(derive_status(Occupied, 0, 0), Available);
        assert_eq!(derive_status(Reserved, 0, 0), Available);
    }
}
