//! Local application store
//!
//! Rooms, bookings and the signed-in user, kept in memory behind a
//! `parking_lot::RwLock`. Every mutation is written to [`LocalStorage`]
//! while the write lock is held, so the file always reflects the latest
//! mutation order.

use std::sync::Arc;

use chrono::NaiveDate;
use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use shared::models::{BookingDetail, BookingStatus, Room, RoomStatus, UserInfo};

use crate::{ClientConfig, ClientResult, KosClient, LocalStorage};

/// Booking as the client displays it
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ClientBooking {
    pub id: i64,
    pub user_id: i64,
    pub room_id: i64,
    pub room_name: String,
    pub room_image: Option<String>,
    pub move_in_date: NaiveDate,
    pub move_out_date: NaiveDate,
    pub monthly_rent: f64,
    pub total_paid: f64,
    pub duration_months: i64,
    pub status: BookingStatus,
    pub created_at: i64,
    pub notes: Option<String>,
}

impl From<BookingDetail> for ClientBooking {
    fn from(detail: BookingDetail) -> Self {
        let booking = detail.booking;
        Self {
            id: booking.id,
            user_id: booking.user_id,
            room_id: booking.room_id,
            room_name: detail.room.name,
            room_image: detail.room.image_url,
            move_in_date: booking.start_date,
            move_out_date: detail.end_date,
            monthly_rent: booking.monthly_rent,
            total_paid: booking.total_paid,
            duration_months: booking.duration_months,
            status: booking.status,
            created_at: booking.created_at,
            notes: booking.notes,
        }
    }
}

/// Partial booking update; `None` fields are left untouched
#[derive(Debug, Clone, Default)]
pub struct BookingPatch {
    pub move_in_date: Option<NaiveDate>,
    pub move_out_date: Option<NaiveDate>,
    pub total_paid: Option<f64>,
    pub duration_months: Option<i64>,
    pub status: Option<BookingStatus>,
    pub notes: Option<String>,
}

#[derive(Debug, Clone)]
pub struct ExtendBooking {
    pub booking_id: i64,
    pub additional_months: i64,
    pub new_end_date: NaiveDate,
    pub additional_cost: f64,
}

/// Persisted store contents
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct StoreState {
    pub rooms: Vec<Room>,
    pub bookings: Vec<ClientBooking>,
    pub current_user: Option<UserInfo>,
}

#[derive(Debug, Clone)]
pub struct AppStore {
    state: Arc<RwLock<StoreState>>,
    storage: Option<LocalStorage>,
}

impl AppStore {
    /// Store without a backing file
    pub fn in_memory() -> Self {
        Self {
            state: Arc::new(RwLock::new(StoreState::default())),
            storage: None,
        }
    }

    /// Store backed by `storage`, restoring whatever was saved before
    pub fn open(storage: LocalStorage) -> ClientResult<Self> {
        let state = storage.load::<StoreState>()?.unwrap_or_default();
        tracing::debug!(
            path = %storage.path().display(),
            rooms = state.rooms.len(),
            bookings = state.bookings.len(),
            "Client store loaded"
        );
        Ok(Self {
            state: Arc::new(RwLock::new(state)),
            storage: Some(storage),
        })
    }

    /// File-backed when `storage_path` is set, in-memory otherwise
    pub fn from_config(config: &ClientConfig) -> ClientResult<Self> {
        match &config.storage_path {
            Some(path) => Self::open(LocalStorage::new(path)),
            None => Ok(Self::in_memory()),
        }
    }

    /// Apply `f` to a copy under the write lock.
    ///
    /// The copy replaces the state only when `f` reports a change and the
    /// save succeeded, so memory never runs ahead of the file.
    fn mutate(&self, f: impl FnOnce(&mut StoreState) -> bool) -> ClientResult<bool> {
        let mut state = self.state.write();
        let mut next = state.clone();
        if !f(&mut next) {
            return Ok(false);
        }
        if let Some(storage) = &self.storage {
            storage.save(&next)?;
        }
        *state = next;
        Ok(true)
    }

    // ========== Rooms ==========

    pub fn get_room_by_id(&self, id: i64) -> Option<Room> {
        self.state.read().rooms.iter().find(|r| r.id == id).cloned()
    }

    pub fn get_all_rooms(&self) -> Vec<Room> {
        self.state.read().rooms.clone()
    }

    pub fn update_room_status(&self, id: i64, status: RoomStatus) -> ClientResult<bool> {
        self.mutate(|state| match state.rooms.iter_mut().find(|r| r.id == id) {
            Some(room) => {
                room.status = status;
                true
            }
            None => false,
        })
    }

    // ========== Bookings ==========

    /// Record a booking and mark its room Occupied
    pub fn add_booking(&self, booking: ClientBooking) -> ClientResult<()> {
        self.mutate(|state| {
            if let Some(room) = state.rooms.iter_mut().find(|r| r.id == booking.room_id) {
                room.status = RoomStatus::Occupied;
            }
            state.bookings.push(booking);
            true
        })?;
        Ok(())
    }

    pub fn update_booking(&self, id: i64, patch: BookingPatch) -> ClientResult<bool> {
        self.mutate(|state| {
            let Some(booking) = state.bookings.iter_mut().find(|b| b.id == id) else {
                return false;
            };
            if let Some(date) = patch.move_in_date {
                booking.move_in_date = date;
            }
            if let Some(date) = patch.move_out_date {
                booking.move_out_date = date;
            }
            if let Some(total) = patch.total_paid {
                booking.total_paid = total;
            }
            if let Some(months) = patch.duration_months {
                booking.duration_months = months;
            }
            if let Some(status) = patch.status {
                booking.status = status;
            }
            if patch.notes.is_some() {
                booking.notes = patch.notes;
            }
            true
        })
    }

    pub fn get_bookings_by_user_id(&self, user_id: i64) -> Vec<ClientBooking> {
        self.state
            .read()
            .bookings
            .iter()
            .filter(|b| b.user_id == user_id)
            .cloned()
            .collect()
    }

    pub fn get_bookings_by_status(&self, status: BookingStatus) -> Vec<ClientBooking> {
        self.state
            .read()
            .bookings
            .iter()
            .filter(|b| b.status == status)
            .cloned()
            .collect()
    }

    pub fn get_all_bookings(&self) -> Vec<ClientBooking> {
        self.state.read().bookings.clone()
    }

    /// Cancel a booking and free its room
    pub fn cancel_booking(&self, id: i64) -> ClientResult<bool> {
        self.mutate(|state| {
            let Some(booking) = state.bookings.iter_mut().find(|b| b.id == id) else {
                return false;
            };
            booking.status = BookingStatus::Cancelled;
            let room_id = booking.room_id;
            if let Some(room) = state.rooms.iter_mut().find(|r| r.id == room_id) {
                room.status = RoomStatus::Available;
            }
            true
        })
    }

    pub fn extend_booking(&self, extend: &ExtendBooking) -> ClientResult<bool> {
        self.mutate(|state| {
            let Some(booking) = state.bookings.iter_mut().find(|b| b.id == extend.booking_id) else {
                return false;
            };
            booking.move_out_date = extend.new_end_date;
            booking.duration_months += extend.additional_months;
            booking.total_paid += extend.additional_cost;
            booking.status = BookingStatus::Active;
            true
        })
    }

    // ========== Current user ==========

    pub fn set_current_user(&self, user: Option<UserInfo>) -> ClientResult<()> {
        self.mutate(|state| {
            state.current_user = user;
            true
        })?;
        Ok(())
    }

    pub fn current_user(&self) -> Option<UserInfo> {
        self.state.read().current_user.clone()
    }

    // ========== Stats ==========

    pub fn get_total_bookings(&self) -> usize {
        self.state.read().bookings.len()
    }

    /// Sum of `total_paid` over all bookings
    pub fn get_total_revenue(&self) -> f64 {
        self.state.read().bookings.iter().map(|b| b.total_paid).sum()
    }

    /// Confirmed + Active
    pub fn get_active_bookings(&self) -> usize {
        self.state
            .read()
            .bookings
            .iter()
            .filter(|b| b.status.is_active_lease())
            .count()
    }

    pub fn get_occupied_rooms(&self) -> usize {
        self.state
            .read()
            .rooms
            .iter()
            .filter(|r| r.status == RoomStatus::Occupied)
            .count()
    }

    // ========== Sync ==========

    /// Replace rooms and bookings with the server's view.
    /// Bookings are only fetched when the client holds a token.
    pub async fn sync_from_server(&self, client: &KosClient) -> ClientResult<()> {
        let rooms: Vec<Room> = client
            .list_rooms(None)
            .await?
            .into_iter()
            .map(|listing| listing.room)
            .collect();
        let bookings: Option<Vec<ClientBooking>> = match client.token() {
            Some(_) => Some(
                client
                    .my_bookings()
                    .await?
                    .into_iter()
                    .map(ClientBooking::from)
                    .collect(),
            ),
            None => None,
        };

        let (room_count, booking_count) = (rooms.len(), bookings.as_ref().map(Vec::len));
        self.mutate(|state| {
            state.rooms = rooms;
            if let Some(bookings) = bookings {
                state.bookings = bookings;
            }
            true
        })?;
        tracing::info!(rooms = room_count, bookings = ?booking_count, "Client store synced");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use shared::models::{RoomType, UserRole};

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn room(id: i64, status: RoomStatus) -> Room {
        Room {
            id,
            name: format!("A{id}"),
            room_type: RoomType::Standard,
            price: 1_000_000.0,
            status,
            capacity: 1,
            floor: 1,
            size: "3x4m".into(),
            bedrooms: 1,
            bathrooms: 1,
            facilities: vec!["WiFi".into()],
            description: String::new(),
            image_url: None,
            created_at: 0,
            updated_at: 0,
        }
    }

    fn booking(id: i64, user_id: i64, room_id: i64, status: BookingStatus, total_paid: f64) -> ClientBooking {
        ClientBooking {
            id,
            user_id,
            room_id,
            room_name: format!("A{room_id}"),
            room_image: None,
            move_in_date: date(2030, 1, 1),
            move_out_date: date(2030, 7, 1),
            monthly_rent: 1_000_000.0,
            total_paid,
            duration_months: 6,
            status,
            created_at: 0,
            notes: None,
        }
    }

    fn store_with_rooms() -> AppStore {
        let store = AppStore::in_memory();
        store.mutate(|state| {
            state.rooms = vec![room(1, RoomStatus::Available), room(2, RoomStatus::Available)];
            true
        })
        .unwrap();
        store
    }

    #[test]
    fn test_add_and_cancel_booking_updates_room() {
        let store = store_with_rooms();

        store.add_booking(booking(10, 7, 1, BookingStatus::Pending, 0.0)).unwrap();
        assert_eq!(store.get_room_by_id(1).unwrap().status, RoomStatus::Occupied);
        assert_eq!(store.get_occupied_rooms(), 1);

        assert!(store.cancel_booking(10).unwrap());
        assert_eq!(store.get_bookings_by_status(BookingStatus::Cancelled).len(), 1);
        assert_eq!(store.get_room_by_id(1).unwrap().status, RoomStatus::Available);

        assert!(!store.cancel_booking(99).unwrap());
    }

    #[test]
    fn test_booking_for_unknown_room_is_still_recorded() {
        let store = store_with_rooms();
        store.add_booking(booking(10, 7, 42, BookingStatus::Pending, 0.0)).unwrap();
        assert_eq!(store.get_total_bookings(), 1);
        assert_eq!(store.get_occupied_rooms(), 0);
    }

    #[test]
    fn test_update_booking_merges_patch() {
        let store = store_with_rooms();
        store.add_booking(booking(10, 7, 1, BookingStatus::Pending, 0.0)).unwrap();

        let changed = store
            .update_booking(
                10,
                BookingPatch {
                    status: Some(BookingStatus::Confirmed),
                    notes: Some("Bawa kasur sendiri".into()),
                    ..Default::default()
                },
            )
            .unwrap();
        assert!(changed);

        let updated = &store.get_bookings_by_user_id(7)[0];
        assert_eq!(updated.status, BookingStatus::Confirmed);
        assert_eq!(updated.notes.as_deref(), Some("Bawa kasur sendiri"));
        assert_eq!(updated.move_out_date, date(2030, 7, 1));

        assert!(!store.update_booking(99, BookingPatch::default()).unwrap());
    }

    #[test]
    fn test_extend_booking() {
        let store = store_with_rooms();
        store.add_booking(booking(10, 7, 1, BookingStatus::Confirmed, 6_000_000.0)).unwrap();

        let extended = store
            .extend_booking(&ExtendBooking {
                booking_id: 10,
                additional_months: 3,
                new_end_date: date(2030, 10, 1),
                additional_cost: 3_000_000.0,
            })
            .unwrap();
        assert!(extended);

        let booking = &store.get_all_bookings()[0];
        assert_eq!(booking.move_out_date, date(2030, 10, 1));
        assert_eq!(booking.duration_months, 9);
        assert_eq!(booking.total_paid, 9_000_000.0);
        assert_eq!(booking.status, BookingStatus::Active);
    }

    #[test]
    fn test_stats() {
        let store = store_with_rooms();
        store.add_booking(booking(1, 7, 1, BookingStatus::Active, 3_000_000.0)).unwrap();
        store.add_booking(booking(2, 8, 2, BookingStatus::Confirmed, 1_500_000.0)).unwrap();
        store.add_booking(booking(3, 9, 2, BookingStatus::Pending, 0.0)).unwrap();

        assert_eq!(store.get_total_bookings(), 3);
        assert_eq!(store.get_total_revenue(), 4_500_000.0);
        assert_eq!(store.get_active_bookings(), 2);
        assert_eq!(store.get_bookings_by_user_id(8).len(), 1);
    }

    #[test]
    fn test_room_status_and_current_user() {
        let store = store_with_rooms();
        assert!(store.update_room_status(2, RoomStatus::Maintenance).unwrap());
        assert!(!store.update_room_status(5, RoomStatus::Maintenance).unwrap());
        assert_eq!(store.get_room_by_id(2).unwrap().status, RoomStatus::Maintenance);
        assert_eq!(store.get_all_rooms().len(), 2);

        assert!(store.current_user().is_none());
        store
            .set_current_user(Some(UserInfo {
                id: 7,
                username: "budi".into(),
                role: UserRole::Tenant,
            }))
            .unwrap();
        assert_eq!(store.current_user().unwrap().username, "budi");
        store.set_current_user(None).unwrap();
        assert!(store.current_user().is_none());
    }

    #[test]
    fn test_failed_save_leaves_memory_untouched() {
        let dir = tempfile::tempdir().unwrap();
        let store = AppStore::open(LocalStorage::new(dir.path().join("store.json"))).unwrap();
        store
            .mutate(|state| {
                state.rooms = vec![room(1, RoomStatus::Available)];
                true
            })
            .unwrap();

        // a directory where the temp file goes makes every save fail
        let blocker = dir.path().join("store.json.tmp");
        std::fs::create_dir(&blocker).unwrap();

        assert!(store.update_room_status(1, RoomStatus::Maintenance).is_err());
        assert!(store.add_booking(booking(10, 7, 1, BookingStatus::Pending, 0.0)).is_err());
        assert_eq!(store.get_room_by_id(1).unwrap().status, RoomStatus::Available);
        assert!(store.get_all_bookings().is_empty());

        std::fs::remove_dir(&blocker).unwrap();
        assert!(store.update_room_status(1, RoomStatus::Maintenance).unwrap());
        let reopened = AppStore::open(LocalStorage::new(dir.path().join("store.json"))).unwrap();
        assert_eq!(reopened.get_room_by_id(1).unwrap().status, RoomStatus::Maintenance);
    }
}
