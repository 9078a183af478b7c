//! Kos Client - HTTP client and local state store for kos-server
//!
//! [`KosClient`] talks to the REST API; [`AppStore`] keeps rooms, bookings
//! and the signed-in user in memory and persists them to a JSON file.

pub mod config;
pub mod error;
pub mod http;
pub mod storage;
pub mod store;

pub use config::ClientConfig;
pub use error::{ClientError, ClientResult};
pub use http::KosClient;
pub use storage::LocalStorage;
pub use store::{AppStore, BookingPatch, ClientBooking, ExtendBooking, StoreState};

// Re-export shared types for convenience
pub use shared::error::{ApiResponse, ErrorCode};
pub use shared::models::{LoginResponse, UserInfo};
