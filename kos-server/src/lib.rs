//! kos-server: backend for a boarding-house (kos) rental site
//!
//! Rooms, bookings with deposit/installment payments, Midtrans Snap
//! checkout, payment reminders, tenant profiles, gallery and reviews,
//! plus realtime notifications over WebSocket.

pub mod api;
pub mod auth;
pub mod config;
pub mod db;
pub mod email;
pub mod error;
pub mod logger;
pub mod midtrans;
pub mod notify;
pub mod scheduler;
pub mod services;
pub mod state;
pub mod uploads;

pub use config::Config;
pub use error::{BoxError, ServiceError, ServiceResult};
pub use state::AppState;
