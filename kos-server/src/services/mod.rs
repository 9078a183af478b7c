//! Business logic
//!
//! Services take `&SqlitePool` when they only touch the database and
//! `&AppState` when they also send email, push notifications or store files.

pub mod auth;
pub mod booking;
pub mod content;
pub mod dashboard;
pub mod payment;
pub mod profile;
pub mod reminder;
pub mod room;
pub mod tenant;
