//! Data models
//!
//! Shared between kos-server and kos-client (via API).
//! DB row types use `#[cfg_attr(feature = "db", derive(sqlx::FromRow))]`.
//! All IDs are `i64` (SQLite INTEGER PRIMARY KEY).

pub mod booking;
pub mod content;
pub mod dashboard;
pub mod notification;
pub mod payment;
pub mod room;
pub mod tenant;
pub mod user;

// Re-exports
pub use booking::*;
pub use content::*;
pub use dashboard::*;
pub use notification::*;
pub use payment::*;
pub use room::*;
pub use tenant::*;
pub use user::*;
