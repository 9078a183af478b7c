//! Shared types for the kos platform
//!
//! Error codes and the API envelope, domain models, money arithmetic and
//! small time helpers used by both the server and the client.

pub mod error;
pub mod models;
pub mod money;
pub mod response;
pub mod util;

// Re-exports
pub use error::{ApiResponse, AppError, ErrorCode};
pub use response::{PageQuery, Paginated, Pagination};
pub use serde::{Deserialize, Serialize};
