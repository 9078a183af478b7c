//! Authentication
//!
//! - [`JwtService`]: access/refresh tokens
//! - [`CurrentUser`]: caller identity from a validated access token
//! - [`require_auth`] / [`require_admin`]: route middleware
//! - [`rate_limit`]: per-IP limits on credential routes

pub mod jwt;
pub mod middleware;
pub mod password;
pub mod rate_limit;

pub use jwt::{Claims, CurrentUser, JwtConfig, JwtError, JwtService};
pub use middleware::{authenticate, require_admin, require_auth};
pub use password::{hash_password, verify_password};
pub use rate_limit::RateLimiter;
