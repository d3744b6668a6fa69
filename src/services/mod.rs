pub mod auth;
pub mod metrics;
pub mod redis;

pub use auth::{AuthError, AuthService};
