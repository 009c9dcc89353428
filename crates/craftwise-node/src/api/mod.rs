//! HTTP and WebSocket handlers.

pub mod error;
pub mod health;
pub mod projects;
pub mod recipes;
pub mod ws;

pub use error::{ApiError, ApiResult};
