//! # Craftwise SDK
//!
//! Client SDK for interacting with Craftwise nodes.

pub mod client;
pub mod stream;

pub use client::{CraftClient, Projects, Recipes};
pub use stream::ProgressStream;

/// Prelude module for common imports.
pub mod prelude {
    pub use crate::client::CraftClient;
    pub use crate::stream::ProgressStream;
    pub use craftwise_core::prelude::*;
}
