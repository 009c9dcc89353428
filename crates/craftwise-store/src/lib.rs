//! # Craftwise Store
//!
//! Versioned storage for recipes, projects and possession ledgers, plus
//! change subscriptions for live progress views.

pub mod projects;
pub mod recipes;
pub mod subscription;

pub use projects::{InMemoryProjectStore, ProjectStore};
pub use recipes::{InMemoryRecipeStore, RecipeStore};
pub use subscription::{ChangeKind, ProgressEvent, ProgressSubscription, SubscriptionFilter, SubscriptionManager};
