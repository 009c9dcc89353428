//! # Craftwise Core
//!
//! Core types for recipe dependency resolution and crafting progress.
//!
//! This crate provides the fundamental building blocks:
//! - [`Recipe`] - How an item is produced from ingredients
//! - [`Project`] - A crafting goal with its per-item ledger projection
//! - [`CraftTreeNode`] - One position of a resolved craft tree
//! - [`CraftError`] - Error types

pub mod error;
pub mod ledger;
pub mod project;
pub mod quantity;
pub mod recipe;
pub mod stream;
pub mod tree;

// Re-exports for convenience
pub use error::{CraftError, Result};
pub use ledger::LedgerSnapshot;
pub use project::{percent, ItemProgress, Project, ProjectBuilder, ProjectDraft, RequiredOverride};
pub use quantity::{
    parse_depth_param, parse_depth_value, parse_quantity, parse_quantity_param, parse_quantity_value,
};
pub use recipe::{Ingredient, ItemId, Recipe, RecipeDraft, RecipeGraph};
pub use stream::ProgressUpdate;
pub use tree::{CraftTreeNode, ProgressView};

/// Prelude module for common imports
pub mod prelude {
    pub use crate::error::{CraftError, Result};
    pub use crate::ledger::LedgerSnapshot;
    pub use crate::project::{ItemProgress, Project, ProjectDraft};
    pub use crate::recipe::{Ingredient, ItemId, Recipe, RecipeDraft, RecipeGraph};
    pub use crate::stream::ProgressUpdate;
    pub use crate::tree::{CraftTreeNode, ProgressView};
}
