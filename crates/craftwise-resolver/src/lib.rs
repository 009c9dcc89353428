//! # Craftwise Resolver
//!
//! Expands recipes into depth-bounded craft trees and fuses them with a
//! possession ledger.

pub mod aggregate;
pub mod expand;
pub mod path;
pub mod resolver;
pub mod search;

#[cfg(test)]
mod proptest_properties;

pub use aggregate::{annotate, Requirements};
pub use path::{locate, plan_node_edit, NodeEdit};
pub use resolver::{RecipeLookup, ResolverConfig, TreeResolver};
pub use search::{search_recipes, SearchMatch};
