//! Error types for Craftwise.

use thiserror::Error;
use uuid::Uuid;

use crate::recipe::ItemId;

/// Main error type for Craftwise operations.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum CraftError {
    /// A recipe referenced by id does not exist.
    #[error("Recipe not found: {id}")]
    RecipeNotFound { id: ItemId },

    /// A project referenced by id does not exist.
    #[error("Project not found: {id}")]
    ProjectNotFound { id: Uuid },

    /// The recipe graph requires an item from itself, directly or transitively.
    #[error("Cycle detected in recipe graph: {}", format_chain(.cycle))]
    CycleDetected { cycle: Vec<ItemId> },

    /// A requested quantity was negative or not an integer.
    #[error("Invalid quantity: {message}")]
    InvalidQuantity { message: String },

    /// A tree path does not resolve against the current craft tree.
    #[error("Node not found at path {}", format_chain(.path))]
    NodeNotFound { path: Vec<ItemId> },

    /// A compare-and-swap write lost against a concurrent writer.
    #[error("Ledger conflict on project {project_id}: expected version {expected}, found {actual}")]
    Conflict {
        project_id: Uuid,
        expected: u64,
        actual: u64,
    },

    /// The expanded tree would exceed the configured node limit.
    #[error("Craft tree exceeds {limit} nodes")]
    TreeTooLarge { limit: usize },

    /// Quantity arithmetic overflowed while propagating requirements.
    #[error("Quantity overflow while expanding {item_id}")]
    QuantityOverflow { item_id: ItemId },

    /// A request was structurally invalid.
    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    /// Storage backend error.
    #[error("Store error: {message}")]
    StoreError { message: String },

    /// Serialization/deserialization error.
    #[error("Serialization error: {0}")]
    Serialization(String),

    /// Could not reach a Craftwise node.
    #[error("Connection error: {0}")]
    Connection(String),

    /// A Craftwise node answered with an error status.
    #[error("API error ({status}): {message}")]
    Api { status: u16, message: String },
}

impl CraftError {
    /// Shorthand for an [`CraftError::InvalidQuantity`].
    pub fn invalid_quantity(message: impl Into<String>) -> Self {
        CraftError::InvalidQuantity {
            message: message.into(),
        }
    }

    /// Returns true if the error means the referenced resource does not exist.
    pub fn is_not_found(&self) -> bool {
        matches!(
            self,
            CraftError::RecipeNotFound { .. } | CraftError::ProjectNotFound { .. }
        )
    }

    /// Returns true if the caller should re-fetch state and try again.
    pub fn is_stale(&self) -> bool {
        matches!(
            self,
            CraftError::NodeNotFound { .. } | CraftError::Conflict { .. }
        )
    }

    /// Stable machine-readable code for this error.
    pub fn code(&self) -> &'static str {
        match self {
            CraftError::RecipeNotFound { .. } => "recipe_not_found",
            CraftError::ProjectNotFound { .. } => "project_not_found",
            CraftError::CycleDetected { .. } => "cycle_detected",
            CraftError::InvalidQuantity { .. } => "invalid_quantity",
            CraftError::NodeNotFound { .. } => "node_not_found",
            CraftError::Conflict { .. } => "conflict",
            CraftError::TreeTooLarge { .. } => "tree_too_large",
            CraftError::QuantityOverflow { .. } => "quantity_overflow",
            CraftError::InvalidRequest(_) => "invalid_request",
            CraftError::StoreError { .. } => "store_error",
            CraftError::Serialization(_) => "serialization_error",
            CraftError::Connection(_) => "connection_error",
            CraftError::Api { .. } => "api_error",
        }
    }
}

fn format_chain(ids: &[ItemId]) -> String {
    ids.iter()
        .map(ItemId::as_str)
        .collect::<Vec<_>>()
        .join(" -> ")
}

/// Convenience Result type for Craftwise operations.
pub type Result<T> = std::result::Result<T, CraftError>;

impl From<serde_json::Error> for CraftError {
    fn from(err: serde_json::Error) -> Self {
        CraftError::Serialization(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cycle_message_lists_chain() {
        let err = CraftError::CycleDetected {
            cycle: vec!["a".into(), "b".into(), "a".into()],
        };
        assert_eq!(err.to_string(), "Cycle detected in recipe graph: a -> b -> a");
    }

    #[test]
    fn test_classification() {
        assert!(CraftError::RecipeNotFound { id: "x".into() }.is_not_found());
        assert!(CraftError::NodeNotFound { path: vec![] }.is_stale());
        assert!(!CraftError::invalid_quantity("neg").is_stale());
        assert_eq!(CraftError::TreeTooLarge { limit: 3 }.code(), "tree_too_large");
    }
}
