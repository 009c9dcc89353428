//! Addressing tree positions by path.

use craftwise_core::{CraftError, CraftTreeNode, ItemId, Result};

/// Find the node at `path` or fail with `NodeNotFound`.
pub fn locate<'t>(tree: &'t CraftTreeNode, path: &[ItemId]) -> Result<&'t CraftTreeNode> {
    tree.find(path).ok_or_else(|| CraftError::NodeNotFound {
        path: path.to_vec(),
    })
}

/// A possession edit resolved against a concrete tree position.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NodeEdit {
    /// Item whose ledger entry is written.
    pub item_id: ItemId,

    /// Quantity the caller asked for.
    pub requested: u64,

    /// Quantity actually stored, clamped to `[0, node.quantity]`.
    pub stored: u64,
}

impl NodeEdit {
    pub fn was_clamped(&self) -> bool {
        self.requested != self.stored
    }
}

/// Resolve `path` and clamp `requested` to the node's required quantity.
pub fn plan_node_edit(tree: &CraftTreeNode, path: &[ItemId], requested: u64) -> Result<NodeEdit> {
    let node = locate(tree, path)?;
    Ok(NodeEdit {
        item_id: node.item_id.clone(),
        requested,
        stored: requested.min(node.quantity),
    })
}

/// Render a path as `a/b/c` for logs.
pub fn display_path(path: &[ItemId]) -> String {
    path.iter().map(ItemId::as_str).collect::<Vec<_>>().join("/")
}

#[cfg(test)]
mod tests {
    use craftwise_core::{Recipe, RecipeGraph};

    use super::*;
    use crate::resolver::TreeResolver;

    fn tree() -> CraftTreeNode {
        let graph = RecipeGraph::new([
            Recipe::base("plank", "Plank"),
            Recipe::crafted("stick", "Stick", 4).with_ingredient("plank", 2),
        ]);
        TreeResolver::new()
            .resolve(&graph, &"stick".into(), 10, Some(5))
            .unwrap()
    }

    #[test]
    fn test_edit_is_clamped_to_node_quantity() {
        let path = vec![ItemId::from("stick"), ItemId::from("plank")];
        let edit = plan_node_edit(&tree(), &path, 99).unwrap();
        assert_eq!(edit.item_id.as_str(), "plank");
        assert_eq!(edit.stored, 5);
        assert!(edit.was_clamped());

        let exact = plan_node_edit(&tree(), &path, 4).unwrap();
        assert!(!exact.was_clamped());
    }

    #[test]
    fn test_stale_path() {
        let path = vec![ItemId::from("stick"), ItemId::from("log")];
        let err = plan_node_edit(&tree(), &path, 1).unwrap_err();
        assert_eq!(err, CraftError::NodeNotFound { path });
    }

    #[test]
    fn test_display_path() {
        let path = vec![ItemId::from("stick"), ItemId::from("plank")];
        assert_eq!(display_path(&path), "stick/plank");
    }
}
