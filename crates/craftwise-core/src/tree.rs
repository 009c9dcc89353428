//! Craft tree types.
//!
//! A [`CraftTreeNode`] is an ephemeral view: it is rebuilt from the recipe
//! graph, the target quantity and a ledger snapshot on every read and is never
//! persisted.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::project::ItemProgress;
use crate::recipe::{ItemId, Recipe};

/// One position in a resolved craft tree.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CraftTreeNode {
    pub item_id: ItemId,

    pub item_name: String,

    /// Units required at this position.
    pub quantity: u64,

    /// This position's apportioned share of the item's ledger total.
    pub current_quantity: u64,

    /// Completion percentage, 0 to 100.
    pub progress: f64,

    pub is_base: bool,

    /// A craftable recipe cut off by the depth bound.
    #[serde(default)]
    pub truncated: bool,

    pub children: Vec<CraftTreeNode>,
}

impl CraftTreeNode {
    /// Create a childless node for `recipe` requiring `quantity` units.
    pub fn new(recipe: &Recipe, quantity: u64) -> Self {
        Self {
            item_id: recipe.id.clone(),
            item_name: recipe.name.clone(),
            quantity,
            current_quantity: 0,
            progress: if quantity == 0 { 100.0 } else { 0.0 },
            is_base: recipe.is_base,
            truncated: false,
            children: Vec::new(),
        }
    }

    pub fn is_leaf(&self) -> bool {
        self.children.is_empty()
    }

    /// Follow `path` (item ids from this node down) to a descendant.
    ///
    /// The first element must be this node's own item id. Among siblings
    /// sharing an item id, the first one wins.
    pub fn find(&self, path: &[ItemId]) -> Option<&CraftTreeNode> {
        let (head, rest) = path.split_first()?;
        if *head != self.item_id {
            return None;
        }
        rest.iter().try_fold(self, |node, id| {
            node.children.iter().find(|child| child.item_id == *id)
        })
    }

    /// Visit every node in pre-order along with its path from this node.
    pub fn walk<'a, F>(&'a self, mut visit: F)
    where
        F: FnMut(&[ItemId], &'a CraftTreeNode),
    {
        let mut path = Vec::new();
        self.walk_inner(&mut path, &mut visit);
    }

    fn walk_inner<'a, F>(&'a self, path: &mut Vec<ItemId>, visit: &mut F)
    where
        F: FnMut(&[ItemId], &'a CraftTreeNode),
    {
        path.push(self.item_id.clone());
        visit(path, self);
        for child in &self.children {
            child.walk_inner(path, visit);
        }
        path.pop();
    }

    /// Nodes in pre-order.
    pub fn preorder(&self) -> Vec<&CraftTreeNode> {
        let mut nodes = Vec::new();
        self.walk(|_, node| nodes.push(node));
        nodes
    }

    /// Total number of nodes in this subtree.
    pub fn node_count(&self) -> usize {
        1 + self.children.iter().map(CraftTreeNode::node_count).sum::<usize>()
    }

    /// Number of edges on the longest root-to-leaf chain.
    pub fn depth(&self) -> usize {
        self.children
            .iter()
            .map(|c| c.depth() + 1)
            .max()
            .unwrap_or(0)
    }
}

/// Read model returned to callers: the annotated tree plus its per-item summary.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProgressView {
    pub root: CraftTreeNode,

    pub flat_summary: BTreeMap<ItemId, ItemProgress>,

    /// Overall completion percentage (the root's progress).
    pub progress: f64,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> CraftTreeNode {
        let plank = Recipe::base("plank", "Plank");
        let stick = Recipe::crafted("stick", "Stick", 4).with_ingredient("plank", 2);
        let torch = Recipe::crafted("torch", "Torch", 1)
            .with_ingredient("stick", 1)
            .with_ingredient("plank", 1);

        let mut stick_node = CraftTreeNode::new(&stick, 2);
        stick_node.children.push(CraftTreeNode::new(&plank, 1));
        let mut root = CraftTreeNode::new(&torch, 2);
        root.children.push(stick_node);
        root.children.push(CraftTreeNode::new(&plank, 2));
        root
    }

    #[test]
    fn test_find_by_path() {
        let root = sample();
        let path: Vec<ItemId> = vec!["torch".into(), "stick".into(), "plank".into()];
        let node = root.find(&path).unwrap();
        assert_eq!(node.quantity, 1);

        let direct: Vec<ItemId> = vec!["torch".into(), "plank".into()];
        assert_eq!(root.find(&direct).unwrap().quantity, 2);

        let wrong_root: Vec<ItemId> = vec!["plank".into()];
        let unknown: Vec<ItemId> = vec!["torch".into(), "coal".into()];
        assert!(root.find(&[]).is_none());
        assert!(root.find(&wrong_root).is_none());
        assert!(root.find(&unknown).is_none());
    }

    #[test]
    fn test_preorder_and_shape() {
        let root = sample();
        let ids: Vec<&str> = root.preorder().into_iter().map(|n| n.item_id.as_str()).collect();
        assert_eq!(ids, vec!["torch", "stick", "plank", "plank"]);
        assert_eq!(root.node_count(), 4);
        assert_eq!(root.depth(), 2);
    }

    #[test]
    fn test_walk_reports_paths() {
        let root = sample();
        let mut paths = Vec::new();
        root.walk(|path, _| paths.push(path.len()));
        assert_eq!(paths, vec![1, 2, 3, 2]);
    }

    #[test]
    fn test_zero_quantity_node_is_complete() {
        let node = CraftTreeNode::new(&Recipe::base("ore", "Ore"), 0);
        assert_eq!(node.progress, 100.0);
    }
}
