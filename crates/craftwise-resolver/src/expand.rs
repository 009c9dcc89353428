//! Recursive requirement expansion.
//!
//! Every child quantity is `ceil(parent * quantity_per_batch / output_per_batch)`.
//! The set of recipe ids currently being expanded travels down the call as a
//! [`RecursionPath`], so expansions share no mutable state with each other.

use std::collections::{BTreeMap, HashSet};

use craftwise_core::{CraftError, CraftTreeNode, ItemId, Result};
use tracing::trace;

use crate::resolver::RecipeLookup;

/// Recipe ids on the path from the root to the node being expanded.
#[derive(Debug, Default)]
pub struct RecursionPath {
    ids: Vec<ItemId>,
    members: HashSet<ItemId>,
}

impl RecursionPath {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn contains(&self, id: &ItemId) -> bool {
        self.members.contains(id)
    }

    pub fn push(&mut self, id: ItemId) {
        self.members.insert(id.clone());
        self.ids.push(id);
    }

    pub fn pop(&mut self) {
        if let Some(id) = self.ids.pop() {
            self.members.remove(&id);
        }
    }

    /// Ids from the root to the current node.
    pub fn ids(&self) -> &[ItemId] {
        &self.ids
    }

    pub fn depth(&self) -> usize {
        self.ids.len()
    }

    /// The cycle closed by revisiting `id`: from its first occurrence back to itself.
    pub fn cycle_through(&self, id: &ItemId) -> Vec<ItemId> {
        let start = self.ids.iter().position(|p| p == id).unwrap_or(0);
        let mut cycle = self.ids[start..].to_vec();
        cycle.push(id.clone());
        cycle
    }
}

/// `ceil(parent * per_batch / output)` without intermediate overflow.
pub fn scale_quantity(parent: u64, per_batch: u64, output: u64) -> Option<u64> {
    if output == 0 {
        return None;
    }
    let numerator = u128::from(parent) * u128::from(per_batch);
    let output = u128::from(output);
    u64::try_from(numerator.div_ceil(output)).ok()
}

/// State of one resolve call.
pub(crate) struct Expansion<'a, L: RecipeLookup + ?Sized> {
    lookup: &'a L,
    overrides: &'a BTreeMap<Vec<ItemId>, u64>,
    max_depth: Option<u32>,
    max_nodes: usize,
    nodes: usize,
}

impl<'a, L: RecipeLookup + ?Sized> Expansion<'a, L> {
    pub(crate) fn new(
        lookup: &'a L,
        overrides: &'a BTreeMap<Vec<ItemId>, u64>,
        max_depth: Option<u32>,
        max_nodes: usize,
    ) -> Self {
        Self {
            lookup,
            overrides,
            max_depth,
            max_nodes,
            nodes: 0,
        }
    }

    pub(crate) fn nodes_created(&self) -> usize {
        self.nodes
    }

    pub(crate) fn run(&mut self, target: &ItemId, quantity: u64) -> Result<CraftTreeNode> {
        let mut path = RecursionPath::new();
        self.expand(target, quantity, 0, &mut path)
    }

    fn expand(
        &mut self,
        id: &ItemId,
        quantity: u64,
        depth: u32,
        path: &mut RecursionPath,
    ) -> Result<CraftTreeNode> {
        if path.contains(id) {
            return Err(CraftError::CycleDetected {
                cycle: path.cycle_through(id),
            });
        }

        let lookup = self.lookup;
        let recipe = lookup
            .recipe(id)
            .ok_or_else(|| CraftError::RecipeNotFound { id: id.clone() })?;

        self.nodes += 1;
        if self.nodes > self.max_nodes {
            return Err(CraftError::TreeTooLarge {
                limit: self.max_nodes,
            });
        }

        path.push(id.clone());
        let quantity = self
            .overrides
            .get(path.ids())
            .copied()
            .unwrap_or(quantity);
        let mut node = CraftTreeNode::new(recipe, quantity);

        if recipe.is_leaf() {
            path.pop();
            return Ok(node);
        }

        if self.max_depth == Some(depth) {
            trace!(item = %id, depth, "depth bound reached");
            node.truncated = true;
            path.pop();
            return Ok(node);
        }

        let output = recipe.output_per_batch.get();
        node.children.reserve(recipe.ingredients.len());
        for ingredient in &recipe.ingredients {
            let child_quantity = scale_quantity(quantity, ingredient.quantity_per_batch, output)
                .ok_or_else(|| CraftError::QuantityOverflow {
                    item_id: ingredient.item_id.clone(),
                })?;
            let child = self.expand(&ingredient.item_id, child_quantity, depth + 1, path)?;
            node.children.push(child);
        }

        path.pop();
        Ok(node)
    }
}
