//! Progress aggregation.
//!
//! Apportionment needs whole-tree totals, so it runs as a separate pass over a
//! fully materialized tree:
//!
//! 1. a pre-order walk records every position's required quantity and groups
//!    positions by item, giving the per-item requirement totals;
//! 2. each item's single ledger scalar is split across its positions in
//!    proportion to their quantity, with the integer remainder handed to the
//!    earliest positions in pre-order;
//! 3. shares and percentages are written back into the tree.

use std::collections::{BTreeMap, HashMap};

use craftwise_core::{
    percent, CraftError, CraftTreeNode, ItemId, ItemProgress, LedgerSnapshot, ProgressView, Result,
};
use tracing::debug;

/// Per-item requirement totals gathered by the first pass.
#[derive(Debug, Default)]
pub struct Requirements {
    /// Required quantity of every position, in pre-order.
    quantities: Vec<u64>,

    /// Whether the position is a leaf, in pre-order.
    leaves: Vec<bool>,

    /// Item of every position, in pre-order.
    items: Vec<ItemId>,

    /// Pre-order indices of each item's positions, in discovery order.
    positions: HashMap<ItemId, Vec<usize>>,

    /// Units of each item required across the tree.
    totals: HashMap<ItemId, u64>,
}

impl Requirements {
    /// Walk `tree` and collect its requirement totals.
    ///
    /// Fails with [`CraftError::QuantityOverflow`] when an item's positions
    /// together require more than `u64::MAX` units.
    pub fn collect(tree: &CraftTreeNode) -> Result<Self> {
        let mut req = Self::default();
        tree.walk(|_, node| {
            let index = req.quantities.len();
            req.quantities.push(node.quantity);
            req.leaves.push(node.is_leaf());
            req.items.push(node.item_id.clone());
            req.positions
                .entry(node.item_id.clone())
                .or_default()
                .push(index);
        });

        for (item, indices) in &req.positions {
            let total: u128 = indices
                .iter()
                .map(|&i| u128::from(req.quantities[i]))
                .sum();
            let total = u64::try_from(total).map_err(|_| CraftError::QuantityOverflow {
                item_id: item.clone(),
            })?;
            req.totals.insert(item.clone(), total);
        }
        Ok(req)
    }

    /// Total units of `item` required across the tree.
    pub fn total(&self, item: &ItemId) -> u64 {
        self.totals.get(item).copied().unwrap_or(0)
    }

    /// Whether every position of `item` is a leaf of the tree.
    ///
    /// Base items always are. A truncated item is not when another position
    /// of it is expanded higher up the tree.
    pub fn leaf_only(&self, item: &ItemId) -> bool {
        self.positions
            .get(item)
            .is_some_and(|idx| idx.iter().all(|&i| self.leaves[i]))
    }

    /// Distinct items in order of first discovery.
    pub fn items(&self) -> impl Iterator<Item = &ItemId> {
        self.items
            .iter()
            .enumerate()
            .filter(|(i, id)| self.positions.get(*id).and_then(|p| p.first()) == Some(i))
            .map(|(_, id)| id)
    }

    /// Split each item's ledger quantity across its positions.
    ///
    /// Returns one share per position in pre-order. Shares never exceed the
    /// position's own quantity and an item's shares sum to
    /// `min(ledger, total)`.
    pub fn apportion(&self, ledger: &LedgerSnapshot) -> Vec<u64> {
        let mut shares = vec![0u64; self.quantities.len()];

        for (item, indices) in &self.positions {
            let total = self.total(item);
            if total == 0 {
                continue;
            }
            let available = ledger.get(item).min(total);

            // Each floor share is at most the position's quantity, and the
            // floors sum to at most `available` since the quantities sum to `total`.
            let mut assigned = 0u64;
            for &i in indices {
                let share = u128::from(available) * u128::from(self.quantities[i])
                    / u128::from(total);
                shares[i] = share as u64;
                assigned += shares[i];
            }

            let mut remainder = available - assigned;
            for &i in indices {
                if remainder == 0 {
                    break;
                }
                let room = self.quantities[i] - shares[i];
                let extra = room.min(remainder);
                shares[i] += extra;
                remainder -= extra;
            }
        }

        shares
    }

    /// Leaf-weighted completion of the whole tree.
    ///
    /// Counts the leaf positions of leaf-only items: base resources, plus
    /// truncated items that are never expanded elsewhere. Their shares sum to
    /// `min(ledger, total)` per item, so this is `Σ min(current, quantity)`
    /// over those leaf nodes and cannot decrease when a ledger entry grows.
    /// A truncated position of an item that is expanded elsewhere is covered
    /// by the expanded position's ingredients instead.
    pub fn root_progress(&self, ledger: &LedgerSnapshot) -> f64 {
        let mut required = 0u128;
        let mut covered = 0u128;
        for item in self.positions.keys().filter(|item| self.leaf_only(item)) {
            let total = self.total(item);
            required += u128::from(total);
            covered += u128::from(ledger.get(item).min(total));
        }
        if required == 0 {
            return 100.0;
        }
        (100.0 * covered as f64 / required as f64).min(100.0)
    }
}

/// Fuse a resolved tree with a ledger snapshot.
///
/// Fills in every node's `current_quantity` and `progress` and builds the
/// flat per-item summary. The root's progress is weighted by leaf
/// requirements rather than averaged over children.
pub fn annotate(mut tree: CraftTreeNode, ledger: &LedgerSnapshot) -> Result<ProgressView> {
    let requirements = Requirements::collect(&tree)?;
    let shares = requirements.apportion(ledger);

    let mut index = 0usize;
    write_shares(&mut tree, &shares, &mut index);
    tree.progress = requirements.root_progress(ledger);

    let flat_summary: BTreeMap<ItemId, ItemProgress> = requirements
        .items()
        .map(|item| {
            let entry = ItemProgress::new(requirements.total(item), ledger.get(item));
            (item.clone(), entry)
        })
        .collect();

    debug!(
        item = %tree.item_id,
        items = flat_summary.len(),
        progress = tree.progress,
        "annotated craft tree"
    );

    Ok(ProgressView {
        progress: tree.progress,
        root: tree,
        flat_summary,
    })
}

fn write_shares(node: &mut CraftTreeNode, shares: &[u64], index: &mut usize) {
    node.current_quantity = shares[*index];
    node.progress = percent(node.current_quantity, node.quantity);
    *index += 1;
    for child in &mut node.children {
        write_shares(child, shares, index);
    }
}

#[cfg(test)]
mod tests {
    use craftwise_core::{Recipe, RecipeGraph};

    use super::*;
    use crate::resolver::TreeResolver;

    fn ledger(entries: &[(&str, u64)]) -> LedgerSnapshot {
        entries
            .iter()
            .map(|(id, q)| (ItemId::from(*id), *q))
            .collect()
    }

    fn diamond() -> CraftTreeNode {
        // frame -> plate x2 -> iron x4 ; frame -> rod x3 -> iron x2
        let graph = RecipeGraph::new([
            Recipe::base("iron", "Iron"),
            Recipe::crafted("plate", "Plate", 1).with_ingredient("iron", 2),
            Recipe::crafted("rod", "Rod", 2).with_ingredient("iron", 1),
            Recipe::crafted("frame", "Frame", 1)
                .with_ingredient("plate", 2)
                .with_ingredient("rod", 3),
        ]);
        TreeResolver::new()
            .resolve(&graph, &"frame".into(), 1, None)
            .unwrap()
    }

    #[test]
    fn test_worked_example() {
        let graph = RecipeGraph::new([
            Recipe::base("plank", "Plank"),
            Recipe::crafted("stick", "Stick", 4).with_ingredient("plank", 2),
        ]);
        let tree = TreeResolver::new()
            .resolve(&graph, &"stick".into(), 10, Some(5))
            .unwrap();

        let view = annotate(tree, &ledger(&[("plank", 3)])).unwrap();

        let plank = &view.root.children[0];
        assert_eq!(plank.current_quantity, 3);
        assert_eq!(plank.progress, 60.0);
        assert_eq!(view.root.progress, 60.0);
        assert_eq!(view.progress, 60.0);

        let summary = view.flat_summary[&ItemId::from("plank")];
        assert_eq!(summary.base_quantity, 5);
        assert_eq!(summary.current_quantity, 3);
        assert_eq!(summary.target_quantity, 2);

        let stick = view.flat_summary[&ItemId::from("stick")];
        assert_eq!(stick.base_quantity, 10);
        assert_eq!(stick.target_quantity, 10);
    }

    #[test]
    fn test_shared_item_apportioned_proportionally() {
        let tree = diamond();
        let req = Requirements::collect(&tree).unwrap();
        assert_eq!(req.total(&"iron".into()), 6);

        // 3 of 6 iron: plate branch (4) gets floor(12/6)=2, rod branch (2) gets 1
        let view = annotate(tree, &ledger(&[("iron", 3)])).unwrap();
        let plate_iron = &view.root.children[0].children[0];
        let rod_iron = &view.root.children[1].children[0];
        assert_eq!(plate_iron.current_quantity, 2);
        assert_eq!(rod_iron.current_quantity, 1);
        assert_eq!(view.root.progress, 50.0);
        assert_eq!(view.flat_summary[&ItemId::from("iron")].base_quantity, 6);
    }

    #[test]
    fn test_remainder_goes_to_earliest_position() {
        // 1 of 6 iron: floors are 0 and 0, remainder 1 lands on the plate branch
        let view = annotate(diamond(), &ledger(&[("iron", 1)])).unwrap();
        assert_eq!(view.root.children[0].children[0].current_quantity, 1);
        assert_eq!(view.root.children[1].children[0].current_quantity, 0);
    }

    #[test]
    fn test_remainder_spills_when_position_is_full() {
        let graph = RecipeGraph::new([
            Recipe::base("gem", "Gem"),
            Recipe::crafted("ring", "Ring", 1)
                .with_ingredient("gem", 1)
                .with_ingredient("gem", 1)
                .with_ingredient("gem", 1),
        ]);
        let tree = TreeResolver::new()
            .resolve(&graph, &"ring".into(), 1, None)
            .unwrap();

        let view = annotate(tree, &ledger(&[("gem", 2)])).unwrap();
        let shares: Vec<u64> = view.root.children.iter().map(|c| c.current_quantity).collect();
        assert_eq!(shares, vec![1, 1, 0]);
    }

    #[test]
    fn test_ledger_excess_is_capped() {
        let view = annotate(diamond(), &ledger(&[("iron", 100)])).unwrap();
        assert_eq!(view.root.progress, 100.0);
        for node in view.root.preorder() {
            assert!(node.current_quantity <= node.quantity);
        }
        let iron = view.flat_summary[&ItemId::from("iron")];
        assert_eq!(iron.current_quantity, 6);
        assert_eq!(iron.target_quantity, 0);
    }

    #[test]
    fn test_intermediate_possession_does_not_move_root() {
        let view = annotate(diamond(), &ledger(&[("plate", 2)])).unwrap();
        assert_eq!(view.root.children[0].progress, 100.0);
        assert_eq!(view.root.progress, 0.0);
    }

    #[test]
    fn test_summary_in_discovery_order_covers_all_items() {
        let req = Requirements::collect(&diamond()).unwrap();
        let items: Vec<&str> = req.items().map(ItemId::as_str).collect();
        assert_eq!(items, vec!["frame", "plate", "iron", "rod"]);
    }

    #[test]
    fn test_truncated_leaves_count_toward_root() {
        let graph = RecipeGraph::new([
            Recipe::base("ore", "Ore"),
            Recipe::crafted("ingot", "Ingot", 1).with_ingredient("ore", 2),
            Recipe::crafted("gear", "Gear", 1).with_ingredient("ingot", 4),
        ]);
        let tree = TreeResolver::new()
            .resolve(&graph, &"gear".into(), 1, Some(1))
            .unwrap();

        let view = annotate(tree, &ledger(&[("ingot", 1)])).unwrap();
        assert_eq!(view.root.progress, 25.0);
    }

    #[test]
    fn test_truncated_position_of_expanded_item_not_credited() {
        // widget's ingot is cut off at depth 2 while the direct ingot expands to ore
        let graph = RecipeGraph::new([
            Recipe::base("ore", "Ore"),
            Recipe::crafted("ingot", "Ingot", 1).with_ingredient("ore", 1),
            Recipe::crafted("widget", "Widget", 1).with_ingredient("ingot", 1),
            Recipe::crafted("engine", "Engine", 1)
                .with_ingredient("ingot", 1)
                .with_ingredient("widget", 1),
        ]);
        let tree = TreeResolver::new()
            .resolve(&graph, &"engine".into(), 1, Some(2))
            .unwrap();
        let req = Requirements::collect(&tree).unwrap();
        assert!(!req.leaf_only(&"ingot".into()));
        assert!(req.leaf_only(&"ore".into()));

        let view = annotate(tree, &ledger(&[("ingot", 1)])).unwrap();
        let truncated = &view.root.children[1].children[0];
        assert!(truncated.truncated);
        assert_eq!(truncated.current_quantity, 0);
        assert_eq!(view.root.children[0].current_quantity, 1);
        assert_eq!(view.root.progress, 0.0);

        let view = annotate(view.root, &ledger(&[("ore", 1)])).unwrap();
        assert_eq!(view.root.progress, 100.0);
    }

    #[test]
    fn test_item_total_beyond_u64_is_overflow() {
        let graph = RecipeGraph::new([
            Recipe::base("gem", "Gem"),
            Recipe::crafted("pair", "Pair", 1)
                .with_ingredient("gem", 1)
                .with_ingredient("gem", 1),
        ]);
        let tree = TreeResolver::new()
            .resolve(&graph, &"pair".into(), 1 << 63, None)
            .unwrap();

        let err = annotate(tree, &ledger(&[("gem", u64::MAX)])).unwrap_err();
        assert!(matches!(err, CraftError::QuantityOverflow { item_id } if item_id.as_str() == "gem"));
    }

    #[test]
    fn test_large_totals_within_range_apportion_exactly() {
        let graph = RecipeGraph::new([
            Recipe::base("gem", "Gem"),
            Recipe::crafted("pair", "Pair", 1)
                .with_ingredient("gem", 1)
                .with_ingredient("gem", 1),
        ]);
        let tree = TreeResolver::new()
            .resolve(&graph, &"pair".into(), u64::MAX / 2, None)
            .unwrap();

        let view = annotate(tree, &ledger(&[("gem", u64::MAX)])).unwrap();
        let shares: Vec<u64> = view.root.children.iter().map(|c| c.current_quantity).collect();
        assert_eq!(shares, vec![u64::MAX / 2, u64::MAX / 2]);
        assert_eq!(view.root.progress, 100.0);
    }
}
