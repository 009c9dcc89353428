//! Property-based tests for resolution and aggregation.
//!
//! Graphs are generated acyclic by only letting item `i` depend on items with
//! a larger index.

use proptest::prelude::*;
use proptest::sample::Index;

use craftwise_core::{ItemId, LedgerSnapshot, Recipe, RecipeGraph};

use crate::aggregate::{annotate, Requirements};
use crate::expand::scale_quantity;
use crate::path::plan_node_edit;
use crate::resolver::TreeResolver;

fn item(i: usize) -> ItemId {
    ItemId::new(format!("item{i}"))
}

/// Strategy for one recipe shape: output per batch and up to two ingredients.
fn recipe_shape() -> impl Strategy<Value = (u64, Vec<(Index, u64)>)> {
    (1u64..5, prop::collection::vec((any::<Index>(), 1u64..6), 0..3))
}

/// Strategy for an acyclic recipe graph rooted at `item0`.
fn graph_strategy() -> impl Strategy<Value = RecipeGraph> {
    prop::collection::vec(recipe_shape(), 2..6).prop_map(|shapes| {
        let n = shapes.len();
        let recipes = shapes.into_iter().enumerate().map(|(i, (output, ingredients))| {
            let remaining = n - i - 1;
            if remaining == 0 || ingredients.is_empty() {
                return Recipe::base(item(i), format!("Item {i}"));
            }
            ingredients
                .into_iter()
                .fold(Recipe::crafted(item(i), format!("Item {i}"), output), |recipe, (idx, qty)| {
                    recipe.with_ingredient(item(i + 1 + idx.index(remaining)), qty)
                })
        });
        RecipeGraph::new(recipes)
    })
}

/// Depth bound: unbounded or shallow enough to truncate generated graphs.
fn depth_strategy() -> impl Strategy<Value = Option<u32>> {
    prop::option::of(1u32..4)
}

fn ledger_strategy() -> impl Strategy<Value = Vec<u64>> {
    prop::collection::vec(0u64..200, 6)
}

fn ledger_from(values: &[u64]) -> LedgerSnapshot {
    values
        .iter()
        .enumerate()
        .map(|(i, q)| (item(i), *q))
        .collect()
}

proptest! {
    /// Property: scaled quantities are the smallest batch-aligned cover.
    #[test]
    fn prop_scaling_never_undercounts(
        parent in 0u64..1_000_000,
        per_batch in 1u64..1_000,
        output in 1u64..1_000,
    ) {
        let scaled = scale_quantity(parent, per_batch, output).unwrap();
        let needed = u128::from(parent) * u128::from(per_batch);
        prop_assert!(u128::from(scaled) * u128::from(output) >= needed);
        if scaled > 0 {
            prop_assert!(u128::from(scaled - 1) * u128::from(output) < needed);
        }
    }

    /// Property: every node of a positive target requires at least one unit.
    #[test]
    fn prop_positive_target_gives_positive_nodes(
        graph in graph_strategy(),
        quantity in 1u64..50,
    ) {
        let tree = TreeResolver::new().resolve(&graph, &item(0), quantity, None).unwrap();
        for node in tree.preorder() {
            prop_assert!(node.quantity >= 1);
            prop_assert_eq!(node.is_base, node.children.is_empty() && !node.truncated);
        }
    }

    /// Property: shares stay within node quantities and sum to the capped ledger.
    #[test]
    fn prop_shares_bounded_and_conserved(
        graph in graph_strategy(),
        quantity in 1u64..20,
        max_depth in depth_strategy(),
        values in ledger_strategy(),
    ) {
        let tree = TreeResolver::new().resolve(&graph, &item(0), quantity, max_depth).unwrap();
        let ledger = ledger_from(&values);
        let requirements = Requirements::collect(&tree).unwrap();
        let view = annotate(tree, &ledger).unwrap();

        for node in view.root.preorder() {
            prop_assert!(node.current_quantity <= node.quantity);
            prop_assert!((0.0..=100.0).contains(&node.progress));
        }

        for id in requirements.items() {
            let assigned: u64 = view
                .root
                .preorder()
                .into_iter()
                .filter(|n| &n.item_id == id)
                .map(|n| n.current_quantity)
                .sum();
            prop_assert_eq!(assigned, ledger.get(id).min(requirements.total(id)));
        }
    }

    /// Property: possessing more of an item never lowers root progress.
    #[test]
    fn prop_root_progress_monotone(
        graph in graph_strategy(),
        quantity in 1u64..20,
        max_depth in depth_strategy(),
        values in ledger_strategy(),
        bump_item in 0usize..6,
        bump in 1u64..50,
    ) {
        let resolver = TreeResolver::new();
        let tree = resolver.resolve(&graph, &item(0), quantity, max_depth).unwrap();

        let before = annotate(tree.clone(), &ledger_from(&values)).unwrap().root.progress;
        let mut bumped = values.clone();
        bumped[bump_item] += bump;
        let after = annotate(tree, &ledger_from(&bumped)).unwrap().root.progress;

        prop_assert!(after >= before);
    }

    /// Property: root progress equals `Σ min(current, quantity)` over the
    /// counted leaf nodes, so it never shows progress no leaf shows.
    #[test]
    fn prop_root_progress_matches_counted_leaves(
        graph in graph_strategy(),
        quantity in 1u64..20,
        max_depth in depth_strategy(),
        values in ledger_strategy(),
    ) {
        let tree = TreeResolver::new().resolve(&graph, &item(0), quantity, max_depth).unwrap();
        let requirements = Requirements::collect(&tree).unwrap();
        let view = annotate(tree, &ledger_from(&values)).unwrap();

        let (mut covered, mut required) = (0u64, 0u64);
        for node in view.root.preorder() {
            if node.is_leaf() && requirements.leaf_only(&node.item_id) {
                covered += node.current_quantity.min(node.quantity);
                required += node.quantity;
            }
        }
        prop_assert!(required > 0);
        let expected = (100.0 * covered as f64 / required as f64).min(100.0);
        prop_assert!((view.root.progress - expected).abs() < 1e-9);
    }

    /// Property: replaying a clamped node edit stores the same value.
    #[test]
    fn prop_node_edit_idempotent(
        graph in graph_strategy(),
        quantity in 1u64..20,
        requested in 0u64..500,
        pick in any::<Index>(),
    ) {
        let tree = TreeResolver::new().resolve(&graph, &item(0), quantity, None).unwrap();

        let mut paths = Vec::new();
        tree.walk(|path, _| paths.push(path.to_vec()));
        let path = &paths[pick.index(paths.len())];

        let first = plan_node_edit(&tree, path, requested).unwrap();
        let second = plan_node_edit(&tree, path, first.stored).unwrap();
        prop_assert_eq!(first.stored, second.stored);
        prop_assert!(first.stored <= tree.find(path).unwrap().quantity);
    }
}
