//! Resolver configuration and entry points.

use std::collections::{BTreeMap, HashMap};

use craftwise_core::{
    CraftError, CraftTreeNode, ItemId, LedgerSnapshot, Project, ProgressView, Recipe,
    RecipeGraph, Result,
};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::aggregate::annotate;
use crate::expand::Expansion;

/// Configuration for the resolver.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ResolverConfig {
    /// Depth bound used by previews when the caller gives none.
    pub default_max_depth: Option<u32>,

    /// Maximum number of nodes a single tree may contain.
    pub max_nodes: usize,
}

impl Default for ResolverConfig {
    fn default() -> Self {
        Self {
            default_max_depth: Some(10),
            max_nodes: 100_000,
        }
    }
}

/// Read access to recipe definitions.
///
/// Implemented for [`RecipeGraph`] snapshots and plain maps so the resolver
/// never touches a store directly.
pub trait RecipeLookup {
    /// Look up the recipe producing `id`.
    fn recipe(&self, id: &ItemId) -> Option<&Recipe>;
}

impl RecipeLookup for RecipeGraph {
    fn recipe(&self, id: &ItemId) -> Option<&Recipe> {
        self.get(id)
    }
}

impl RecipeLookup for HashMap<ItemId, Recipe> {
    fn recipe(&self, id: &ItemId) -> Option<&Recipe> {
        self.get(id)
    }
}

impl RecipeLookup for BTreeMap<ItemId, Recipe> {
    fn recipe(&self, id: &ItemId) -> Option<&Recipe> {
        self.get(id)
    }
}

/// Expands recipes into depth-bounded craft trees.
#[derive(Debug, Clone, Default)]
pub struct TreeResolver {
    config: ResolverConfig,
}

impl TreeResolver {
    /// Create a resolver with default configuration.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a resolver with custom configuration.
    pub fn with_config(config: ResolverConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &ResolverConfig {
        &self.config
    }

    pub fn set_config(&mut self, config: ResolverConfig) {
        self.config = config;
    }

    /// Expand `target` into a tree requiring `quantity` units at the root.
    ///
    /// Fails with `RecipeNotFound` for any missing recipe and with
    /// `CycleDetected` if a recipe recurs on its own expansion path. No partial
    /// tree is ever returned.
    pub fn resolve<L>(
        &self,
        lookup: &L,
        target: &ItemId,
        quantity: u64,
        max_depth: Option<u32>,
    ) -> Result<CraftTreeNode>
    where
        L: RecipeLookup + ?Sized,
    {
        self.resolve_with_overrides(lookup, target, quantity, max_depth, &BTreeMap::new())
    }

    /// Like [`TreeResolver::resolve`], replacing the required quantity at every
    /// path found in `overrides` before expanding below it.
    pub fn resolve_with_overrides<L>(
        &self,
        lookup: &L,
        target: &ItemId,
        quantity: u64,
        max_depth: Option<u32>,
        overrides: &BTreeMap<Vec<ItemId>, u64>,
    ) -> Result<CraftTreeNode>
    where
        L: RecipeLookup + ?Sized,
    {
        if max_depth == Some(0) {
            return Err(CraftError::InvalidRequest(
                "max depth must be greater than zero".to_string(),
            ));
        }

        let mut expansion = Expansion::new(lookup, overrides, max_depth, self.config.max_nodes);
        let root = expansion.run(target, quantity)?;

        debug!(
            target = %target,
            quantity,
            nodes = expansion.nodes_created(),
            "resolved craft tree"
        );
        Ok(root)
    }

    /// Resolve a project's tree, honouring its depth bound and overrides.
    pub fn resolve_project<L>(&self, lookup: &L, project: &Project) -> Result<CraftTreeNode>
    where
        L: RecipeLookup + ?Sized,
    {
        self.resolve_with_overrides(
            lookup,
            &project.target_recipe_id,
            project.target_quantity,
            project.max_depth,
            &project.override_map(),
        )
    }

    /// Resolve and annotate a project against its ledger.
    pub fn progress<L>(
        &self,
        lookup: &L,
        project: &Project,
        ledger: &LedgerSnapshot,
    ) -> Result<ProgressView>
    where
        L: RecipeLookup + ?Sized,
    {
        let tree = self.resolve_project(lookup, project)?;
        annotate(tree, ledger)
    }

    /// Ledger-free preview of a tree, used before a project exists.
    ///
    /// All `current_quantity` fields are zero. A missing depth falls back to
    /// [`ResolverConfig::default_max_depth`].
    pub fn calculate<L>(
        &self,
        lookup: &L,
        target: &ItemId,
        quantity: u64,
        max_depth: Option<u32>,
    ) -> Result<CraftTreeNode>
    where
        L: RecipeLookup + ?Sized,
    {
        let depth = max_depth.or(self.config.default_max_depth);
        let tree = self.resolve(lookup, target, quantity, depth)?;
        Ok(annotate(tree, &LedgerSnapshot::default())?.root)
    }
}
