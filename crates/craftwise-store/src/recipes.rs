//! Recipe store implementations.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use craftwise_core::{CraftError, ItemId, Recipe, RecipeGraph, Result};
use tokio::sync::RwLock;
use tracing::info;

/// Trait for recipe stores.
///
/// Every successful mutation bumps the store version, which tags the
/// [`RecipeGraph`] snapshots handed to the resolver.
#[async_trait]
pub trait RecipeStore: Send + Sync {
    /// All recipes, sorted by name.
    async fn list_recipes(&self) -> Result<Vec<Recipe>>;

    /// Get a recipe by id.
    async fn get_recipe(&self, id: &ItemId) -> Result<Recipe>;

    /// Insert a new recipe. Fails if the id is taken.
    async fn create_recipe(&self, recipe: Recipe) -> Result<Recipe>;

    /// Replace an existing recipe.
    async fn update_recipe(&self, recipe: Recipe) -> Result<Recipe>;

    /// Remove a recipe.
    async fn delete_recipe(&self, id: &ItemId) -> Result<()>;

    /// Immutable snapshot of the whole graph at the current version.
    async fn recipe_graph(&self) -> Result<RecipeGraph>;

    /// Get the current version of the store.
    async fn version(&self) -> u64;
}

#[derive(Debug, Default)]
struct RecipeTable {
    recipes: HashMap<ItemId, Recipe>,
    version: u64,
}

/// In-memory implementation of RecipeStore.
#[derive(Debug, Clone, Default)]
pub struct InMemoryRecipeStore {
    table: Arc<RwLock<RecipeTable>>,
}

impl InMemoryRecipeStore {
    /// Create an empty in-memory recipe store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a store preloaded with `recipes`, replacing duplicates by id.
    pub fn with_recipes(recipes: impl IntoIterator<Item = Recipe>) -> Result<Self> {
        let mut table = RecipeTable::default();
        for recipe in recipes {
            recipe.validate()?;
            table.recipes.insert(recipe.id.clone(), recipe);
        }
        table.version = 1;
        Ok(Self {
            table: Arc::new(RwLock::new(table)),
        })
    }
}

#[async_trait]
impl RecipeStore for InMemoryRecipeStore {
    async fn list_recipes(&self) -> Result<Vec<Recipe>> {
        let table = self.table.read().await;
        let mut recipes: Vec<Recipe> = table.recipes.values().cloned().collect();
        recipes.sort_by(|a, b| a.name.cmp(&b.name).then_with(|| a.id.cmp(&b.id)));
        Ok(recipes)
    }

    async fn get_recipe(&self, id: &ItemId) -> Result<Recipe> {
        let table = self.table.read().await;
        table
            .recipes
            .get(id)
            .cloned()
            .ok_or_else(|| CraftError::RecipeNotFound { id: id.clone() })
    }

    async fn create_recipe(&self, recipe: Recipe) -> Result<Recipe> {
        recipe.validate()?;
        let mut table = self.table.write().await;

        if table.recipes.contains_key(&recipe.id) {
            return Err(CraftError::InvalidRequest(format!(
                "Recipe {} already exists",
                recipe.id
            )));
        }

        table.recipes.insert(recipe.id.clone(), recipe.clone());
        table.version += 1;
        info!(recipe = %recipe.id, version = table.version, "recipe created");
        Ok(recipe)
    }

    async fn update_recipe(&self, recipe: Recipe) -> Result<Recipe> {
        recipe.validate()?;
        let mut table = self.table.write().await;

        let slot = table
            .recipes
            .get_mut(&recipe.id)
            .ok_or_else(|| CraftError::RecipeNotFound {
                id: recipe.id.clone(),
            })?;
        *slot = recipe.clone();
        table.version += 1;
        info!(recipe = %recipe.id, version = table.version, "recipe updated");
        Ok(recipe)
    }

    async fn delete_recipe(&self, id: &ItemId) -> Result<()> {
        let mut table = self.table.write().await;
        if table.recipes.remove(id).is_none() {
            return Err(CraftError::RecipeNotFound { id: id.clone() });
        }
        table.version += 1;
        info!(recipe = %id, version = table.version, "recipe deleted");
        Ok(())
    }

    async fn recipe_graph(&self) -> Result<RecipeGraph> {
        let table = self.table.read().await;
        Ok(RecipeGraph::new(table.recipes.values().cloned()).with_version(table.version))
    }

    async fn version(&self) -> u64 {
        self.table.read().await.version
    }
}
