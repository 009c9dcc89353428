//! Recipe types.
//!
//! A [`Recipe`] produces `output_per_batch` units of its item from an ordered
//! list of [`Ingredient`]s. Recipe ids double as item ids: the item a recipe
//! produces is identified by the recipe's own id.

use std::collections::HashMap;
use std::fmt;
use std::num::NonZeroU64;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::{CraftError, Result};

/// Identity of an item (and of the recipe producing it).
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ItemId(String);

impl ItemId {
    /// Create an item id from any string.
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Generate a fresh random id.
    pub fn generate() -> Self {
        Self(Uuid::new_v4().to_string())
    }

    /// Borrow the id as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ItemId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for ItemId {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

impl From<String> for ItemId {
    fn from(s: String) -> Self {
        Self(s)
    }
}

impl AsRef<str> for ItemId {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

/// One ingredient line of a recipe.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Ingredient {
    /// The item consumed.
    pub item_id: ItemId,

    /// Units consumed per craft operation.
    #[serde(alias = "quantity")]
    pub quantity_per_batch: u64,
}

impl Ingredient {
    /// Create a new ingredient line.
    pub fn new(item_id: impl Into<ItemId>, quantity_per_batch: u64) -> Self {
        Self {
            item_id: item_id.into(),
            quantity_per_batch,
        }
    }
}

/// A recipe definition.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Recipe {
    /// Stable identity; also the id of the produced item.
    pub id: ItemId,

    /// Display name.
    pub name: String,

    /// Units produced by one craft operation.
    #[serde(alias = "output")]
    pub output_per_batch: NonZeroU64,

    /// Ordered ingredient lines.
    #[serde(default)]
    pub ingredients: Vec<Ingredient>,

    /// Raw, non-craftable resource.
    #[serde(default)]
    pub is_base: bool,
}

impl Recipe {
    /// Create a base (raw resource) recipe yielding one unit per batch.
    pub fn base(id: impl Into<ItemId>, name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            output_per_batch: NonZeroU64::MIN,
            ingredients: Vec::new(),
            is_base: true,
        }
    }

    /// Create a craftable recipe with no ingredients yet.
    pub fn crafted(id: impl Into<ItemId>, name: impl Into<String>, output_per_batch: u64) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            output_per_batch: NonZeroU64::new(output_per_batch).unwrap_or(NonZeroU64::MIN),
            ingredients: Vec::new(),
            is_base: false,
        }
    }

    /// Add an ingredient line.
    pub fn with_ingredient(mut self, item_id: impl Into<ItemId>, quantity_per_batch: u64) -> Self {
        self.ingredients.push(Ingredient::new(item_id, quantity_per_batch));
        self
    }

    /// A recipe is a leaf of the craft tree when it is base or has nothing to expand.
    pub fn is_leaf(&self) -> bool {
        self.is_base || self.ingredients.is_empty()
    }

    /// Reject recipes the resolver cannot expand sensibly.
    pub fn validate(&self) -> Result<()> {
        if self.name.trim().is_empty() {
            return Err(CraftError::InvalidRequest(format!(
                "Recipe {} has an empty name",
                self.id
            )));
        }
        if let Some(zero) = self.ingredients.iter().find(|i| i.quantity_per_batch == 0) {
            return Err(CraftError::invalid_quantity(format!(
                "Ingredient {} of recipe {} has zero quantity",
                zero.item_id, self.id
            )));
        }
        Ok(())
    }
}

/// Payload for creating or replacing a recipe.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RecipeDraft {
    /// Optional caller-chosen id; generated when absent.
    #[serde(default)]
    pub id: Option<ItemId>,

    pub name: String,

    #[serde(alias = "output")]
    pub output_per_batch: NonZeroU64,

    #[serde(default)]
    pub ingredients: Vec<Ingredient>,

    #[serde(default)]
    pub is_base: bool,
}

impl RecipeDraft {
    /// Turn the draft into a recipe, generating an id if needed.
    ///
    /// Base recipes never keep ingredient lines. Repeated lines for the same
    /// item are merged into the first one, so every ingredient of a recipe is
    /// a distinct tree position addressable by path.
    pub fn into_recipe(self) -> Recipe {
        let ingredients = if self.is_base {
            Vec::new()
        } else {
            merge_ingredients(self.ingredients)
        };
        Recipe {
            id: self.id.unwrap_or_else(ItemId::generate),
            name: self.name,
            output_per_batch: self.output_per_batch,
            ingredients,
            is_base: self.is_base,
        }
    }
}

fn merge_ingredients(lines: Vec<Ingredient>) -> Vec<Ingredient> {
    let mut merged: Vec<Ingredient> = Vec::with_capacity(lines.len());
    for line in lines {
        match merged.iter_mut().find(|i| i.item_id == line.item_id) {
            Some(existing) => {
                existing.quantity_per_batch =
                    existing.quantity_per_batch.saturating_add(line.quantity_per_batch);
            }
            None => merged.push(line),
        }
    }
    merged
}

/// Immutable snapshot of the recipe graph.
#[derive(Debug, Clone, Default)]
pub struct RecipeGraph {
    recipes: HashMap<ItemId, Recipe>,
    version: u64,
}

impl RecipeGraph {
    /// Build a graph snapshot from a set of recipes.
    pub fn new(recipes: impl IntoIterator<Item = Recipe>) -> Self {
        Self {
            recipes: recipes.into_iter().map(|r| (r.id.clone(), r)).collect(),
            version: 0,
        }
    }

    /// Tag the snapshot with the store version it was taken at.
    pub fn with_version(mut self, version: u64) -> Self {
        self.version = version;
        self
    }

    /// Store version this snapshot was taken at.
    pub fn version(&self) -> u64 {
        self.version
    }

    pub fn get(&self, id: &ItemId) -> Option<&Recipe> {
        self.recipes.get(id)
    }

    pub fn len(&self) -> usize {
        self.recipes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.recipes.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Recipe> {
        self.recipes.values()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_draft_merges_repeated_ingredients() {
        let draft: RecipeDraft = serde_json::from_value(serde_json::json!({
            "id": "ring",
            "name": "Ring",
            "output": 1,
            "ingredients": [
                { "itemId": "gem", "quantity": 1 },
                { "itemId": "band", "quantity": 1 },
                { "itemId": "gem", "quantity": 2 }
            ]
        }))
        .unwrap();

        let recipe = draft.into_recipe();
        assert_eq!(
            recipe.ingredients,
            vec![Ingredient::new("gem", 3), Ingredient::new("band", 1)]
        );
    }

    #[test]
    fn test_recipe_accepts_short_field_names() {
        let recipe: Recipe = serde_json::from_value(serde_json::json!({
            "id": "stick",
            "name": "Stick",
            "output": 4,
            "ingredients": [{ "itemId": "plank", "quantity": 2 }]
        }))
        .unwrap();

        assert_eq!(recipe.output_per_batch.get(), 4);
        assert_eq!(recipe.ingredients[0].quantity_per_batch, 2);
        assert!(!recipe.is_base);
    }

    #[test]
    fn test_validate() {
        assert!(Recipe::crafted("stick", "Stick", 4)
            .with_ingredient("plank", 2)
            .validate()
            .is_ok());
        assert!(Recipe::base("ore", " ").validate().is_err());

        let err = Recipe::crafted("stick", "Stick", 4)
            .with_ingredient("plank", 0)
            .validate()
            .unwrap_err();
        assert!(matches!(err, CraftError::InvalidQuantity { .. }));
    }

    #[test]
    fn test_zero_output_is_rejected() {
        let result: std::result::Result<Recipe, _> = serde_json::from_value(serde_json::json!({
            "id": "bad",
            "name": "Bad",
            "outputPerBatch": 0
        }));
        assert!(result.is_err());
    }

    #[test]
    fn test_base_draft_drops_ingredients() {
        let draft = RecipeDraft {
            id: None,
            name: "Ore".to_string(),
            output_per_batch: NonZeroU64::MIN,
            ingredients: vec![Ingredient::new("x", 1)],
            is_base: true,
        };
        let recipe = draft.into_recipe();
        assert!(recipe.ingredients.is_empty());
        assert!(!recipe.id.as_str().is_empty());
    }

    #[test]
    fn test_graph_lookup() {
        let graph = RecipeGraph::new([
            Recipe::base("plank", "Plank"),
            Recipe::crafted("stick", "Stick", 4).with_ingredient("plank", 2),
        ])
        .with_version(7);

        assert_eq!(graph.len(), 2);
        assert_eq!(graph.version(), 7);
        assert_eq!(graph.get(&"stick".into()).unwrap().ingredients.len(), 1);
        assert!(graph.get(&"missing".into()).is_none());
    }
}
