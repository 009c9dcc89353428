//! Project types and builder.
//!
//! A Project is a standing goal: craft `target_quantity` units of the item
//! produced by `target_recipe_id`, expanding ingredients at most `max_depth`
//! levels deep.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::{CraftError, Result};
use crate::recipe::ItemId;

/// Aggregated ledger entry for one item of a project.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ItemProgress {
    /// Total units required anywhere in the tree.
    pub base_quantity: u64,

    /// Units still missing as of the last resolve.
    pub target_quantity: u64,

    /// Units recorded as possessed (capped at `base_quantity`).
    pub current_quantity: u64,
}

impl ItemProgress {
    /// Build an entry from the required total and the ledger value.
    pub fn new(base_quantity: u64, possessed: u64) -> Self {
        let current_quantity = possessed.min(base_quantity);
        Self {
            base_quantity,
            target_quantity: base_quantity - current_quantity,
            current_quantity,
        }
    }

    /// Percent of the requirement covered (100 when nothing is required).
    pub fn percent(&self) -> f64 {
        percent(self.current_quantity, self.base_quantity)
    }

    pub fn is_complete(&self) -> bool {
        self.target_quantity == 0
    }
}

/// `min(100, 100 * current / required)`, defined as 100 when nothing is required.
pub fn percent(current: u64, required: u64) -> f64 {
    if required == 0 {
        return 100.0;
    }
    (100.0 * current as f64 / required as f64).min(100.0)
}

/// A replacement for the required quantity at one tree position.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RequiredOverride {
    /// Item ids from root to the overridden node.
    pub path: Vec<ItemId>,

    /// Required quantity at that node.
    pub quantity: u64,
}

/// A crafting project.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Project {
    /// Unique identifier for this project.
    pub id: Uuid,

    /// Display name.
    pub name: String,

    /// Recipe of the item to craft.
    pub target_recipe_id: ItemId,

    /// Units of the target item to craft.
    pub target_quantity: u64,

    /// Maximum expansion depth; `None` means unbounded.
    pub max_depth: Option<u32>,

    /// Per-item projection refreshed on every resolve.
    #[serde(default)]
    pub items: BTreeMap<ItemId, ItemProgress>,

    /// Required-quantity overrides keyed by tree path.
    #[serde(default)]
    pub required_overrides: Vec<RequiredOverride>,

    pub created_at: DateTime<Utc>,

    pub updated_at: DateTime<Utc>,
}

impl Project {
    /// Create a new ProjectBuilder.
    pub fn builder() -> ProjectBuilder {
        ProjectBuilder::new()
    }

    /// Overrides as a path-keyed map for the resolver.
    pub fn override_map(&self) -> BTreeMap<Vec<ItemId>, u64> {
        self.required_overrides
            .iter()
            .map(|o| (o.path.clone(), o.quantity))
            .collect()
    }

    /// Insert or replace the override for `path`.
    pub fn set_override(&mut self, path: Vec<ItemId>, quantity: u64) {
        match self.required_overrides.iter_mut().find(|o| o.path == path) {
            Some(existing) => existing.quantity = quantity,
            None => self.required_overrides.push(RequiredOverride { path, quantity }),
        }
        self.touch();
    }

    /// Bump `updated_at`.
    pub fn touch(&mut self) {
        self.updated_at = Utc::now();
    }

    /// Validate the project's numeric bounds.
    pub fn validate(&self) -> Result<()> {
        if self.name.trim().is_empty() {
            return Err(CraftError::InvalidRequest(
                "Project name cannot be empty".to_string(),
            ));
        }
        if self.target_quantity == 0 {
            return Err(CraftError::invalid_quantity(
                "Target quantity must be greater than zero",
            ));
        }
        if self.max_depth == Some(0) {
            return Err(CraftError::InvalidRequest(
                "Max depth must be greater than zero or unbounded".to_string(),
            ));
        }
        Ok(())
    }
}

/// Payload for creating a project.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProjectDraft {
    pub name: String,
    pub target_recipe_id: ItemId,
    pub target_quantity: u64,
    #[serde(default)]
    pub max_depth: Option<u32>,
}

impl ProjectDraft {
    /// Validate and build the project.
    pub fn into_project(self) -> Result<Project> {
        let mut builder = Project::builder()
            .name(self.name)
            .target(self.target_recipe_id, self.target_quantity);
        if let Some(depth) = self.max_depth {
            builder = builder.max_depth(depth);
        }
        builder.build()
    }
}

/// Builder for creating Projects with a fluent API.
#[derive(Debug, Default)]
pub struct ProjectBuilder {
    name: Option<String>,
    target_recipe_id: Option<ItemId>,
    target_quantity: u64,
    max_depth: Option<u32>,
}

impl ProjectBuilder {
    /// Create a new ProjectBuilder.
    pub fn new() -> Self {
        Self {
            target_quantity: 1,
            ..Self::default()
        }
    }

    /// Set the project name.
    pub fn name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    /// Set the target recipe and quantity.
    pub fn target(mut self, recipe_id: impl Into<ItemId>, quantity: u64) -> Self {
        self.target_recipe_id = Some(recipe_id.into());
        self.target_quantity = quantity;
        self
    }

    /// Bound the expansion depth.
    pub fn max_depth(mut self, depth: u32) -> Self {
        self.max_depth = Some(depth);
        self
    }

    /// Expand without a depth bound.
    pub fn unbounded(mut self) -> Self {
        self.max_depth = None;
        self
    }

    /// Build the Project.
    pub fn build(self) -> Result<Project> {
        let target_recipe_id = self.target_recipe_id.ok_or_else(|| {
            CraftError::InvalidRequest("Project target recipe is required".to_string())
        })?;
        let now = Utc::now();

        let project = Project {
            id: Uuid::new_v4(),
            name: self.name.unwrap_or_else(|| target_recipe_id.to_string()),
            target_recipe_id,
            target_quantity: self.target_quantity,
            max_depth: self.max_depth,
            items: BTreeMap::new(),
            required_overrides: Vec::new(),
            created_at: now,
            updated_at: now,
        };
        project.validate()?;
        Ok(project)
    }
}
