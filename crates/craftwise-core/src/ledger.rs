//! Possession ledger snapshots.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::recipe::ItemId;

/// A point-in-time copy of a project's per-item possession ledger.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LedgerSnapshot {
    /// Project the ledger belongs to.
    pub project_id: Uuid,

    /// Ledger version at snapshot time.
    pub version: u64,

    /// Units possessed per item.
    pub quantities: BTreeMap<ItemId, u64>,
}

impl LedgerSnapshot {
    /// An empty ledger, as used for previews.
    pub fn empty(project_id: Uuid) -> Self {
        Self {
            project_id,
            ..Self::default()
        }
    }

    /// Units possessed for an item (0 when never recorded).
    pub fn get(&self, item_id: &ItemId) -> u64 {
        self.quantities.get(item_id).copied().unwrap_or(0)
    }

    /// Set the possessed quantity of an item.
    pub fn set(&mut self, item_id: ItemId, quantity: u64) {
        self.quantities.insert(item_id, quantity);
    }

    pub fn len(&self) -> usize {
        self.quantities.len()
    }

    pub fn is_empty(&self) -> bool {
        self.quantities.is_empty()
    }
}

impl FromIterator<(ItemId, u64)> for LedgerSnapshot {
    fn from_iter<T: IntoIterator<Item = (ItemId, u64)>>(iter: T) -> Self {
        Self {
            quantities: iter.into_iter().collect(),
            ..Self::default()
        }
    }
}
