//! Change subscriptions for live progress views.

use std::collections::HashMap;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use craftwise_core::ItemId;
use serde::{Deserialize, Serialize};
use tokio::sync::{broadcast, RwLock};
use uuid::Uuid;

/// Something changed that may alter a project's progress view.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProgressEvent {
    /// Affected project. `None` means every project (recipe edits).
    pub project_id: Option<Uuid>,

    /// Type of change.
    pub kind: ChangeKind,

    /// Item whose ledger entry or recipe changed, if any.
    pub item_id: Option<ItemId>,

    /// Ledger version after the change, for ledger writes.
    pub ledger_version: Option<u64>,

    /// Timestamp of the change.
    pub timestamp: DateTime<Utc>,
}

impl ProgressEvent {
    /// A ledger write on one project.
    pub fn ledger(project_id: Uuid, item_id: ItemId, ledger_version: u64) -> Self {
        Self {
            project_id: Some(project_id),
            kind: ChangeKind::LedgerUpdated,
            item_id: Some(item_id),
            ledger_version: Some(ledger_version),
            timestamp: Utc::now(),
        }
    }

    /// A required-quantity override on one project.
    pub fn required(project_id: Uuid, item_id: ItemId) -> Self {
        Self {
            project_id: Some(project_id),
            kind: ChangeKind::RequiredUpdated,
            item_id: Some(item_id),
            ledger_version: None,
            timestamp: Utc::now(),
        }
    }

    /// A project was removed.
    pub fn project_deleted(project_id: Uuid) -> Self {
        Self {
            project_id: Some(project_id),
            kind: ChangeKind::ProjectDeleted,
            item_id: None,
            ledger_version: None,
            timestamp: Utc::now(),
        }
    }

    /// A recipe was created, replaced or removed.
    pub fn recipe(item_id: ItemId) -> Self {
        Self {
            project_id: None,
            kind: ChangeKind::RecipesChanged,
            item_id: Some(item_id),
            ledger_version: None,
            timestamp: Utc::now(),
        }
    }
}

/// Type of change.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum ChangeKind {
    LedgerUpdated,
    RequiredUpdated,
    ProjectDeleted,
    RecipesChanged,
}

/// Filter for subscriptions.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SubscriptionFilter {
    /// Only events for this project (global events always pass).
    pub project_id: Option<Uuid>,

    /// Change kinds to watch.
    pub kinds: Option<Vec<ChangeKind>>,
}

impl SubscriptionFilter {
    /// Create a filter for one project.
    pub fn project(project_id: Uuid) -> Self {
        Self {
            project_id: Some(project_id),
            ..Default::default()
        }
    }

    /// Check if an event matches this filter.
    pub fn matches(&self, event: &ProgressEvent) -> bool {
        if let (Some(wanted), Some(actual)) = (self.project_id, event.project_id) {
            if wanted != actual {
                return false;
            }
        }

        if let Some(ref kinds) = self.kinds {
            if !kinds.contains(&event.kind) {
                return false;
            }
        }

        true
    }
}

/// A subscription to progress changes.
pub struct ProgressSubscription {
    /// Unique ID for this subscription.
    pub id: Uuid,

    /// Filter for this subscription.
    pub filter: SubscriptionFilter,

    /// Receiver for events.
    pub receiver: broadcast::Receiver<ProgressEvent>,
}

impl ProgressSubscription {
    /// Wait for the next event passing the filter.
    ///
    /// Returns `None` once the manager is gone. A lagging receiver gets one
    /// catch-up event standing in for everything it missed.
    pub async fn next(&mut self) -> Option<ProgressEvent> {
        loop {
            match self.receiver.recv().await {
                Ok(event) if self.filter.matches(&event) => return Some(event),
                Ok(_) => continue,
                Err(broadcast::error::RecvError::Lagged(skipped)) => {
                    tracing::warn!(subscription = %self.id, skipped, "subscriber lagged");
                    return Some(ProgressEvent {
                        project_id: self.filter.project_id,
                        kind: ChangeKind::LedgerUpdated,
                        item_id: None,
                        ledger_version: None,
                        timestamp: Utc::now(),
                    });
                }
                Err(broadcast::error::RecvError::Closed) => return None,
            }
        }
    }
}

/// Manager for progress subscriptions.
pub struct SubscriptionManager {
    /// Sender for broadcasting events.
    sender: broadcast::Sender<ProgressEvent>,

    /// Active subscriptions.
    subscriptions: Arc<RwLock<HashMap<Uuid, SubscriptionFilter>>>,
}

impl SubscriptionManager {
    /// Create a new subscription manager.
    pub fn new() -> Self {
        Self::with_capacity(1000)
    }

    /// Create a manager whose channel buffers `capacity` events.
    pub fn with_capacity(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity.max(1));
        Self {
            sender,
            subscriptions: Arc::new(RwLock::new(HashMap::new())),
        }
    }

    /// Subscribe to progress changes with a filter.
    pub async fn subscribe(&self, filter: SubscriptionFilter) -> ProgressSubscription {
        let id = Uuid::new_v4();
        let receiver = self.sender.subscribe();

        let mut subs = self.subscriptions.write().await;
        subs.insert(id, filter.clone());

        ProgressSubscription { id, filter, receiver }
    }

    /// Unsubscribe from progress changes.
    pub async fn unsubscribe(&self, id: Uuid) {
        let mut subs = self.subscriptions.write().await;
        subs.remove(&id);
    }

    /// Publish a change event.
    pub fn publish(&self, event: ProgressEvent) {
        // No receivers is not an error
        let _ = self.sender.send(event);
    }

    /// Get the number of active subscriptions.
    pub async fn subscription_count(&self) -> usize {
        self.subscriptions.read().await.len()
    }
}

impl Default for SubscriptionManager {
    fn default() -> Self {
        Self::new()
    }
}
