//! Project and ledger store implementations.

use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use craftwise_core::{CraftError, ItemId, ItemProgress, LedgerSnapshot, Project, Result};
use tokio::sync::RwLock;
use tracing::{debug, info};
use uuid::Uuid;

/// Trait for project stores.
///
/// The store owns each project's possession ledger. Ledger writes are
/// compare-and-swap on the ledger version.
#[async_trait]
pub trait ProjectStore: Send + Sync {
    /// All projects, newest first.
    async fn list_projects(&self) -> Result<Vec<Project>>;

    /// Get a project by id.
    async fn get_project(&self, id: Uuid) -> Result<Project>;

    /// Insert a new project with an empty ledger.
    async fn create_project(&self, project: Project) -> Result<Project>;

    /// Replace an existing project definition. The ledger is untouched.
    async fn save_project(&self, project: Project) -> Result<Project>;

    /// Store the per-item projection computed from `ledger_version` and the
    /// project definition as of `project_updated_at`.
    ///
    /// Skipped, returning `false`, when either has moved on since. Does not
    /// bump `updated_at`.
    async fn record_items(
        &self,
        id: Uuid,
        items: BTreeMap<ItemId, ItemProgress>,
        ledger_version: u64,
        project_updated_at: DateTime<Utc>,
    ) -> Result<bool>;

    /// Remove a project and its ledger.
    async fn delete_project(&self, id: Uuid) -> Result<()>;

    /// Consistent copy of the project's ledger.
    async fn read_ledger(&self, id: Uuid) -> Result<LedgerSnapshot>;

    /// Set one ledger entry if the ledger is still at `expected_version`.
    ///
    /// Returns the new ledger version.
    async fn write_ledger(
        &self,
        id: Uuid,
        item_id: ItemId,
        quantity: u64,
        expected_version: u64,
    ) -> Result<u64>;
}

#[derive(Debug)]
struct ProjectRecord {
    project: Project,
    ledger: LedgerSnapshot,
}

/// In-memory implementation of ProjectStore.
#[derive(Debug, Clone, Default)]
pub struct InMemoryProjectStore {
    records: Arc<RwLock<HashMap<Uuid, ProjectRecord>>>,
}

impl InMemoryProjectStore {
    /// Create an empty in-memory project store.
    pub fn new() -> Self {
        Self::default()
    }

    fn not_found(id: Uuid) -> CraftError {
        CraftError::ProjectNotFound { id }
    }
}

#[async_trait]
impl ProjectStore for InMemoryProjectStore {
    async fn list_projects(&self) -> Result<Vec<Project>> {
        let records = self.records.read().await;
        let mut projects: Vec<Project> = records.values().map(|r| r.project.clone()).collect();
        projects.sort_by(|a, b| b.created_at.cmp(&a.created_at).then_with(|| a.id.cmp(&b.id)));
        Ok(projects)
    }

    async fn get_project(&self, id: Uuid) -> Result<Project> {
        let records = self.records.read().await;
        records
            .get(&id)
            .map(|r| r.project.clone())
            .ok_or_else(|| Self::not_found(id))
    }

    async fn create_project(&self, project: Project) -> Result<Project> {
        project.validate()?;
        let mut records = self.records.write().await;

        if records.contains_key(&project.id) {
            return Err(CraftError::InvalidRequest(format!(
                "Project {} already exists",
                project.id
            )));
        }

        records.insert(
            project.id,
            ProjectRecord {
                project: project.clone(),
                ledger: LedgerSnapshot::empty(project.id),
            },
        );
        info!(project = %project.id, target = %project.target_recipe_id, "project created");
        Ok(project)
    }

    async fn save_project(&self, project: Project) -> Result<Project> {
        project.validate()?;
        let mut records = self.records.write().await;
        let record = records
            .get_mut(&project.id)
            .ok_or_else(|| Self::not_found(project.id))?;
        record.project = project.clone();
        Ok(project)
    }

    async fn record_items(
        &self,
        id: Uuid,
        items: BTreeMap<ItemId, ItemProgress>,
        ledger_version: u64,
        project_updated_at: DateTime<Utc>,
    ) -> Result<bool> {
        let mut records = self.records.write().await;
        let record = records.get_mut(&id).ok_or_else(|| Self::not_found(id))?;
        if record.ledger.version != ledger_version
            || record.project.updated_at != project_updated_at
        {
            debug!(
                project = %id,
                ledger_version,
                current = record.ledger.version,
                "skipped outdated item projection"
            );
            return Ok(false);
        }
        record.project.items = items;
        Ok(true)
    }

    async fn delete_project(&self, id: Uuid) -> Result<()> {
        let mut records = self.records.write().await;
        records.remove(&id).ok_or_else(|| Self::not_found(id))?;
        info!(project = %id, "project deleted");
        Ok(())
    }

    async fn read_ledger(&self, id: Uuid) -> Result<LedgerSnapshot> {
        let records = self.records.read().await;
        records
            .get(&id)
            .map(|r| r.ledger.clone())
            .ok_or_else(|| Self::not_found(id))
    }

    async fn write_ledger(
        &self,
        id: Uuid,
        item_id: ItemId,
        quantity: u64,
        expected_version: u64,
    ) -> Result<u64> {
        let mut records = self.records.write().await;
        let record = records.get_mut(&id).ok_or_else(|| Self::not_found(id))?;

        let ledger = &mut record.ledger;
        if ledger.version != expected_version {
            return Err(CraftError::Conflict {
                project_id: id,
                expected: expected_version,
                actual: ledger.version,
            });
        }

        debug!(project = %id, item = %item_id, quantity, "ledger write");
        ledger.set(item_id, quantity);
        ledger.version += 1;
        Ok(ledger.version)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn project() -> Project {
        Project::builder()
            .name("Sticks")
            .target("stick", 10)
            .max_depth(5)
            .build()
            .unwrap()
    }

    #[tokio::test]
    async fn test_create_and_get() {
        let store = InMemoryProjectStore::new();
        let created = store.create_project(project()).await.unwrap();

        let fetched = store.get_project(created.id).await.unwrap();
        assert_eq!(fetched.name, "Sticks");

        let ledger = store.read_ledger(created.id).await.unwrap();
        assert_eq!(ledger.project_id, created.id);
        assert_eq!(ledger.version, 0);
        assert!(ledger.is_empty());
    }

    #[tokio::test]
    async fn test_ledger_compare_and_swap() {
        let store = InMemoryProjectStore::new();
        let id = store.create_project(project()).await.unwrap().id;

        let v1 = store.write_ledger(id, "plank".into(), 3, 0).await.unwrap();
        assert_eq!(v1, 1);

        let err = store
            .write_ledger(id, "plank".into(), 4, 0)
            .await
            .unwrap_err();
        assert_eq!(
            err,
            CraftError::Conflict {
                project_id: id,
                expected: 0,
                actual: 1
            }
        );

        let ledger = store.read_ledger(id).await.unwrap();
        assert_eq!(ledger.get(&"plank".into()), 3);
    }

    #[tokio::test]
    async fn test_record_items_keeps_timestamp() {
        let store = InMemoryProjectStore::new();
        let created = store.create_project(project()).await.unwrap();

        let mut items = BTreeMap::new();
        items.insert(ItemId::from("plank"), ItemProgress::new(5, 3));
        let written = store
            .record_items(created.id, items, 0, created.updated_at)
            .await
            .unwrap();
        assert!(written);

        let fetched = store.get_project(created.id).await.unwrap();
        assert_eq!(fetched.items[&ItemId::from("plank")].target_quantity, 2);
        assert_eq!(fetched.updated_at, created.updated_at);
    }

    #[tokio::test]
    async fn test_record_items_skips_outdated_projection() {
        let store = InMemoryProjectStore::new();
        let created = store.create_project(project()).await.unwrap();
        let id = created.id;

        let mut fresh = BTreeMap::new();
        fresh.insert(ItemId::from("plank"), ItemProgress::new(5, 3));
        store.write_ledger(id, "plank".into(), 3, 0).await.unwrap();
        assert!(store
            .record_items(id, fresh, 1, created.updated_at)
            .await
            .unwrap());

        // computed before the ledger write landed
        let mut stale = BTreeMap::new();
        stale.insert(ItemId::from("plank"), ItemProgress::new(5, 0));
        assert!(!store
            .record_items(id, stale.clone(), 0, created.updated_at)
            .await
            .unwrap());

        let mut edited = store.get_project(id).await.unwrap();
        edited.updated_at = created.updated_at + chrono::Duration::seconds(1);
        let edited = store.save_project(edited).await.unwrap();
        assert!(!store
            .record_items(id, stale, 1, created.updated_at)
            .await
            .unwrap());

        let fetched = store.get_project(id).await.unwrap();
        assert_eq!(fetched.items[&ItemId::from("plank")].current_quantity, 3);
        assert_eq!(fetched.updated_at, edited.updated_at);
    }

    #[tokio::test]
    async fn test_delete_removes_ledger() {
        let store = InMemoryProjectStore::new();
        let id = store.create_project(project()).await.unwrap().id;
        store.delete_project(id).await.unwrap();

        assert!(store.get_project(id).await.unwrap_err().is_not_found());
        assert!(store.read_ledger(id).await.is_err());
        assert!(store.write_ledger(id, "plank".into(), 1, 0).await.is_err());
    }
}
