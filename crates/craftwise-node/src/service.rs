//! Progress service.
//!
//! Reads go through the resolver and aggregator over fresh store snapshots,
//! with the last view per project cached until the recipe store, the
//! project's ledger or the project definition changes.
//!
//! Every mutation of a project holds that project's lock for the whole
//! read, validate, write and re-resolve cycle, and the ledger write itself is
//! compare-and-swap on the version read at the start of the cycle.

use std::collections::HashMap;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use craftwise_core::{
    CraftError, CraftTreeNode, ItemId, LedgerSnapshot, Project, ProjectDraft, ProgressView,
    Result,
};
use craftwise_resolver::path::display_path;
use craftwise_resolver::{annotate, locate, plan_node_edit, Requirements, ResolverConfig, TreeResolver};
use craftwise_store::{ProgressEvent, ProjectStore, RecipeStore, SubscriptionManager};
use tokio::sync::{Mutex, RwLock};
use tracing::{debug, info, warn};
use uuid::Uuid;

/// Store versions a cached view was computed from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct ViewKey {
    recipes: u64,
    ledger: u64,
    project: DateTime<Utc>,
}

struct CachedView {
    key: ViewKey,
    view: ProgressView,
}

/// Resolves, caches and mutates project progress.
pub struct ProgressService {
    recipes: Arc<dyn RecipeStore>,
    projects: Arc<dyn ProjectStore>,
    subscriptions: Arc<SubscriptionManager>,
    resolver: TreeResolver,

    /// One mutation lock per project.
    locks: Mutex<HashMap<Uuid, Arc<Mutex<()>>>>,

    views: RwLock<HashMap<Uuid, CachedView>>,
}

impl ProgressService {
    /// Create a new progress service.
    pub fn new(
        recipes: Arc<dyn RecipeStore>,
        projects: Arc<dyn ProjectStore>,
        subscriptions: Arc<SubscriptionManager>,
        config: ResolverConfig,
    ) -> Self {
        Self {
            recipes,
            projects,
            subscriptions,
            resolver: TreeResolver::with_config(config),
            locks: Mutex::new(HashMap::new()),
            views: RwLock::new(HashMap::new()),
        }
    }

    pub fn resolver(&self) -> &TreeResolver {
        &self.resolver
    }

    async fn project_lock(&self, id: Uuid) -> Arc<Mutex<()>> {
        let mut locks = self.locks.lock().await;
        locks.entry(id).or_default().clone()
    }

    async fn invalidate(&self, id: Uuid) {
        self.views.write().await.remove(&id);
    }

    /// Current progress view of a project.
    pub async fn progress(&self, id: Uuid) -> Result<ProgressView> {
        let project = self.projects.get_project(id).await?;
        let ledger = self.projects.read_ledger(id).await?;
        self.view_for(&project, &ledger).await
    }

    async fn view_for(&self, project: &Project, ledger: &LedgerSnapshot) -> Result<ProgressView> {
        let key = ViewKey {
            recipes: self.recipes.version().await,
            ledger: ledger.version,
            project: project.updated_at,
        };

        if let Some(cached) = self.views.read().await.get(&project.id) {
            if cached.key == key {
                debug!(project = %project.id, "progress view cache hit");
                return Ok(cached.view.clone());
            }
        }

        let graph = self.recipes.recipe_graph().await?;
        let view = self.resolver.progress(&graph, project, ledger)?;
        let recorded = self
            .projects
            .record_items(
                project.id,
                view.flat_summary.clone(),
                ledger.version,
                project.updated_at,
            )
            .await?;
        if !recorded {
            // a mutation landed after this read's snapshot
            return Ok(view);
        }

        let key = ViewKey {
            recipes: graph.version(),
            ..key
        };
        self.views.write().await.insert(
            project.id,
            CachedView {
                key,
                view: view.clone(),
            },
        );
        Ok(view)
    }

    /// Snapshot everything a mutation needs: project, ledger and a fresh tree.
    async fn fresh_tree(&self, id: Uuid) -> Result<(Project, LedgerSnapshot, CraftTreeNode)> {
        let project = self.projects.get_project(id).await?;
        let ledger = self.projects.read_ledger(id).await?;
        let graph = self.recipes.recipe_graph().await?;
        let tree = self.resolver.resolve_project(&graph, &project)?;
        Ok((project, ledger, tree))
    }

    async fn write_entry(&self, ledger: &LedgerSnapshot, item_id: ItemId, quantity: u64) -> Result<()> {
        let project_id = ledger.project_id;
        if ledger.get(&item_id) == quantity {
            debug!(project = %project_id, item = %item_id, quantity, "ledger entry unchanged");
            return Ok(());
        }

        let version = self
            .projects
            .write_ledger(project_id, item_id.clone(), quantity, ledger.version)
            .await?;
        self.invalidate(project_id).await;

        info!(project = %project_id, item = %item_id, quantity, version, "ledger updated");
        self.subscriptions
            .publish(ProgressEvent::ledger(project_id, item_id, version));
        Ok(())
    }

    /// Record possession at a tree position.
    ///
    /// The value is clamped to the node's required quantity and written to the
    /// ledger entry of the node's item, so every position of that item moves.
    pub async fn update_node(&self, id: Uuid, path: &[ItemId], requested: u64) -> Result<ProgressView> {
        let lock = self.project_lock(id).await;
        let _guard = lock.lock().await;

        let (_, ledger, tree) = self.fresh_tree(id).await?;
        let edit = match plan_node_edit(&tree, path, requested) {
            Ok(edit) => edit,
            Err(err) => {
                warn!(project = %id, path = %display_path(path), "rejected node edit: {}", err);
                return Err(err);
            }
        };

        if edit.was_clamped() {
            debug!(
                project = %id,
                item = %edit.item_id,
                requested = edit.requested,
                stored = edit.stored,
                "node edit clamped"
            );
        }

        self.write_entry(&ledger, edit.item_id, edit.stored).await?;
        self.progress(id).await
    }

    /// Override the required quantity at a tree position.
    pub async fn update_node_required(
        &self,
        id: Uuid,
        path: &[ItemId],
        quantity: u64,
    ) -> Result<ProgressView> {
        let lock = self.project_lock(id).await;
        let _guard = lock.lock().await;

        let (mut project, _, tree) = self.fresh_tree(id).await?;
        let item_id = match locate(&tree, path) {
            Ok(node) => node.item_id.clone(),
            Err(err) => {
                warn!(project = %id, path = %display_path(path), "rejected required edit: {}", err);
                return Err(err);
            }
        };

        project.set_override(path.to_vec(), quantity);
        self.projects.save_project(project).await?;
        self.invalidate(id).await;

        info!(project = %id, path = %display_path(path), quantity, "required quantity overridden");
        self.subscriptions.publish(ProgressEvent::required(id, item_id));
        self.progress(id).await
    }

    /// Set an item's ledger entry directly, clamped to its total requirement.
    pub async fn update_item(&self, id: Uuid, item_id: &ItemId, requested: u64) -> Result<ProgressView> {
        let lock = self.project_lock(id).await;
        let _guard = lock.lock().await;

        let (_, ledger, tree) = self.fresh_tree(id).await?;
        let requirements = Requirements::collect(&tree)?;
        if !requirements.items().any(|item| item == item_id) {
            warn!(project = %id, item = %item_id, "rejected item edit: not in tree");
            return Err(CraftError::NodeNotFound {
                path: vec![item_id.clone()],
            });
        }

        let stored = requested.min(requirements.total(item_id));
        self.write_entry(&ledger, item_id.clone(), stored).await?;
        self.progress(id).await
    }

    /// Ledger-free preview of a target.
    pub async fn calculate(
        &self,
        target: &ItemId,
        quantity: u64,
        max_depth: Option<u32>,
    ) -> Result<CraftTreeNode> {
        if quantity == 0 {
            return Err(CraftError::invalid_quantity(
                "Preview quantity must be greater than zero",
            ));
        }
        let graph = self.recipes.recipe_graph().await?;
        self.resolver.calculate(&graph, target, quantity, max_depth)
    }

    /// Validate a draft against the recipe graph and store it.
    ///
    /// The stored project starts with its item projection filled in against an
    /// empty ledger.
    pub async fn create_project(&self, draft: ProjectDraft) -> Result<Project> {
        let mut project = draft.into_project()?;
        let graph = self.recipes.recipe_graph().await?;
        let tree = self.resolver.resolve_project(&graph, &project)?;
        project.items = annotate(tree, &LedgerSnapshot::empty(project.id))?.flat_summary;

        let project = self.projects.create_project(project).await?;
        info!(
            project = %project.id,
            target = %project.target_recipe_id,
            quantity = project.target_quantity,
            "📦 project created"
        );
        Ok(project)
    }

    /// Delete a project and drop its cached state.
    pub async fn delete_project(&self, id: Uuid) -> Result<()> {
        let lock = self.project_lock(id).await;
        {
            let _guard = lock.lock().await;
            self.projects.delete_project(id).await?;
            self.invalidate(id).await;
        }
        self.locks.lock().await.remove(&id);

        self.subscriptions.publish(ProgressEvent::project_deleted(id));
        Ok(())
    }
}
