//! Application state.

use std::sync::Arc;

use craftwise_core::{Recipe, Result};
use craftwise_resolver::ResolverConfig;
use craftwise_store::{
    InMemoryProjectStore, InMemoryRecipeStore, ProjectStore, RecipeStore, SubscriptionManager,
};

use crate::service::ProgressService;

/// Shared application state.
#[derive(Clone)]
pub struct AppState {
    /// The recipe store.
    pub recipes: Arc<dyn RecipeStore>,

    /// The project and ledger store.
    pub projects: Arc<dyn ProjectStore>,

    /// Change notifications for live progress streams.
    pub subscriptions: Arc<SubscriptionManager>,

    /// Resolution, caching and the node update protocol.
    pub service: Arc<ProgressService>,
}

impl AppState {
    /// Create application state over empty in-memory stores.
    pub fn new(config: ResolverConfig) -> Self {
        Self::with_stores(
            Arc::new(InMemoryRecipeStore::new()),
            Arc::new(InMemoryProjectStore::new()),
            config,
        )
    }

    /// Create application state with in-memory stores preloaded with recipes.
    pub fn seeded(recipes: Vec<Recipe>, config: ResolverConfig) -> Result<Self> {
        Ok(Self::with_stores(
            Arc::new(InMemoryRecipeStore::with_recipes(recipes)?),
            Arc::new(InMemoryProjectStore::new()),
            config,
        ))
    }

    /// Create application state over the given stores.
    pub fn with_stores(
        recipes: Arc<dyn RecipeStore>,
        projects: Arc<dyn ProjectStore>,
        config: ResolverConfig,
    ) -> Self {
        let subscriptions = Arc::new(SubscriptionManager::new());
        let service = Arc::new(ProgressService::new(
            recipes.clone(),
            projects.clone(),
            subscriptions.clone(),
            config,
        ));
        Self {
            recipes,
            projects,
            subscriptions,
            service,
        }
    }
}

impl Default for AppState {
    fn default() -> Self {
        Self::new(ResolverConfig::default())
    }
}
