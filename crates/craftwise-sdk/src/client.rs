//! Craftwise client implementation.

use craftwise_core::{
    CraftError, CraftTreeNode, ItemId, Project, ProjectDraft, ProgressView, Recipe, RecipeDraft,
    Result,
};
use craftwise_resolver::SearchMatch;
use reqwest::{RequestBuilder, Response};
use serde::de::DeserializeOwned;
use serde::Deserialize;
use serde_json::json;
use uuid::Uuid;

use crate::stream::ProgressStream;

/// Client for interacting with a Craftwise node.
#[derive(Clone)]
pub struct CraftClient {
    /// Base URL of the Craftwise node.
    base_url: String,

    /// HTTP client.
    http_client: reqwest::Client,
}

/// Error body returned by the node.
#[derive(Debug, Deserialize)]
struct ErrorBody {
    message: String,
}

impl CraftClient {
    /// Connect to a Craftwise node.
    pub async fn connect(url: &str) -> Result<Self> {
        let base_url = url.trim_end_matches('/').to_string();
        let http_client = reqwest::Client::new();

        // Verify connection with health check
        let health_url = format!("{}/health", base_url);
        http_client
            .get(&health_url)
            .send()
            .await
            .map_err(|e| CraftError::Connection(e.to_string()))?
            .error_for_status()
            .map_err(|e| CraftError::Connection(e.to_string()))?;

        Ok(Self {
            base_url,
            http_client,
        })
    }

    /// Base URL of the node.
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Recipe endpoints.
    pub fn recipes(&self) -> Recipes<'_> {
        Recipes { client: self }
    }

    /// Project endpoints.
    pub fn projects(&self) -> Projects<'_> {
        Projects { client: self }
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    async fn send(&self, request: RequestBuilder) -> Result<Response> {
        let response = request
            .send()
            .await
            .map_err(|e| CraftError::Connection(e.to_string()))?;

        if response.status().is_success() {
            return Ok(response);
        }

        let status = response.status().as_u16();
        let text = response.text().await.unwrap_or_default();
        let message = serde_json::from_str::<ErrorBody>(&text)
            .map(|body| body.message)
            .unwrap_or(text);
        Err(CraftError::Api { status, message })
    }

    async fn json<T: DeserializeOwned>(&self, request: RequestBuilder) -> Result<T> {
        self.send(request)
            .await?
            .json()
            .await
            .map_err(|e| CraftError::Serialization(e.to_string()))
    }

    async fn empty(&self, request: RequestBuilder) -> Result<()> {
        self.send(request).await?;
        Ok(())
    }
}

/// Recipe endpoints of a [`CraftClient`].
pub struct Recipes<'a> {
    client: &'a CraftClient,
}

impl Recipes<'_> {
    /// List all recipes.
    pub async fn list(&self) -> Result<Vec<Recipe>> {
        let c = self.client;
        c.json(c.http_client.get(c.url("/recipes"))).await
    }

    /// Get a recipe by id.
    pub async fn get(&self, id: &ItemId) -> Result<Recipe> {
        let c = self.client;
        c.json(c.http_client.get(c.url(&format!("/recipes/{}", id))))
            .await
    }

    /// Create a recipe.
    pub async fn create(&self, draft: &RecipeDraft) -> Result<Recipe> {
        let c = self.client;
        c.json(c.http_client.post(c.url("/recipes")).json(draft))
            .await
    }

    /// Replace a recipe.
    pub async fn update(&self, id: &ItemId, draft: &RecipeDraft) -> Result<Recipe> {
        let c = self.client;
        c.json(
            c.http_client
                .put(c.url(&format!("/recipes/{}", id)))
                .json(draft),
        )
        .await
    }

    /// Delete a recipe.
    pub async fn delete(&self, id: &ItemId) -> Result<()> {
        let c = self.client;
        c.empty(c.http_client.delete(c.url(&format!("/recipes/{}", id))))
            .await
    }

    /// Ranked search over recipe names.
    pub async fn search(&self, query: &str, limit: Option<usize>) -> Result<Vec<SearchMatch>> {
        let c = self.client;
        let mut request = c.http_client.get(c.url("/recipes/search")).query(&[("q", query)]);
        if let Some(limit) = limit {
            request = request.query(&[("limit", limit)]);
        }
        c.json(request).await
    }

    /// Ledger-free craft tree preview.
    pub async fn calculate(
        &self,
        id: &ItemId,
        quantity: u64,
        max_depth: Option<u32>,
    ) -> Result<CraftTreeNode> {
        let c = self.client;
        let mut request = c
            .http_client
            .get(c.url(&format!("/recipes/{}/calculate", id)))
            .query(&[("quantity", quantity)]);
        if let Some(depth) = max_depth {
            request = request.query(&[("maxDepth", depth)]);
        }
        c.json(request).await
    }
}

/// Project endpoints of a [`CraftClient`].
pub struct Projects<'a> {
    client: &'a CraftClient,
}

impl Projects<'_> {
    /// List all projects.
    pub async fn list(&self) -> Result<Vec<Project>> {
        let c = self.client;
        c.json(c.http_client.get(c.url("/projects"))).await
    }

    /// Get a project by id.
    pub async fn get(&self, id: Uuid) -> Result<Project> {
        let c = self.client;
        c.json(c.http_client.get(c.url(&format!("/projects/{}", id))))
            .await
    }

    /// Create a project.
    pub async fn create(&self, draft: &ProjectDraft) -> Result<Project> {
        let c = self.client;
        c.json(c.http_client.post(c.url("/projects")).json(draft))
            .await
    }

    /// Delete a project.
    pub async fn delete(&self, id: Uuid) -> Result<()> {
        let c = self.client;
        c.empty(c.http_client.delete(c.url(&format!("/projects/{}", id))))
            .await
    }

    /// Current progress view.
    pub async fn progress(&self, id: Uuid) -> Result<ProgressView> {
        let c = self.client;
        c.json(c.http_client.get(c.url(&format!("/projects/{}/progress", id))))
            .await
    }

    /// Record possession at a tree position.
    pub async fn update_node(
        &self,
        id: Uuid,
        path: &[ItemId],
        current_quantity: u64,
    ) -> Result<ProgressView> {
        let c = self.client;
        let body = json!({ "path": path, "currentQuantity": current_quantity });
        c.json(
            c.http_client
                .put(c.url(&format!("/projects/{}/nodes", id)))
                .json(&body),
        )
        .await
    }

    /// Override the required quantity at a tree position.
    pub async fn update_node_required(
        &self,
        id: Uuid,
        path: &[ItemId],
        quantity: u64,
    ) -> Result<ProgressView> {
        let c = self.client;
        let body = json!({ "path": path, "quantity": quantity });
        c.json(
            c.http_client
                .put(c.url(&format!("/projects/{}/nodes/required", id)))
                .json(&body),
        )
        .await
    }

    /// Set an item's ledger entry directly.
    pub async fn update_item(&self, id: Uuid, item_id: &ItemId, quantity: u64) -> Result<ProgressView> {
        let c = self.client;
        c.json(
            c.http_client
                .put(c.url(&format!("/projects/{}/items/{}", id, item_id)))
                .json(&json!({ "quantity": quantity })),
        )
        .await
    }

    /// Open the live progress stream of a project.
    pub async fn watch(&self, id: Uuid) -> Result<ProgressStream> {
        let ws_url = format!(
            "{}/ws/projects/{}/progress",
            self.client
                .base_url
                .replace("http://", "ws://")
                .replace("https://", "wss://"),
            id
        );
        ProgressStream::connect(&ws_url, id).await
    }
}
