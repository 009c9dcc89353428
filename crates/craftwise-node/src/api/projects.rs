//! Project API endpoints.

use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use craftwise_core::{
    parse_depth_value, parse_quantity_value, ItemId, Project, ProjectDraft, ProgressView, Result,
};
use craftwise_store::ProjectStore;
use serde::Deserialize;
use uuid::Uuid;

use super::ApiResult;
use crate::state::AppState;

/// Project creation payload. Numbers are checked before the draft is built.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateProjectRequest {
    pub name: String,

    pub target_recipe_id: ItemId,

    #[serde(default)]
    pub target_quantity: serde_json::Value,

    /// Missing or `null` means unbounded.
    #[serde(default)]
    pub max_depth: serde_json::Value,
}

impl CreateProjectRequest {
    fn into_draft(self) -> Result<ProjectDraft> {
        Ok(ProjectDraft {
            target_quantity: parse_quantity_value(&self.target_quantity)?,
            max_depth: parse_depth_value(&self.max_depth)?,
            name: self.name,
            target_recipe_id: self.target_recipe_id,
        })
    }
}

/// Possession edit addressed by tree path.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateNodeRequest {
    pub path: Vec<ItemId>,

    /// Validated as a non-negative integer before use.
    #[serde(default)]
    pub current_quantity: serde_json::Value,
}

/// Required-quantity override addressed by tree path.
#[derive(Debug, Deserialize)]
pub struct UpdateRequiredRequest {
    pub path: Vec<ItemId>,

    #[serde(default)]
    pub quantity: serde_json::Value,
}

/// Direct ledger edit for one item.
#[derive(Debug, Deserialize)]
pub struct UpdateItemRequest {
    #[serde(default)]
    pub quantity: serde_json::Value,
}

/// List all projects.
pub async fn list_projects(State(state): State<AppState>) -> ApiResult<Json<Vec<Project>>> {
    Ok(Json(state.projects.list_projects().await?))
}

/// Create a project.
pub async fn create_project(
    State(state): State<AppState>,
    Json(req): Json<CreateProjectRequest>,
) -> ApiResult<(StatusCode, Json<Project>)> {
    let project = state.service.create_project(req.into_draft()?).await?;
    Ok((StatusCode::CREATED, Json(project)))
}

/// Get a project by id.
pub async fn get_project(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> ApiResult<Json<Project>> {
    Ok(Json(state.projects.get_project(id).await?))
}

/// Delete a project.
pub async fn delete_project(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> ApiResult<StatusCode> {
    state.service.delete_project(id).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// Current progress view.
pub async fn get_progress(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> ApiResult<Json<ProgressView>> {
    Ok(Json(state.service.progress(id).await?))
}

/// Record possession at a tree position.
pub async fn update_node(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(req): Json<UpdateNodeRequest>,
) -> ApiResult<Json<ProgressView>> {
    let quantity = parse_quantity_value(&req.current_quantity)?;
    Ok(Json(state.service.update_node(id, &req.path, quantity).await?))
}

/// Override the required quantity at a tree position.
pub async fn update_node_required(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(req): Json<UpdateRequiredRequest>,
) -> ApiResult<Json<ProgressView>> {
    let quantity = parse_quantity_value(&req.quantity)?;
    Ok(Json(
        state
            .service
            .update_node_required(id, &req.path, quantity)
            .await?,
    ))
}

/// Set an item's ledger entry directly.
pub async fn update_item(
    State(state): State<AppState>,
    Path((id, item_id)): Path<(Uuid, ItemId)>,
    Json(req): Json<UpdateItemRequest>,
) -> ApiResult<Json<ProgressView>> {
    let quantity = parse_quantity_value(&req.quantity)?;
    Ok(Json(state.service.update_item(id, &item_id, quantity).await?))
}
