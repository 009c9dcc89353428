//! Recipe API endpoints.

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use craftwise_core::{
    parse_depth_param, parse_quantity_param, CraftError, CraftTreeNode, ItemId, Recipe, RecipeDraft,
};
use craftwise_resolver::{search_recipes, SearchMatch};
use craftwise_store::{ProgressEvent, RecipeStore};
use serde::Deserialize;

use super::ApiResult;
use crate::state::AppState;

/// Query for the recipe search endpoint.
#[derive(Debug, Deserialize)]
pub struct SearchParams {
    #[serde(default)]
    pub q: String,

    pub limit: Option<usize>,
}

/// Query for the preview endpoint.
///
/// Kept as raw strings so malformed numbers get the usual error body.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CalculateParams {
    pub quantity: Option<String>,

    pub max_depth: Option<String>,
}

const DEFAULT_SEARCH_LIMIT: usize = 20;

/// List all recipes.
pub async fn list_recipes(State(state): State<AppState>) -> ApiResult<Json<Vec<Recipe>>> {
    Ok(Json(state.recipes.list_recipes().await?))
}

/// Create a recipe.
pub async fn create_recipe(
    State(state): State<AppState>,
    Json(draft): Json<RecipeDraft>,
) -> ApiResult<(StatusCode, Json<Recipe>)> {
    let recipe = state.recipes.create_recipe(draft.into_recipe()).await?;
    state
        .subscriptions
        .publish(ProgressEvent::recipe(recipe.id.clone()));
    Ok((StatusCode::CREATED, Json(recipe)))
}

/// Get a recipe by id.
pub async fn get_recipe(
    State(state): State<AppState>,
    Path(id): Path<ItemId>,
) -> ApiResult<Json<Recipe>> {
    Ok(Json(state.recipes.get_recipe(&id).await?))
}

/// Replace a recipe. The id in the path wins over any id in the body.
pub async fn update_recipe(
    State(state): State<AppState>,
    Path(id): Path<ItemId>,
    Json(mut draft): Json<RecipeDraft>,
) -> ApiResult<Json<Recipe>> {
    if let Some(body_id) = &draft.id {
        if *body_id != id {
            return Err(CraftError::InvalidRequest(format!(
                "Recipe id {} does not match path id {}",
                body_id, id
            ))
            .into());
        }
    }
    draft.id = Some(id);

    let recipe = state.recipes.update_recipe(draft.into_recipe()).await?;
    state
        .subscriptions
        .publish(ProgressEvent::recipe(recipe.id.clone()));
    Ok(Json(recipe))
}

/// Delete a recipe.
pub async fn delete_recipe(
    State(state): State<AppState>,
    Path(id): Path<ItemId>,
) -> ApiResult<StatusCode> {
    state.recipes.delete_recipe(&id).await?;
    state.subscriptions.publish(ProgressEvent::recipe(id));
    Ok(StatusCode::NO_CONTENT)
}

/// Ranked search over recipe names.
pub async fn search(
    State(state): State<AppState>,
    Query(params): Query<SearchParams>,
) -> ApiResult<Json<Vec<SearchMatch>>> {
    let recipes = state.recipes.list_recipes().await?;
    let limit = params.limit.unwrap_or(DEFAULT_SEARCH_LIMIT);
    Ok(Json(search_recipes(&recipes, &params.q, limit)))
}

/// Ledger-free craft tree preview.
pub async fn calculate(
    State(state): State<AppState>,
    Path(id): Path<ItemId>,
    Query(params): Query<CalculateParams>,
) -> ApiResult<Json<CraftTreeNode>> {
    let quantity = params
        .quantity
        .as_deref()
        .map(parse_quantity_param)
        .transpose()?
        .unwrap_or(1);
    let max_depth = params
        .max_depth
        .as_deref()
        .map(parse_depth_param)
        .transpose()?;
    let tree = state.service.calculate(&id, quantity, max_depth).await?;
    Ok(Json(tree))
}
