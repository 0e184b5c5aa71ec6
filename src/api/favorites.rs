use axum::{
    Json,
    extract::{Path, State},
    http::StatusCode,
};
use std::sync::Arc;

use super::auth::CurrentUser;
use super::types::RecipeSummaryDto;
use super::validation;
use super::{ApiError, ApiResponse, AppState};

/// POST /recipes/{id}/favorite
pub async fn add_favorite(
    State(state): State<Arc<AppState>>,
    CurrentUser(user): CurrentUser,
    Path(id): Path<i32>,
) -> Result<(StatusCode, Json<ApiResponse<RecipeSummaryDto>>), ApiError> {
    let id = validation::validate_id(id, "recipe")?;

    let recipe = state
        .store()
        .get_recipe(id)
        .await?
        .ok_or_else(|| ApiError::recipe_not_found(id))?;

    if !state.store().add_favorite(user.id, recipe.id).await? {
        return Err(ApiError::conflict(format!(
            "{} is already in favorites.",
            recipe.name
        )));
    }

    Ok((
        StatusCode::CREATED,
        Json(ApiResponse::success(RecipeSummaryDto::from(&recipe))),
    ))
}

/// DELETE /recipes/{id}/favorite
pub async fn remove_favorite(
    State(state): State<Arc<AppState>>,
    CurrentUser(user): CurrentUser,
    Path(id): Path<i32>,
) -> Result<StatusCode, ApiError> {
    let id = validation::validate_id(id, "recipe")?;

    let recipe = state
        .store()
        .get_recipe(id)
        .await?
        .ok_or_else(|| ApiError::recipe_not_found(id))?;

    if !state.store().remove_favorite(user.id, recipe.id).await? {
        return Err(ApiError::conflict(format!(
            "User doesn't have {} in favorites.",
            recipe.name
        )));
    }

    Ok(StatusCode::NO_CONTENT)
}
