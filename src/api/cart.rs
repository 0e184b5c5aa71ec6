use axum::{
    Json,
    extract::{Path, State},
    http::{StatusCode, header},
    response::{IntoResponse, Response},
};
use std::sync::Arc;

use super::auth::CurrentUser;
use super::types::RecipeSummaryDto;
use super::validation;
use super::{ApiError, ApiResponse, AppState};

/// POST /recipes/{id}/shopping_cart
pub async fn add_to_cart(
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

    if !state.store().add_to_cart(user.id, recipe.id).await? {
        return Err(ApiError::conflict(format!(
            "{} is already in shopping cart.",
            recipe.name
        )));
    }

    Ok((
        StatusCode::CREATED,
        Json(ApiResponse::success(RecipeSummaryDto::from(&recipe))),
    ))
}

/// DELETE /recipes/{id}/shopping_cart
pub async fn remove_from_cart(
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

    if !state.store().remove_from_cart(user.id, recipe.id).await? {
        return Err(ApiError::conflict(format!(
            "{} is not in the shopping cart.",
            recipe.name
        )));
    }

    Ok(StatusCode::NO_CONTENT)
}

/// GET /recipes/download_shopping_cart
///
/// Aggregates the cart and streams the rendered list as an attachment.
/// Format and empty-cart behavior follow the `[cart]` config section.
pub async fn download_shopping_cart(
    State(state): State<Arc<AppState>>,
    CurrentUser(user): CurrentUser,
) -> Result<Response, ApiError> {
    let rendered = state.shopping_list().render(user.id).await?;

    let headers = [
        (header::CONTENT_TYPE, rendered.content_type.to_string()),
        (
            header::CONTENT_DISPOSITION,
            format!("attachment; filename=\"{}\"", rendered.filename),
        ),
    ];

    Ok((headers, rendered.body).into_response())
}
