use axum::{
    Json,
    extract::{Path, Query, State},
    http::StatusCode,
};
use serde::Deserialize;
use std::collections::HashSet;
use std::sync::Arc;

use super::auth::{CurrentUser, MaybeUser};
use super::types::{
    RecipeDto, RecipeIngredientDto, RecipeListResponse, RecipeRequest, TagDto, UserDto, image_url,
};
use super::validation;
use super::{ApiError, ApiResponse, AppState};
use crate::constants::limits;
use crate::db::RecipeDetails;
use crate::services::{IngredientAmount, RecipeInput, RecipeListQuery};

#[derive(Debug, Deserialize)]
pub struct RecipeListParams {
    pub page: Option<u64>,
    pub limit: Option<u64>,
    pub author: Option<i32>,
    /// Comma-separated tag slugs.
    pub tags: Option<String>,
    pub is_favorited: Option<String>,
    pub is_in_shopping_cart: Option<String>,
}

fn flag_set(value: Option<&str>) -> bool {
    matches!(value, Some("1" | "true"))
}

fn to_input(payload: RecipeRequest) -> RecipeInput {
    RecipeInput {
        name: payload.name,
        text: payload.text,
        cooking_time: payload.cooking_time,
        image: payload.image,
        tag_ids: payload.tags,
        ingredients: payload
            .ingredients
            .into_iter()
            .map(|i| IngredientAmount {
                ingredient_id: i.id,
                amount: i.amount,
            })
            .collect(),
    }
}

/// GET /recipes
pub async fn list_recipes(
    State(state): State<Arc<AppState>>,
    MaybeUser(viewer): MaybeUser,
    Query(params): Query<RecipeListParams>,
) -> Result<Json<ApiResponse<RecipeListResponse>>, ApiError> {
    let page = validation::validate_page(params.page.unwrap_or(1))?;
    let limit = validation::validate_limit(params.limit.unwrap_or(limits::DEFAULT_PAGE_SIZE))?;

    let query = RecipeListQuery {
        author_id: params.author,
        tag_slugs: params
            .tags
            .as_deref()
            .map(|tags| {
                tags.split(',')
                    .map(str::trim)
                    .filter(|s| !s.is_empty())
                    .map(str::to_string)
                    .collect()
            })
            .unwrap_or_default(),
        favorited_only: flag_set(params.is_favorited.as_deref()),
        in_cart_only: flag_set(params.is_in_shopping_cart.as_deref()),
        page,
        limit,
    };

    let viewer_id = viewer.as_ref().map(|u| u.id);
    let page = state.recipes().list(query, viewer_id).await?;

    let recipes = recipe_dtos(&state, page.items, viewer_id).await?;

    Ok(Json(ApiResponse::success(RecipeListResponse {
        recipes,
        total: page.total,
    })))
}

/// GET /recipes/{id}
pub async fn get_recipe(
    State(state): State<Arc<AppState>>,
    MaybeUser(viewer): MaybeUser,
    Path(id): Path<i32>,
) -> Result<Json<ApiResponse<RecipeDto>>, ApiError> {
    let id = validation::validate_id(id, "recipe")?;

    let viewer_id = viewer.as_ref().map(|u| u.id);
    let details = state.recipes().get(id, viewer_id).await?;
    let dto = recipe_dtos(&state, vec![details], viewer_id)
        .await?
        .pop()
        .ok_or_else(|| ApiError::internal("Recipe DTO resolution came back empty"))?;

    Ok(Json(ApiResponse::success(dto)))
}

/// POST /recipes
pub async fn create_recipe(
    State(state): State<Arc<AppState>>,
    CurrentUser(user): CurrentUser,
    Json(payload): Json<RecipeRequest>,
) -> Result<(StatusCode, Json<ApiResponse<RecipeDto>>), ApiError> {
    let details = state
        .recipes()
        .create(user.id, to_input(payload))
        .await?;

    let dto = recipe_dtos(&state, vec![details], Some(user.id))
        .await?
        .pop()
        .ok_or_else(|| ApiError::internal("Recipe DTO resolution came back empty"))?;

    Ok((StatusCode::CREATED, Json(ApiResponse::success(dto))))
}

/// PATCH /recipes/{id} — author only; replaces the association sets.
pub async fn update_recipe(
    State(state): State<Arc<AppState>>,
    CurrentUser(user): CurrentUser,
    Path(id): Path<i32>,
    Json(payload): Json<RecipeRequest>,
) -> Result<Json<ApiResponse<RecipeDto>>, ApiError> {
    let id = validation::validate_id(id, "recipe")?;

    let details = state
        .recipes()
        .update(id, user.id, to_input(payload))
        .await?;

    let dto = recipe_dtos(&state, vec![details], Some(user.id))
        .await?
        .pop()
        .ok_or_else(|| ApiError::internal("Recipe DTO resolution came back empty"))?;

    Ok(Json(ApiResponse::success(dto)))
}

/// DELETE /recipes/{id} — author only.
pub async fn delete_recipe(
    State(state): State<Arc<AppState>>,
    CurrentUser(user): CurrentUser,
    Path(id): Path<i32>,
) -> Result<StatusCode, ApiError> {
    let id = validation::validate_id(id, "recipe")?;

    state.recipes().delete(id, user.id).await?;

    Ok(StatusCode::NO_CONTENT)
}

/// Resolve author subscription flags and assemble wire DTOs for a page of
/// recipe details.
pub async fn recipe_dtos(
    state: &AppState,
    details: Vec<RecipeDetails>,
    viewer: Option<i32>,
) -> Result<Vec<RecipeDto>, ApiError> {
    let followed: HashSet<i32> = match viewer {
        Some(viewer_id) => {
            let author_ids: Vec<i32> = details.iter().map(|d| d.author.id).collect();
            state
                .store()
                .followed_among(viewer_id, &author_ids)
                .await?
                .into_iter()
                .collect()
        }
        None => HashSet::new(),
    };

    Ok(details
        .into_iter()
        .map(|d| RecipeDto {
            id: d.recipe.id,
            tags: d.tags.into_iter().map(TagDto::from).collect(),
            author: UserDto {
                id: d.author.id,
                email: d.author.email,
                username: d.author.username,
                first_name: d.author.first_name,
                last_name: d.author.last_name,
                is_subscribed: followed.contains(&d.author.id),
            },
            ingredients: d
                .ingredients
                .into_iter()
                .map(RecipeIngredientDto::from)
                .collect(),
            is_favorited: d.is_favorited,
            is_in_shopping_cart: d.is_in_shopping_cart,
            name: d.recipe.name,
            image: image_url(&d.recipe.image),
            text: d.recipe.text,
            cooking_time: d.recipe.cooking_time,
        })
        .collect())
}
