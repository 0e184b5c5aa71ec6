use axum::{
    Json,
    extract::{Path, Query, State},
};
use serde::Deserialize;
use std::sync::Arc;

use super::types::IngredientDto;
use super::validation;
use super::{ApiError, ApiResponse, AppState};

#[derive(Debug, Deserialize)]
pub struct IngredientSearchParams {
    /// Name prefix filter.
    pub name: Option<String>,
}

pub async fn list_ingredients(
    State(state): State<Arc<AppState>>,
    Query(params): Query<IngredientSearchParams>,
) -> Result<Json<ApiResponse<Vec<IngredientDto>>>, ApiError> {
    let rows = state
        .store()
        .list_ingredients(params.name.as_deref())
        .await?;

    let dtos: Vec<IngredientDto> = rows
        .into_iter()
        .map(|row| IngredientDto {
            id: row.id,
            name: row.name,
            measurement_unit: row.unit,
        })
        .collect();

    Ok(Json(ApiResponse::success(dtos)))
}

pub async fn get_ingredient(
    State(state): State<Arc<AppState>>,
    Path(id): Path<i32>,
) -> Result<Json<ApiResponse<IngredientDto>>, ApiError> {
    let id = validation::validate_id(id, "ingredient")?;

    let row = state
        .store()
        .get_ingredient(id)
        .await?
        .ok_or_else(|| ApiError::not_found("Ingredient", id))?;

    Ok(Json(ApiResponse::success(IngredientDto {
        id: row.id,
        name: row.name,
        measurement_unit: row.unit,
    })))
}
