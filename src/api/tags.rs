use axum::{
    Json,
    extract::{Path, State},
};
use std::sync::Arc;

use super::types::TagDto;
use super::validation;
use super::{ApiError, ApiResponse, AppState};

pub async fn list_tags(
    State(state): State<Arc<AppState>>,
) -> Result<Json<ApiResponse<Vec<TagDto>>>, ApiError> {
    let tags = state.store().list_tags().await?;
    let dtos: Vec<TagDto> = tags.into_iter().map(TagDto::from).collect();
    Ok(Json(ApiResponse::success(dtos)))
}

pub async fn get_tag(
    State(state): State<Arc<AppState>>,
    Path(id): Path<i32>,
) -> Result<Json<ApiResponse<TagDto>>, ApiError> {
    let id = validation::validate_id(id, "tag")?;

    let tag = state
        .store()
        .get_tag(id)
        .await?
        .ok_or_else(|| ApiError::not_found("Tag", id))?;

    Ok(Json(ApiResponse::success(TagDto::from(tag))))
}
