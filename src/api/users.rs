use axum::{
    Json,
    extract::{Path, Query, State},
    http::StatusCode,
};
use serde::Deserialize;
use std::sync::Arc;

use super::auth::{CurrentUser, MaybeUser};
use super::types::{AuthorWithRecipesDto, RecipeSummaryDto, UserDto};
use super::validation;
use super::{ApiError, ApiResponse, AppState};
use crate::constants::limits;
use crate::db::{NewUser, User};

#[derive(Debug, Deserialize)]
pub struct RegisterRequest {
    pub email: String,
    pub username: String,
    pub first_name: String,
    pub last_name: String,
    pub password: String,
}

#[derive(Debug, Deserialize)]
pub struct SetPasswordRequest {
    pub new_password: String,
    pub current_password: String,
}

#[derive(Debug, Deserialize)]
pub struct ListParams {
    pub page: Option<u64>,
    pub limit: Option<u64>,
    /// Cap on recipes embedded per author in subscription listings.
    pub recipes_limit: Option<u64>,
}

/// POST /users — open registration.
pub async fn register(
    State(state): State<Arc<AppState>>,
    Json(payload): Json<RegisterRequest>,
) -> Result<(StatusCode, Json<ApiResponse<UserDto>>), ApiError> {
    let email = validation::validate_email(&payload.email)?;
    let username = validation::validate_username(&payload.username)?;
    validation::validate_name_field(&payload.first_name, "First name")?;
    validation::validate_name_field(&payload.last_name, "Last name")?;
    validation::validate_password(&payload.password)?;

    if state.store().user_email_exists(email).await? {
        return Err(ApiError::conflict("A user with that email already exists."));
    }
    // Case-insensitive: "Chef" and "chef" are the same account name.
    if state.store().username_exists(username).await? {
        return Err(ApiError::conflict(
            "A user with that username already exists.",
        ));
    }

    let security = state.config().read().await.security.clone();
    let user = state
        .store()
        .create_user(
            NewUser {
                email: email.to_string(),
                username: username.to_string(),
                first_name: payload.first_name.clone(),
                last_name: payload.last_name.clone(),
                password: payload.password,
            },
            &security,
        )
        .await?;

    Ok((
        StatusCode::CREATED,
        Json(ApiResponse::success(UserDto::from_user(&user, false))),
    ))
}

/// GET /users — public listing with per-viewer subscription flags.
pub async fn list_users(
    State(state): State<Arc<AppState>>,
    MaybeUser(viewer): MaybeUser,
    Query(params): Query<ListParams>,
) -> Result<Json<ApiResponse<Vec<UserDto>>>, ApiError> {
    let page = validation::validate_page(params.page.unwrap_or(1))?;
    let limit = validation::validate_limit(params.limit.unwrap_or(limits::DEFAULT_PAGE_SIZE))?;

    let users = state.store().list_users(page, limit).await?;
    let dtos = with_subscription_flags(&state, users, viewer.as_ref()).await?;

    Ok(Json(ApiResponse::success(dtos)))
}

/// GET /users/me
pub async fn me(
    CurrentUser(user): CurrentUser,
) -> Result<Json<ApiResponse<UserDto>>, ApiError> {
    Ok(Json(ApiResponse::success(UserDto::from_user(&user, false))))
}

/// GET /users/{id}
pub async fn get_user(
    State(state): State<Arc<AppState>>,
    MaybeUser(viewer): MaybeUser,
    Path(id): Path<i32>,
) -> Result<Json<ApiResponse<UserDto>>, ApiError> {
    let id = validation::validate_id(id, "user")?;

    let user = state
        .store()
        .get_user(id)
        .await?
        .ok_or_else(|| ApiError::user_not_found(id))?;

    let is_subscribed = match viewer.as_ref() {
        Some(viewer) => state.store().is_subscribed(viewer.id, user.id).await?,
        None => false,
    };

    Ok(Json(ApiResponse::success(UserDto::from_user(
        &user,
        is_subscribed,
    ))))
}

/// POST /users/set_password
pub async fn set_password(
    State(state): State<Arc<AppState>>,
    CurrentUser(user): CurrentUser,
    Json(payload): Json<SetPasswordRequest>,
) -> Result<StatusCode, ApiError> {
    validation::validate_password(&payload.new_password)?;

    if payload.current_password == payload.new_password {
        return Err(ApiError::validation(
            "New password must be different from current password",
        ));
    }

    let verified = state
        .store()
        .verify_user_password(&user.email, &payload.current_password)
        .await
        .map_err(|e| ApiError::internal(format!("Password verification error: {e}")))?;

    if verified.is_none() {
        return Err(ApiError::validation("Invalid password."));
    }

    let security = state.config().read().await.security.clone();
    state
        .store()
        .update_user_password(user.id, &payload.new_password, &security)
        .await
        .map_err(|e| ApiError::internal(format!("Failed to update password: {e}")))?;

    tracing::info!("Password changed for user: {}", user.username);

    Ok(StatusCode::NO_CONTENT)
}

/// GET /users/subscriptions — the authors the caller follows, each with
/// a (possibly shortened) recipe listing and a total recipe count.
pub async fn subscriptions(
    State(state): State<Arc<AppState>>,
    CurrentUser(user): CurrentUser,
    Query(params): Query<ListParams>,
) -> Result<Json<ApiResponse<Vec<AuthorWithRecipesDto>>>, ApiError> {
    let page = validation::validate_page(params.page.unwrap_or(1))?;
    let limit = validation::validate_limit(params.limit.unwrap_or(limits::DEFAULT_PAGE_SIZE))?;

    let author_ids = state
        .store()
        .subscribed_author_ids(user.id, page, limit)
        .await?;

    let authors = state.store().get_users_by_ids(&author_ids).await?;

    let mut dtos = Vec::with_capacity(authors.len());
    for author in authors {
        dtos.push(author_with_recipes(&state, &author, true, params.recipes_limit).await?);
    }

    Ok(Json(ApiResponse::success(dtos)))
}

/// POST /users/{id}/subscribe
pub async fn subscribe(
    State(state): State<Arc<AppState>>,
    CurrentUser(user): CurrentUser,
    Path(id): Path<i32>,
    Query(params): Query<ListParams>,
) -> Result<(StatusCode, Json<ApiResponse<AuthorWithRecipesDto>>), ApiError> {
    let author_id = validation::validate_id(id, "user")?;

    let author = state
        .store()
        .get_user(author_id)
        .await?
        .ok_or_else(|| ApiError::user_not_found(author_id))?;

    if user.id == author.id {
        return Err(ApiError::conflict("Subscribing to yourself not allowed."));
    }

    if !state.store().subscribe(user.id, author.id).await? {
        return Err(ApiError::conflict(format!(
            "You are already subscribed to {}.",
            author.username
        )));
    }

    let dto = author_with_recipes(&state, &author, true, params.recipes_limit).await?;
    Ok((StatusCode::CREATED, Json(ApiResponse::success(dto))))
}

/// DELETE /users/{id}/subscribe
pub async fn unsubscribe(
    State(state): State<Arc<AppState>>,
    CurrentUser(user): CurrentUser,
    Path(id): Path<i32>,
) -> Result<StatusCode, ApiError> {
    let author_id = validation::validate_id(id, "user")?;

    let author = state
        .store()
        .get_user(author_id)
        .await?
        .ok_or_else(|| ApiError::user_not_found(author_id))?;

    if !state.store().unsubscribe(user.id, author.id).await? {
        return Err(ApiError::conflict(format!(
            "You are not subscribed to {}.",
            author.username
        )));
    }

    Ok(StatusCode::NO_CONTENT)
}

async fn author_with_recipes(
    state: &AppState,
    author: &User,
    is_subscribed: bool,
    recipes_limit: Option<u64>,
) -> Result<AuthorWithRecipesDto, ApiError> {
    let recipes = state
        .store()
        .recipes_by_author(author.id, recipes_limit)
        .await?;
    let recipes_count = state.store().recipe_count_by_author(author.id).await?;

    Ok(AuthorWithRecipesDto {
        user: UserDto::from_user(author, is_subscribed),
        recipes: recipes.iter().map(RecipeSummaryDto::from).collect(),
        recipes_count,
    })
}

async fn with_subscription_flags(
    state: &AppState,
    users: Vec<User>,
    viewer: Option<&User>,
) -> Result<Vec<UserDto>, ApiError> {
    let followed: std::collections::HashSet<i32> = match viewer {
        Some(viewer) => {
            let ids: Vec<i32> = users.iter().map(|u| u.id).collect();
            state
                .store()
                .followed_among(viewer.id, &ids)
                .await?
                .into_iter()
                .collect()
        }
        None => std::collections::HashSet::new(),
    };

    Ok(users
        .iter()
        .map(|u| UserDto::from_user(u, followed.contains(&u.id)))
        .collect())
}
