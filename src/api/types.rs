use serde::{Deserialize, Serialize};

use crate::db::{IngredientDetailRow, User};
use crate::entities::tags;

#[derive(Debug, Serialize)]
pub struct ApiResponse<T> {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<T>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl<T> ApiResponse<T> {
    pub const fn success(data: T) -> Self {
        Self {
            success: true,
            data: Some(data),
            error: None,
        }
    }

    pub fn error(message: impl Into<String>) -> Self {
        Self {
            success: false,
            data: None,
            error: Some(message.into()),
        }
    }
}

#[derive(Debug, Serialize, Clone)]
pub struct UserDto {
    pub id: i32,
    pub email: String,
    pub username: String,
    pub first_name: String,
    pub last_name: String,
    pub is_subscribed: bool,
}

impl UserDto {
    pub fn from_user(user: &User, is_subscribed: bool) -> Self {
        Self {
            id: user.id,
            email: user.email.clone(),
            username: user.username.clone(),
            first_name: user.first_name.clone(),
            last_name: user.last_name.clone(),
            is_subscribed,
        }
    }
}

/// An author with a (possibly shortened) recipe listing, as returned by the
/// subscriptions endpoints.
#[derive(Debug, Serialize)]
pub struct AuthorWithRecipesDto {
    #[serde(flatten)]
    pub user: UserDto,
    pub recipes: Vec<RecipeSummaryDto>,
    pub recipes_count: u64,
}

#[derive(Debug, Serialize, Clone)]
pub struct TagDto {
    pub id: i32,
    pub name: String,
    pub color: String,
    pub slug: String,
}

impl From<tags::Model> for TagDto {
    fn from(model: tags::Model) -> Self {
        Self {
            id: model.id,
            name: model.name,
            color: model.color,
            slug: model.slug,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct IngredientDto {
    pub id: i32,
    pub name: String,
    pub measurement_unit: String,
}

#[derive(Debug, Serialize)]
pub struct RecipeIngredientDto {
    pub id: i32,
    pub name: String,
    pub measurement_unit: String,
    pub amount: i32,
}

impl From<IngredientDetailRow> for RecipeIngredientDto {
    fn from(row: IngredientDetailRow) -> Self {
        Self {
            id: row.ingredient_id,
            name: row.name,
            measurement_unit: row.unit,
            amount: row.amount,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct RecipeDto {
    pub id: i32,
    pub tags: Vec<TagDto>,
    pub author: UserDto,
    pub ingredients: Vec<RecipeIngredientDto>,
    pub is_favorited: bool,
    pub is_in_shopping_cart: bool,
    pub name: String,
    pub image: String,
    pub text: String,
    pub cooking_time: i32,
}

/// The short recipe form used by toggle responses and subscription listings.
#[derive(Debug, Serialize)]
pub struct RecipeSummaryDto {
    pub id: i32,
    pub name: String,
    pub image: String,
    pub cooking_time: i32,
}

impl From<&crate::entities::recipes::Model> for RecipeSummaryDto {
    fn from(model: &crate::entities::recipes::Model) -> Self {
        Self {
            id: model.id,
            name: model.name.clone(),
            image: image_url(&model.image),
            cooking_time: model.cooking_time,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct RecipeListResponse {
    pub recipes: Vec<RecipeDto>,
    pub total: u64,
}

#[derive(Debug, Deserialize)]
pub struct RecipeIngredientInput {
    pub id: i32,
    pub amount: i32,
}

#[derive(Debug, Deserialize)]
pub struct RecipeRequest {
    pub name: String,
    pub text: String,
    pub cooking_time: i32,
    /// Base64 payload; optional on update.
    pub image: Option<String>,
    pub tags: Vec<i32>,
    pub ingredients: Vec<RecipeIngredientInput>,
}

/// Public URL of a stored image path.
#[must_use]
pub fn image_url(stored: &str) -> String {
    format!("/images/{stored}")
}
