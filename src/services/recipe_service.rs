//! Domain service for the recipe aggregate.
//!
//! A recipe and its tag/ingredient association sets change together: create
//! and update are single atomic operations, and the ingredient list is
//! replaced wholesale rather than patched.

use thiserror::Error;

use crate::db::RecipeDetails;

/// One (ingredient, amount) pair of the submitted list.
#[derive(Debug, Clone)]
pub struct IngredientAmount {
    pub ingredient_id: i32,
    pub amount: i32,
}

/// The full client-submitted recipe state. `image` carries a base64 payload
/// and may be omitted on update to keep the stored image.
#[derive(Debug, Clone)]
pub struct RecipeInput {
    pub name: String,
    pub text: String,
    pub cooking_time: i32,
    pub image: Option<String>,
    pub tag_ids: Vec<i32>,
    pub ingredients: Vec<IngredientAmount>,
}

#[derive(Debug, Clone, Default)]
pub struct RecipeListQuery {
    pub author_id: Option<i32>,
    pub tag_slugs: Vec<String>,
    pub favorited_only: bool,
    pub in_cart_only: bool,
    pub page: u64,
    pub limit: u64,
}

pub struct RecipeListPage {
    pub items: Vec<RecipeDetails>,
    pub total: u64,
}

#[derive(Debug, Error)]
pub enum RecipeError {
    #[error("Validation failed: {0}")]
    Validation(String),

    #[error("Recipe not found: {0}")]
    NotFound(i32),

    #[error("Only the author may modify this recipe")]
    NotAuthor,

    #[error("Database error: {0}")]
    Database(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl From<sea_orm::DbErr> for RecipeError {
    fn from(err: sea_orm::DbErr) -> Self {
        Self::Database(err.to_string())
    }
}

impl From<anyhow::Error> for RecipeError {
    fn from(err: anyhow::Error) -> Self {
        Self::Internal(err.to_string())
    }
}

/// Domain service trait for recipes.
#[async_trait::async_trait]
pub trait RecipeService: Send + Sync {
    /// Validate and persist a new recipe with its associations, atomically.
    async fn create(&self, author_id: i32, input: RecipeInput)
    -> Result<RecipeDetails, RecipeError>;

    /// Replace a recipe's scalar fields and its full association sets,
    /// atomically. Author-only.
    async fn update(
        &self,
        recipe_id: i32,
        editor_id: i32,
        input: RecipeInput,
    ) -> Result<RecipeDetails, RecipeError>;

    /// Delete a recipe and its stored image. Author-only.
    async fn delete(&self, recipe_id: i32, editor_id: i32) -> Result<(), RecipeError>;

    /// Full detail for one recipe, with flags relative to the viewer.
    async fn get(&self, recipe_id: i32, viewer: Option<i32>)
    -> Result<RecipeDetails, RecipeError>;

    /// Newest-first filtered page.
    async fn list(
        &self,
        query: RecipeListQuery,
        viewer: Option<i32>,
    ) -> Result<RecipeListPage, RecipeError>;
}
