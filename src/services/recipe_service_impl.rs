//! `SeaORM` implementation of the `RecipeService` trait.

use std::collections::HashSet;
use std::sync::{Arc, OnceLock};

use async_trait::async_trait;
use regex::Regex;

use crate::constants::limits;
use crate::db::{IngredientAmountRow, RecipeDetails, RecipeFilters, RecipeWrite, Store};
use crate::services::image::ImageService;
use crate::services::recipe_service::{
    RecipeError, RecipeInput, RecipeListPage, RecipeListQuery, RecipeService,
};

pub struct SeaOrmRecipeService {
    store: Store,
    images: Arc<ImageService>,
}

/// Allowed characters of a recipe title: word characters, parentheses,
/// spaces. The leading character is restricted separately.
fn title_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"^[\w() ]+$").expect("valid title regex"))
}

impl SeaOrmRecipeService {
    #[must_use]
    pub const fn new(store: Store, images: Arc<ImageService>) -> Self {
        Self { store, images }
    }

    fn validate_scalars(input: &RecipeInput) -> Result<(), RecipeError> {
        let name = input.name.trim();
        if name.is_empty() {
            return Err(RecipeError::Validation("Recipe name cannot be empty".into()));
        }
        if name.len() > limits::MAX_RECIPE_NAME_LEN {
            return Err(RecipeError::Validation(format!(
                "Recipe name must be {} characters or less",
                limits::MAX_RECIPE_NAME_LEN
            )));
        }
        if !title_regex().is_match(name)
            || name
                .chars()
                .next()
                .is_some_and(|c| c.is_ascii_digit() || matches!(c, '(' | ')' | '_'))
        {
            return Err(RecipeError::Validation(
                "Recipe name may contain letters, numbers, parentheses and spaces, \
                 and cannot start with a number, parenthesis or underscore"
                    .into(),
            ));
        }

        if input.text.trim().is_empty() {
            return Err(RecipeError::Validation(
                "Recipe description cannot be empty".into(),
            ));
        }

        if !(limits::MIN_COOKING_TIME..=limits::MAX_COOKING_TIME).contains(&input.cooking_time) {
            return Err(RecipeError::Validation(format!(
                "Cooking time must be between {} and {} minutes",
                limits::MIN_COOKING_TIME,
                limits::MAX_COOKING_TIME
            )));
        }

        Ok(())
    }

    fn validate_associations(input: &RecipeInput) -> Result<(), RecipeError> {
        if input.tag_ids.is_empty() {
            return Err(RecipeError::Validation(
                "At least one tag is required".into(),
            ));
        }
        let mut seen_tags = HashSet::new();
        for tag_id in &input.tag_ids {
            if !seen_tags.insert(*tag_id) {
                return Err(RecipeError::Validation(format!(
                    "Duplicate tag id: {tag_id}"
                )));
            }
        }

        if input.ingredients.is_empty() {
            return Err(RecipeError::Validation(
                "At least one ingredient is required".into(),
            ));
        }
        let mut seen_ingredients = HashSet::new();
        for item in &input.ingredients {
            if !seen_ingredients.insert(item.ingredient_id) {
                return Err(RecipeError::Validation(format!(
                    "Duplicate ingredient id: {}",
                    item.ingredient_id
                )));
            }
            if !(limits::MIN_INGREDIENT_AMOUNT..=limits::MAX_INGREDIENT_AMOUNT)
                .contains(&item.amount)
            {
                return Err(RecipeError::Validation(format!(
                    "Ingredient amount must be between {} and {}",
                    limits::MIN_INGREDIENT_AMOUNT,
                    limits::MAX_INGREDIENT_AMOUNT
                )));
            }
        }

        Ok(())
    }

    /// Every referenced tag and ingredient must exist; report the missing
    /// ids so the caller can fix the submission.
    async fn validate_references(&self, input: &RecipeInput) -> Result<(), RecipeError> {
        let known_tags = self
            .store
            .get_tags_by_ids(&input.tag_ids)
            .await
            .map_err(|e| RecipeError::Database(e.to_string()))?;
        if known_tags.len() != input.tag_ids.len() {
            let known: HashSet<i32> = known_tags.iter().map(|t| t.id).collect();
            let missing: Vec<String> = input
                .tag_ids
                .iter()
                .filter(|id| !known.contains(id))
                .map(ToString::to_string)
                .collect();
            return Err(RecipeError::Validation(format!(
                "Unknown tag ids: {}",
                missing.join(", ")
            )));
        }

        let ingredient_ids: Vec<i32> = input.ingredients.iter().map(|i| i.ingredient_id).collect();
        let known: HashSet<i32> = self
            .store
            .existing_ingredient_ids(&ingredient_ids)
            .await
            .map_err(|e| RecipeError::Database(e.to_string()))?
            .into_iter()
            .collect();
        if known.len() != ingredient_ids.len() {
            let missing: Vec<String> = ingredient_ids
                .iter()
                .filter(|id| !known.contains(id))
                .map(ToString::to_string)
                .collect();
            return Err(RecipeError::Validation(format!(
                "Unknown ingredient ids: {}",
                missing.join(", ")
            )));
        }

        Ok(())
    }

    async fn validate(&self, input: &RecipeInput) -> Result<(), RecipeError> {
        Self::validate_scalars(input)?;
        Self::validate_associations(input)?;
        self.validate_references(input).await
    }

    fn to_write(input: &RecipeInput, image: Option<String>) -> RecipeWrite {
        RecipeWrite {
            name: input.name.trim().to_string(),
            text: input.text.clone(),
            cooking_time: input.cooking_time,
            image,
            tag_ids: input.tag_ids.clone(),
            ingredients: input
                .ingredients
                .iter()
                .map(|i| IngredientAmountRow {
                    ingredient_id: i.ingredient_id,
                    amount: i.amount,
                })
                .collect(),
        }
    }

    async fn details(
        &self,
        model: crate::entities::recipes::Model,
        viewer: Option<i32>,
    ) -> Result<RecipeDetails, RecipeError> {
        self.store
            .recipe_details(vec![model], viewer)
            .await
            .map_err(|e| RecipeError::Database(e.to_string()))?
            .pop()
            .ok_or_else(|| RecipeError::Internal("Recipe details resolution came back empty".into()))
    }
}

#[async_trait]
impl RecipeService for SeaOrmRecipeService {
    async fn create(
        &self,
        author_id: i32,
        input: RecipeInput,
    ) -> Result<RecipeDetails, RecipeError> {
        self.validate(&input).await?;

        let payload = input
            .image
            .as_deref()
            .ok_or_else(|| RecipeError::Validation("Recipe image is required".into()))?;
        let stored_image = self
            .images
            .save_base64(payload)
            .await
            .map_err(|e| RecipeError::Validation(format!("Invalid image payload: {e}")))?;

        let write = Self::to_write(&input, Some(stored_image.clone()));

        match self.store.create_recipe(author_id, write).await {
            Ok(model) => self.details(model, Some(author_id)).await,
            Err(e) => {
                // The transaction rolled back; drop the orphaned file.
                self.images.remove(&stored_image).await;
                Err(RecipeError::Database(e.to_string()))
            }
        }
    }

    async fn update(
        &self,
        recipe_id: i32,
        editor_id: i32,
        input: RecipeInput,
    ) -> Result<RecipeDetails, RecipeError> {
        let existing = self
            .store
            .get_recipe(recipe_id)
            .await
            .map_err(|e| RecipeError::Database(e.to_string()))?
            .ok_or(RecipeError::NotFound(recipe_id))?;

        if existing.author_id != editor_id {
            return Err(RecipeError::NotAuthor);
        }

        self.validate(&input).await?;

        let new_image = match input.image.as_deref() {
            Some(payload) => Some(
                self.images
                    .save_base64(payload)
                    .await
                    .map_err(|e| RecipeError::Validation(format!("Invalid image payload: {e}")))?,
            ),
            None => None,
        };

        let write = Self::to_write(&input, new_image.clone());

        match self.store.update_recipe(recipe_id, write).await {
            Ok(model) => {
                // Post-write hook: the old image file is unreferenced once the
                // transaction has committed with a replacement.
                if new_image.is_some() && existing.image != model.image {
                    self.images.remove(&existing.image).await;
                }
                self.details(model, Some(editor_id)).await
            }
            Err(e) => {
                if let Some(image) = new_image {
                    self.images.remove(&image).await;
                }
                Err(RecipeError::Database(e.to_string()))
            }
        }
    }

    async fn delete(&self, recipe_id: i32, editor_id: i32) -> Result<(), RecipeError> {
        let existing = self
            .store
            .get_recipe(recipe_id)
            .await
            .map_err(|e| RecipeError::Database(e.to_string()))?
            .ok_or(RecipeError::NotFound(recipe_id))?;

        if existing.author_id != editor_id {
            return Err(RecipeError::NotAuthor);
        }

        self.store
            .remove_recipe(recipe_id)
            .await
            .map_err(|e| RecipeError::Database(e.to_string()))?;

        // Post-write hook, mirroring the image replacement on update.
        self.images.remove(&existing.image).await;

        Ok(())
    }

    async fn get(
        &self,
        recipe_id: i32,
        viewer: Option<i32>,
    ) -> Result<RecipeDetails, RecipeError> {
        let model = self
            .store
            .get_recipe(recipe_id)
            .await
            .map_err(|e| RecipeError::Database(e.to_string()))?
            .ok_or(RecipeError::NotFound(recipe_id))?;

        self.details(model, viewer).await
    }

    async fn list(
        &self,
        query: RecipeListQuery,
        viewer: Option<i32>,
    ) -> Result<RecipeListPage, RecipeError> {
        let mut filters = RecipeFilters {
            author_id: query.author_id,
            ..Default::default()
        };

        if !query.tag_slugs.is_empty() {
            let tag_ids = self
                .store
                .tag_ids_by_slugs(&query.tag_slugs)
                .await
                .map_err(|e| RecipeError::Database(e.to_string()))?;
            if tag_ids.is_empty() {
                return Ok(RecipeListPage {
                    items: Vec::new(),
                    total: 0,
                });
            }
            filters.tag_ids = tag_ids;
        }

        if query.favorited_only {
            match viewer {
                Some(viewer_id) => filters.favorited_by = Some(viewer_id),
                None => {
                    return Ok(RecipeListPage {
                        items: Vec::new(),
                        total: 0,
                    });
                }
            }
        }

        if query.in_cart_only {
            match viewer {
                Some(viewer_id) => filters.in_cart_of = Some(viewer_id),
                None => {
                    return Ok(RecipeListPage {
                        items: Vec::new(),
                        total: 0,
                    });
                }
            }
        }

        let page = self
            .store
            .list_recipes(&filters, query.page, query.limit)
            .await
            .map_err(|e| RecipeError::Database(e.to_string()))?;

        let items = self
            .store
            .recipe_details(page.recipes, viewer)
            .await
            .map_err(|e| RecipeError::Database(e.to_string()))?;

        Ok(RecipeListPage {
            items,
            total: page.total,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::recipe_service::IngredientAmount;

    fn base_input() -> RecipeInput {
        RecipeInput {
            name: "Tea (black) with lime".to_string(),
            text: "Boil water, add tea.".to_string(),
            cooking_time: 5,
            image: Some("aGVsbG8=".to_string()),
            tag_ids: vec![1],
            ingredients: vec![IngredientAmount {
                ingredient_id: 1,
                amount: 1,
            }],
        }
    }

    #[test]
    fn valid_input_passes_scalar_checks() {
        let input = base_input();
        assert!(SeaOrmRecipeService::validate_scalars(&input).is_ok());
        assert!(SeaOrmRecipeService::validate_associations(&input).is_ok());
    }

    #[test]
    fn title_cannot_start_with_digit_or_parenthesis() {
        for bad in ["1 Tea", "(Tea)", "_tea", "42"] {
            let mut input = base_input();
            input.name = bad.to_string();
            assert!(
                SeaOrmRecipeService::validate_scalars(&input).is_err(),
                "expected rejection for {bad:?}"
            );
        }
    }

    #[test]
    fn cooking_time_bounds_are_inclusive() {
        let mut input = base_input();
        input.cooking_time = 0;
        assert!(SeaOrmRecipeService::validate_scalars(&input).is_err());

        input.cooking_time = 1;
        assert!(SeaOrmRecipeService::validate_scalars(&input).is_ok());

        input.cooking_time = 400;
        assert!(SeaOrmRecipeService::validate_scalars(&input).is_ok());

        input.cooking_time = 401;
        assert!(SeaOrmRecipeService::validate_scalars(&input).is_err());
    }

    #[test]
    fn duplicate_ingredient_ids_rejected() {
        let mut input = base_input();
        input.ingredients = vec![
            IngredientAmount {
                ingredient_id: 7,
                amount: 100,
            },
            IngredientAmount {
                ingredient_id: 7,
                amount: 150,
            },
        ];
        assert!(SeaOrmRecipeService::validate_associations(&input).is_err());
    }

    #[test]
    fn zero_amount_rejected_one_accepted() {
        let mut input = base_input();
        input.ingredients[0].amount = 0;
        assert!(SeaOrmRecipeService::validate_associations(&input).is_err());

        input.ingredients[0].amount = 1;
        assert!(SeaOrmRecipeService::validate_associations(&input).is_ok());
    }

    #[test]
    fn empty_association_lists_rejected() {
        let mut input = base_input();
        input.tag_ids.clear();
        assert!(SeaOrmRecipeService::validate_associations(&input).is_err());

        let mut input = base_input();
        input.ingredients.clear();
        assert!(SeaOrmRecipeService::validate_associations(&input).is_err());
    }
}
