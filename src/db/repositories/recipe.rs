use std::collections::{HashMap, HashSet};

use anyhow::{Context, Result};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, DatabaseTransaction, EntityTrait,
    FromQueryResult, JoinType, PaginatorTrait, QueryFilter, QueryOrder, QuerySelect,
    RelationTrait, Set, TransactionTrait,
};

use crate::entities::{
    ingredients, prelude::*, recipe_ingredients, recipe_tags, recipes, tags, units, users,
};

/// Scalar fields plus the full association sets for a create or update.
/// `image` is None on updates that keep the stored image.
#[derive(Debug, Clone)]
pub struct RecipeWrite {
    pub name: String,
    pub text: String,
    pub cooking_time: i32,
    pub image: Option<String>,
    pub tag_ids: Vec<i32>,
    pub ingredients: Vec<IngredientAmountRow>,
}

#[derive(Debug, Clone)]
pub struct IngredientAmountRow {
    pub ingredient_id: i32,
    pub amount: i32,
}

/// One ingredient line of a stored recipe, resolved to catalog names.
#[derive(Debug, Clone, FromQueryResult)]
pub struct IngredientDetailRow {
    pub recipe_id: i32,
    pub ingredient_id: i32,
    pub name: String,
    pub unit: String,
    pub amount: i32,
}

/// A recipe with everything serialization needs.
#[derive(Debug, Clone)]
pub struct RecipeDetails {
    pub recipe: recipes::Model,
    pub author: users::Model,
    pub tags: Vec<tags::Model>,
    pub ingredients: Vec<IngredientDetailRow>,
    pub is_favorited: bool,
    pub is_in_shopping_cart: bool,
}

#[derive(Debug, Clone, Default)]
pub struct RecipeFilters {
    pub author_id: Option<i32>,
    pub tag_ids: Vec<i32>,
    pub favorited_by: Option<i32>,
    pub in_cart_of: Option<i32>,
}

pub struct RecipePage {
    pub recipes: Vec<recipes::Model>,
    pub total: u64,
}

pub struct RecipeRepository {
    conn: DatabaseConnection,
}

impl RecipeRepository {
    #[must_use]
    pub const fn new(conn: DatabaseConnection) -> Self {
        Self { conn }
    }

    /// Insert the recipe and both association sets in one transaction.
    /// Any constraint violation rolls the whole write back.
    pub async fn create(&self, author_id: i32, write: RecipeWrite) -> Result<recipes::Model> {
        let image = write
            .image
            .clone()
            .ok_or_else(|| anyhow::anyhow!("Recipe image is required on create"))?;

        let txn = self.conn.begin().await?;

        let inserted = Recipes::insert(recipes::ActiveModel {
            name: Set(write.name.clone()),
            text: Set(write.text.clone()),
            cooking_time: Set(write.cooking_time),
            image: Set(image),
            author_id: Set(author_id),
            published_at: Set(chrono::Utc::now().to_rfc3339()),
            ..Default::default()
        })
        .exec(&txn)
        .await
        .context("Failed to insert recipe")?;

        let recipe_id = inserted.last_insert_id;
        Self::insert_associations(&txn, recipe_id, &write).await?;

        let model = Recipes::find_by_id(recipe_id)
            .one(&txn)
            .await?
            .ok_or_else(|| anyhow::anyhow!("Failed to read back created recipe"))?;

        txn.commit().await?;
        Ok(model)
    }

    /// Replace scalar fields and both association sets in one transaction.
    /// Full replacement: prior tag links and ingredient rows are deleted,
    /// the submitted sets inserted.
    pub async fn update(&self, recipe_id: i32, write: RecipeWrite) -> Result<recipes::Model> {
        let txn = self.conn.begin().await?;

        let existing = Recipes::find_by_id(recipe_id)
            .one(&txn)
            .await?
            .ok_or_else(|| anyhow::anyhow!("Recipe not found: {recipe_id}"))?;

        let mut active: recipes::ActiveModel = existing.into();
        active.name = Set(write.name.clone());
        active.text = Set(write.text.clone());
        active.cooking_time = Set(write.cooking_time);
        if let Some(image) = &write.image {
            active.image = Set(image.clone());
        }
        let model = active.update(&txn).await.context("Failed to update recipe")?;

        RecipeTags::delete_many()
            .filter(recipe_tags::Column::RecipeId.eq(recipe_id))
            .exec(&txn)
            .await?;

        RecipeIngredients::delete_many()
            .filter(recipe_ingredients::Column::RecipeId.eq(recipe_id))
            .exec(&txn)
            .await?;

        Self::insert_associations(&txn, recipe_id, &write).await?;

        txn.commit().await?;
        Ok(model)
    }

    async fn insert_associations(
        txn: &DatabaseTransaction,
        recipe_id: i32,
        write: &RecipeWrite,
    ) -> Result<()> {
        if !write.tag_ids.is_empty() {
            let links: Vec<recipe_tags::ActiveModel> = write
                .tag_ids
                .iter()
                .map(|tag_id| recipe_tags::ActiveModel {
                    recipe_id: Set(recipe_id),
                    tag_id: Set(*tag_id),
                    ..Default::default()
                })
                .collect();

            RecipeTags::insert_many(links)
                .exec(txn)
                .await
                .context("Failed to insert recipe tags")?;
        }

        if !write.ingredients.is_empty() {
            let rows: Vec<recipe_ingredients::ActiveModel> = write
                .ingredients
                .iter()
                .map(|item| recipe_ingredients::ActiveModel {
                    recipe_id: Set(recipe_id),
                    ingredient_id: Set(item.ingredient_id),
                    amount: Set(item.amount),
                    ..Default::default()
                })
                .collect();

            RecipeIngredients::insert_many(rows)
                .exec(txn)
                .await
                .context("Failed to insert recipe ingredients")?;
        }

        Ok(())
    }

    pub async fn get(&self, id: i32) -> Result<Option<recipes::Model>> {
        let row = Recipes::find_by_id(id)
            .one(&self.conn)
            .await
            .context("Failed to query recipe")?;

        Ok(row)
    }

    /// Association rows cascade at the storage layer.
    pub async fn remove(&self, id: i32) -> Result<bool> {
        let result = Recipes::delete_by_id(id)
            .exec(&self.conn)
            .await
            .context("Failed to delete recipe")?;

        Ok(result.rows_affected > 0)
    }

    /// Newest-first page of recipes matching the filters.
    pub async fn list(&self, filters: &RecipeFilters, page: u64, limit: u64) -> Result<RecipePage> {
        let mut query = Recipes::find();

        if let Some(author_id) = filters.author_id {
            query = query.filter(recipes::Column::AuthorId.eq(author_id));
        }

        if !filters.tag_ids.is_empty() {
            let tagged: Vec<i32> = RecipeTags::find()
                .filter(recipe_tags::Column::TagId.is_in(filters.tag_ids.iter().copied()))
                .all(&self.conn)
                .await?
                .into_iter()
                .map(|m| m.recipe_id)
                .collect();
            query = query.filter(recipes::Column::Id.is_in(tagged));
        }

        if let Some(user_id) = filters.favorited_by {
            let favorited: Vec<i32> = Favorites::find()
                .filter(crate::entities::favorites::Column::UserId.eq(user_id))
                .all(&self.conn)
                .await?
                .into_iter()
                .map(|m| m.recipe_id)
                .collect();
            query = query.filter(recipes::Column::Id.is_in(favorited));
        }

        if let Some(user_id) = filters.in_cart_of {
            let in_cart: Vec<i32> = ShoppingCarts::find()
                .filter(crate::entities::shopping_carts::Column::UserId.eq(user_id))
                .all(&self.conn)
                .await?
                .into_iter()
                .map(|m| m.recipe_id)
                .collect();
            query = query.filter(recipes::Column::Id.is_in(in_cart));
        }

        let paginator = query
            .order_by_desc(recipes::Column::PublishedAt)
            .order_by_desc(recipes::Column::Id)
            .paginate(&self.conn, limit);

        let total = paginator.num_items().await?;
        let recipes = paginator.fetch_page(page.saturating_sub(1)).await?;

        Ok(RecipePage { recipes, total })
    }

    pub async fn count_by_author(&self, author_id: i32) -> Result<u64> {
        let count = Recipes::find()
            .filter(recipes::Column::AuthorId.eq(author_id))
            .count(&self.conn)
            .await?;

        Ok(count)
    }

    pub async fn list_by_author(
        &self,
        author_id: i32,
        limit: Option<u64>,
    ) -> Result<Vec<recipes::Model>> {
        let mut query = Recipes::find()
            .filter(recipes::Column::AuthorId.eq(author_id))
            .order_by_desc(recipes::Column::PublishedAt)
            .order_by_desc(recipes::Column::Id);

        if let Some(limit) = limit {
            query = query.limit(limit);
        }

        let rows = query.all(&self.conn).await?;
        Ok(rows)
    }

    /// Resolve authors, tags, ingredient lines and per-viewer flags for a
    /// page of recipes, preserving input order.
    pub async fn details_for(
        &self,
        models: Vec<recipes::Model>,
        viewer: Option<i32>,
    ) -> Result<Vec<RecipeDetails>> {
        if models.is_empty() {
            return Ok(Vec::new());
        }

        let recipe_ids: Vec<i32> = models.iter().map(|m| m.id).collect();
        let author_ids: Vec<i32> = models.iter().map(|m| m.author_id).collect();

        let authors: HashMap<i32, users::Model> = Users::find()
            .filter(users::Column::Id.is_in(author_ids))
            .all(&self.conn)
            .await?
            .into_iter()
            .map(|u| (u.id, u))
            .collect();

        let tag_links = RecipeTags::find()
            .filter(recipe_tags::Column::RecipeId.is_in(recipe_ids.iter().copied()))
            .all(&self.conn)
            .await?;

        let tag_ids: Vec<i32> = tag_links.iter().map(|l| l.tag_id).collect();
        let tags_by_id: HashMap<i32, tags::Model> = Tags::find()
            .filter(tags::Column::Id.is_in(tag_ids))
            .all(&self.conn)
            .await?
            .into_iter()
            .map(|t| (t.id, t))
            .collect();

        let mut tags_by_recipe: HashMap<i32, Vec<tags::Model>> = HashMap::new();
        for link in tag_links {
            if let Some(tag) = tags_by_id.get(&link.tag_id) {
                tags_by_recipe
                    .entry(link.recipe_id)
                    .or_default()
                    .push(tag.clone());
            }
        }

        let ingredient_rows = RecipeIngredients::find()
            .select_only()
            .column(recipe_ingredients::Column::RecipeId)
            .column(recipe_ingredients::Column::IngredientId)
            .column(recipe_ingredients::Column::Amount)
            .column_as(ingredients::Column::Name, "name")
            .column_as(units::Column::Name, "unit")
            .join(
                JoinType::InnerJoin,
                recipe_ingredients::Relation::Ingredients.def(),
            )
            .join(JoinType::InnerJoin, ingredients::Relation::Units.def())
            .filter(recipe_ingredients::Column::RecipeId.is_in(recipe_ids.iter().copied()))
            .order_by_asc(ingredients::Column::Name)
            .into_model::<IngredientDetailRow>()
            .all(&self.conn)
            .await?;

        let mut ingredients_by_recipe: HashMap<i32, Vec<IngredientDetailRow>> = HashMap::new();
        for row in ingredient_rows {
            ingredients_by_recipe
                .entry(row.recipe_id)
                .or_default()
                .push(row);
        }

        let (favorited, in_cart) = if let Some(viewer_id) = viewer {
            let favorited: HashSet<i32> = Favorites::find()
                .filter(crate::entities::favorites::Column::UserId.eq(viewer_id))
                .filter(
                    crate::entities::favorites::Column::RecipeId
                        .is_in(recipe_ids.iter().copied()),
                )
                .all(&self.conn)
                .await?
                .into_iter()
                .map(|m| m.recipe_id)
                .collect();

            let in_cart: HashSet<i32> = ShoppingCarts::find()
                .filter(crate::entities::shopping_carts::Column::UserId.eq(viewer_id))
                .filter(
                    crate::entities::shopping_carts::Column::RecipeId
                        .is_in(recipe_ids.iter().copied()),
                )
                .all(&self.conn)
                .await?
                .into_iter()
                .map(|m| m.recipe_id)
                .collect();

            (favorited, in_cart)
        } else {
            (HashSet::new(), HashSet::new())
        };

        let mut details = Vec::with_capacity(models.len());
        for model in models {
            let author = authors
                .get(&model.author_id)
                .cloned()
                .ok_or_else(|| anyhow::anyhow!("Missing author for recipe {}", model.id))?;

            details.push(RecipeDetails {
                is_favorited: favorited.contains(&model.id),
                is_in_shopping_cart: in_cart.contains(&model.id),
                tags: tags_by_recipe.remove(&model.id).unwrap_or_default(),
                ingredients: ingredients_by_recipe.remove(&model.id).unwrap_or_default(),
                author,
                recipe: model,
            });
        }

        Ok(details)
    }
}
