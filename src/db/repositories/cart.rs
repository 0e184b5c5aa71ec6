use anyhow::{Context, Result};
use sea_orm::{
    ColumnTrait, DatabaseConnection, EntityTrait, FromQueryResult, JoinType, PaginatorTrait,
    QueryFilter, QueryOrder, QuerySelect, RelationTrait, Set,
};

use crate::entities::{ingredients, prelude::*, recipe_ingredients, shopping_carts, units};

/// One aggregated shopping-list line: a distinct (ingredient, unit) pair
/// with amounts summed across every recipe in the cart. Plural forms ride
/// along so rendering needs no second lookup.
#[derive(Debug, Clone, FromQueryResult)]
pub struct ShoppingListRow {
    pub name: String,
    pub unit: String,
    pub plural_first: Option<String>,
    pub plural_second: Option<String>,
    pub total: i64,
}

pub struct CartRepository {
    conn: DatabaseConnection,
}

impl CartRepository {
    #[must_use]
    pub const fn new(conn: DatabaseConnection) -> Self {
        Self { conn }
    }

    /// Insert the edge. Returns false when it already exists; the unique
    /// index absorbs concurrent duplicate inserts, so the race loser also
    /// observes false rather than an error.
    pub async fn add(&self, user_id: i32, recipe_id: i32) -> Result<bool> {
        let inserted = ShoppingCarts::insert(shopping_carts::ActiveModel {
            user_id: Set(user_id),
            recipe_id: Set(recipe_id),
            ..Default::default()
        })
        .on_conflict(
            sea_orm::sea_query::OnConflict::columns([
                shopping_carts::Column::UserId,
                shopping_carts::Column::RecipeId,
            ])
            .do_nothing()
            .to_owned(),
        )
        .exec_without_returning(&self.conn)
        .await
        .context("Failed to insert cart entry")?;

        Ok(inserted > 0)
    }

    /// Returns false when there was nothing to remove.
    pub async fn remove(&self, user_id: i32, recipe_id: i32) -> Result<bool> {
        let result = ShoppingCarts::delete_many()
            .filter(shopping_carts::Column::UserId.eq(user_id))
            .filter(shopping_carts::Column::RecipeId.eq(recipe_id))
            .exec(&self.conn)
            .await
            .context("Failed to delete cart entry")?;

        Ok(result.rows_affected > 0)
    }

    pub async fn exists(&self, user_id: i32, recipe_id: i32) -> Result<bool> {
        let count = ShoppingCarts::find()
            .filter(shopping_carts::Column::UserId.eq(user_id))
            .filter(shopping_carts::Column::RecipeId.eq(recipe_id))
            .count(&self.conn)
            .await?;

        Ok(count > 0)
    }

    /// Union all cart recipes' ingredient rows, group by (ingredient, unit),
    /// sum amounts, order by ingredient name. Read-only.
    pub async fn aggregate_for_user(&self, user_id: i32) -> Result<Vec<ShoppingListRow>> {
        let recipe_ids: Vec<i32> = ShoppingCarts::find()
            .filter(shopping_carts::Column::UserId.eq(user_id))
            .all(&self.conn)
            .await?
            .into_iter()
            .map(|m| m.recipe_id)
            .collect();

        if recipe_ids.is_empty() {
            return Ok(Vec::new());
        }

        let rows = RecipeIngredients::find()
            .select_only()
            .column_as(ingredients::Column::Name, "name")
            .column_as(units::Column::Name, "unit")
            .column_as(units::Column::PluralFirst, "plural_first")
            .column_as(units::Column::PluralSecond, "plural_second")
            .column_as(recipe_ingredients::Column::Amount.sum(), "total")
            .join(
                JoinType::InnerJoin,
                recipe_ingredients::Relation::Ingredients.def(),
            )
            .join(JoinType::InnerJoin, ingredients::Relation::Units.def())
            .filter(recipe_ingredients::Column::RecipeId.is_in(recipe_ids))
            .group_by(ingredients::Column::Name)
            .group_by(units::Column::Name)
            .group_by(units::Column::PluralFirst)
            .group_by(units::Column::PluralSecond)
            .order_by_asc(ingredients::Column::Name)
            .order_by_asc(units::Column::Name)
            .into_model::<ShoppingListRow>()
            .all(&self.conn)
            .await
            .context("Failed to aggregate shopping list")?;

        Ok(rows)
    }
}
