use anyhow::{Context, Result};
use sea_orm::{ColumnTrait, DatabaseConnection, EntityTrait, PaginatorTrait, QueryFilter, Set};

use crate::entities::{favorites, prelude::*};

pub struct FavoriteRepository {
    conn: DatabaseConnection,
}

impl FavoriteRepository {
    #[must_use]
    pub const fn new(conn: DatabaseConnection) -> Self {
        Self { conn }
    }

    /// Insert the edge. Returns false when it already exists; the unique
    /// index absorbs concurrent duplicate inserts, so the race loser also
    /// observes false rather than an error.
    pub async fn add(&self, user_id: i32, recipe_id: i32) -> Result<bool> {
        let inserted = Favorites::insert(favorites::ActiveModel {
            user_id: Set(user_id),
            recipe_id: Set(recipe_id),
            ..Default::default()
        })
        .on_conflict(
            sea_orm::sea_query::OnConflict::columns([
                favorites::Column::UserId,
                favorites::Column::RecipeId,
            ])
            .do_nothing()
            .to_owned(),
        )
        .exec_without_returning(&self.conn)
        .await
        .context("Failed to insert favorite")?;

        Ok(inserted > 0)
    }

    /// Returns false when there was nothing to remove.
    pub async fn remove(&self, user_id: i32, recipe_id: i32) -> Result<bool> {
        let result = Favorites::delete_many()
            .filter(favorites::Column::UserId.eq(user_id))
            .filter(favorites::Column::RecipeId.eq(recipe_id))
            .exec(&self.conn)
            .await
            .context("Failed to delete favorite")?;

        Ok(result.rows_affected > 0)
    }

    pub async fn exists(&self, user_id: i32, recipe_id: i32) -> Result<bool> {
        let count = Favorites::find()
            .filter(favorites::Column::UserId.eq(user_id))
            .filter(favorites::Column::RecipeId.eq(recipe_id))
            .count(&self.conn)
            .await?;

        Ok(count > 0)
    }
}
