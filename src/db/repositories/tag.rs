use anyhow::{Context, Result};
use sea_orm::{ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter, QueryOrder, Set};

use crate::entities::{prelude::*, tags};

pub struct TagRepository {
    conn: DatabaseConnection,
}

impl TagRepository {
    #[must_use]
    pub const fn new(conn: DatabaseConnection) -> Self {
        Self { conn }
    }

    pub async fn list(&self) -> Result<Vec<tags::Model>> {
        let rows = Tags::find()
            .order_by_asc(tags::Column::Id)
            .all(&self.conn)
            .await
            .context("Failed to list tags")?;

        Ok(rows)
    }

    pub async fn get(&self, id: i32) -> Result<Option<tags::Model>> {
        let row = Tags::find_by_id(id)
            .one(&self.conn)
            .await
            .context("Failed to query tag")?;

        Ok(row)
    }

    pub async fn get_by_ids(&self, ids: &[i32]) -> Result<Vec<tags::Model>> {
        let rows = Tags::find()
            .filter(tags::Column::Id.is_in(ids.iter().copied()))
            .all(&self.conn)
            .await?;

        Ok(rows)
    }

    pub async fn ids_by_slugs(&self, slugs: &[String]) -> Result<Vec<i32>> {
        let rows = Tags::find()
            .filter(tags::Column::Slug.is_in(slugs.iter().cloned()))
            .all(&self.conn)
            .await?;

        Ok(rows.into_iter().map(|m| m.id).collect())
    }

    /// Catalog import: skip tags whose slug is already taken.
    pub async fn insert(&self, name: &str, color: &str, slug: &str) -> Result<bool> {
        let inserted = Tags::insert(tags::ActiveModel {
            name: Set(name.to_string()),
            color: Set(color.to_string()),
            slug: Set(slug.to_string()),
            ..Default::default()
        })
        .on_conflict(
            sea_orm::sea_query::OnConflict::column(tags::Column::Slug)
                .do_nothing()
                .to_owned(),
        )
        .exec_without_returning(&self.conn)
        .await
        .context("Failed to insert tag")?;

        Ok(inserted > 0)
    }
}
