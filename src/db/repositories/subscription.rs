use anyhow::{Context, Result};
use sea_orm::{
    ColumnTrait, DatabaseConnection, EntityTrait, PaginatorTrait, QueryFilter, QueryOrder, Set,
};

use crate::entities::{prelude::*, subscriptions};

pub struct SubscriptionRepository {
    conn: DatabaseConnection,
}

impl SubscriptionRepository {
    #[must_use]
    pub const fn new(conn: DatabaseConnection) -> Self {
        Self { conn }
    }

    /// Insert the follow edge. Returns false when the edge already exists;
    /// the unique index absorbs concurrent duplicate inserts, so the race
    /// loser also observes false rather than an error.
    pub async fn add(&self, user_id: i32, author_id: i32) -> Result<bool> {
        let inserted = Subscriptions::insert(subscriptions::ActiveModel {
            user_id: Set(user_id),
            author_id: Set(author_id),
            created_at: Set(chrono::Utc::now().to_rfc3339()),
            ..Default::default()
        })
        .on_conflict(
            sea_orm::sea_query::OnConflict::columns([
                subscriptions::Column::UserId,
                subscriptions::Column::AuthorId,
            ])
            .do_nothing()
            .to_owned(),
        )
        .exec_without_returning(&self.conn)
        .await
        .context("Failed to insert subscription")?;

        Ok(inserted > 0)
    }

    /// Remove the follow edge. Returns false when there was nothing to remove.
    pub async fn remove(&self, user_id: i32, author_id: i32) -> Result<bool> {
        let result = Subscriptions::delete_many()
            .filter(subscriptions::Column::UserId.eq(user_id))
            .filter(subscriptions::Column::AuthorId.eq(author_id))
            .exec(&self.conn)
            .await
            .context("Failed to delete subscription")?;

        Ok(result.rows_affected > 0)
    }

    pub async fn exists(&self, user_id: i32, author_id: i32) -> Result<bool> {
        let count = Subscriptions::find()
            .filter(subscriptions::Column::UserId.eq(user_id))
            .filter(subscriptions::Column::AuthorId.eq(author_id))
            .count(&self.conn)
            .await?;

        Ok(count > 0)
    }

    /// Authors the user follows, newest subscription first.
    pub async fn author_ids_for(&self, user_id: i32, page: u64, limit: u64) -> Result<Vec<i32>> {
        let rows = Subscriptions::find()
            .filter(subscriptions::Column::UserId.eq(user_id))
            .order_by_desc(subscriptions::Column::Id)
            .paginate(&self.conn, limit)
            .fetch_page(page.saturating_sub(1))
            .await
            .context("Failed to list subscriptions")?;

        Ok(rows.into_iter().map(|m| m.author_id).collect())
    }

    /// Author ids out of `author_ids` that the viewer follows, for flag
    /// computation over a page of users.
    pub async fn followed_among(&self, user_id: i32, author_ids: &[i32]) -> Result<Vec<i32>> {
        let rows = Subscriptions::find()
            .filter(subscriptions::Column::UserId.eq(user_id))
            .filter(subscriptions::Column::AuthorId.is_in(author_ids.iter().copied()))
            .all(&self.conn)
            .await?;

        Ok(rows.into_iter().map(|m| m.author_id).collect())
    }
}
