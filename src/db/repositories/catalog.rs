use anyhow::{Context, Result};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, FromQueryResult, JoinType,
    QueryFilter, QueryOrder, QuerySelect, RelationTrait, Set,
};

use crate::entities::{ingredients, prelude::*, units};

/// Ingredient joined with its unit name for API listings.
#[derive(Debug, Clone, FromQueryResult)]
pub struct IngredientRow {
    pub id: i32,
    pub name: String,
    pub unit: String,
}

pub struct CatalogRepository {
    conn: DatabaseConnection,
}

impl CatalogRepository {
    #[must_use]
    pub const fn new(conn: DatabaseConnection) -> Self {
        Self { conn }
    }

    fn ingredient_select() -> sea_orm::Select<Ingredients> {
        Ingredients::find()
            .select_only()
            .column(ingredients::Column::Id)
            .column(ingredients::Column::Name)
            .column_as(units::Column::Name, "unit")
            .join(JoinType::InnerJoin, ingredients::Relation::Units.def())
    }

    /// Catalog listing with an optional name-prefix search.
    pub async fn list_ingredients(&self, name_prefix: Option<&str>) -> Result<Vec<IngredientRow>> {
        let mut query = Self::ingredient_select();

        if let Some(prefix) = name_prefix {
            query = query.filter(ingredients::Column::Name.starts_with(prefix));
        }

        let rows = query
            .order_by_asc(ingredients::Column::Name)
            .into_model::<IngredientRow>()
            .all(&self.conn)
            .await
            .context("Failed to list ingredients")?;

        Ok(rows)
    }

    pub async fn get_ingredient(&self, id: i32) -> Result<Option<IngredientRow>> {
        let row = Self::ingredient_select()
            .filter(ingredients::Column::Id.eq(id))
            .into_model::<IngredientRow>()
            .one(&self.conn)
            .await
            .context("Failed to query ingredient")?;

        Ok(row)
    }

    /// Ids out of `ids` that actually exist, for referential validation.
    pub async fn existing_ingredient_ids(&self, ids: &[i32]) -> Result<Vec<i32>> {
        let rows = Ingredients::find()
            .filter(ingredients::Column::Id.is_in(ids.iter().copied()))
            .all(&self.conn)
            .await?;

        Ok(rows.into_iter().map(|m| m.id).collect())
    }

    /// Insert a unit unless one with the same name exists.
    /// Returns true when a row was actually written.
    pub async fn insert_unit(&self, name: &str) -> Result<bool> {
        let inserted = Units::insert(units::ActiveModel {
            name: Set(name.to_string()),
            ..Default::default()
        })
        .on_conflict(
            sea_orm::sea_query::OnConflict::column(units::Column::Name)
                .do_nothing()
                .to_owned(),
        )
        .exec_without_returning(&self.conn)
        .await
        .context("Failed to insert unit")?;

        Ok(inserted > 0)
    }

    /// Insert an ingredient unless the (name, unit) pair exists.
    pub async fn insert_ingredient(&self, name: &str, unit_name: &str) -> Result<bool> {
        let unit = Units::find()
            .filter(units::Column::Name.eq(unit_name))
            .one(&self.conn)
            .await?
            .ok_or_else(|| anyhow::anyhow!("Unknown unit: {unit_name}"))?;

        let inserted = Ingredients::insert(ingredients::ActiveModel {
            name: Set(name.to_string()),
            unit_id: Set(unit.id),
            ..Default::default()
        })
        .on_conflict(
            sea_orm::sea_query::OnConflict::columns([
                ingredients::Column::Name,
                ingredients::Column::UnitId,
            ])
            .do_nothing()
            .to_owned(),
        )
        .exec_without_returning(&self.conn)
        .await
        .context("Failed to insert ingredient")?;

        Ok(inserted > 0)
    }

    /// Attach plural forms to an existing unit.
    pub async fn set_unit_plural_forms(
        &self,
        name: &str,
        plural_first: Option<&str>,
        plural_second: Option<&str>,
    ) -> Result<bool> {
        let Some(unit) = Units::find()
            .filter(units::Column::Name.eq(name))
            .one(&self.conn)
            .await?
        else {
            return Ok(false);
        };

        let mut active: units::ActiveModel = unit.into();
        active.plural_first = Set(plural_first.map(str::to_string));
        active.plural_second = Set(plural_second.map(str::to_string));
        active.update(&self.conn).await?;

        Ok(true)
    }
}
