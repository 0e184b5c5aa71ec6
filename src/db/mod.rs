use anyhow::Result;
use sea_orm::{ConnectOptions, ConnectionTrait, Database, DatabaseConnection, Statement};
use std::path::Path;
use std::time::Duration;
use tracing::info;

use crate::config::SecurityConfig;
use crate::entities::{recipes, tags};

pub mod migrator;
pub mod repositories;

pub use repositories::cart::ShoppingListRow;
pub use repositories::catalog::IngredientRow;
pub use repositories::recipe::{
    IngredientAmountRow, IngredientDetailRow, RecipeDetails, RecipeFilters, RecipePage,
    RecipeWrite,
};
pub use repositories::user::{NewUser, User};

#[derive(Clone)]
pub struct Store {
    pub conn: DatabaseConnection,
}

impl Store {
    pub async fn new(db_url: &str) -> Result<Self> {
        Self::with_pool_options(db_url, 5, 1).await
    }

    pub async fn with_pool_options(
        db_url: &str,
        max_connections: u32,
        min_connections: u32,
    ) -> Result<Self> {
        use sea_orm_migration::MigratorTrait;

        if !db_url.starts_with(":memory:") {
            let path_str = db_url.trim_start_matches("sqlite:");
            if let Some(parent) = Path::new(path_str).parent() {
                tokio::fs::create_dir_all(parent).await.ok();
            }
            if !Path::new(path_str).exists() {
                std::fs::File::create(path_str)?;
            }
        }

        let mut opt = ConnectOptions::new(db_url.to_string());
        opt.max_connections(max_connections)
            .min_connections(min_connections)
            .connect_timeout(Duration::from_secs(10))
            .acquire_timeout(Duration::from_secs(10))
            .idle_timeout(Duration::from_secs(300))
            .max_lifetime(Duration::from_secs(600))
            .sqlx_logging(false);

        let conn = Database::connect(opt).await?;

        migrator::Migrator::up(&conn, None).await?;

        info!(
            "Database connected & migrations applied (pool: {}-{})",
            min_connections, max_connections
        );

        Ok(Self { conn })
    }

    pub async fn ping(&self) -> Result<()> {
        let backend = self.conn.get_database_backend();
        self.conn
            .query_one(Statement::from_string(backend, "SELECT 1".to_string()))
            .await?;
        Ok(())
    }

    fn user_repo(&self) -> repositories::user::UserRepository {
        repositories::user::UserRepository::new(self.conn.clone())
    }

    fn subscription_repo(&self) -> repositories::subscription::SubscriptionRepository {
        repositories::subscription::SubscriptionRepository::new(self.conn.clone())
    }

    fn catalog_repo(&self) -> repositories::catalog::CatalogRepository {
        repositories::catalog::CatalogRepository::new(self.conn.clone())
    }

    fn tag_repo(&self) -> repositories::tag::TagRepository {
        repositories::tag::TagRepository::new(self.conn.clone())
    }

    fn recipe_repo(&self) -> repositories::recipe::RecipeRepository {
        repositories::recipe::RecipeRepository::new(self.conn.clone())
    }

    fn favorite_repo(&self) -> repositories::favorite::FavoriteRepository {
        repositories::favorite::FavoriteRepository::new(self.conn.clone())
    }

    fn cart_repo(&self) -> repositories::cart::CartRepository {
        repositories::cart::CartRepository::new(self.conn.clone())
    }

    // ------------------------------------------------------------------
    // Users
    // ------------------------------------------------------------------

    pub async fn create_user(&self, new_user: NewUser, security: &SecurityConfig) -> Result<User> {
        self.user_repo().create(new_user, security).await
    }

    pub async fn get_user(&self, id: i32) -> Result<Option<User>> {
        self.user_repo().get_by_id(id).await
    }

    pub async fn get_user_by_email(&self, email: &str) -> Result<Option<User>> {
        self.user_repo().get_by_email(email).await
    }

    pub async fn get_users_by_ids(&self, ids: &[i32]) -> Result<Vec<User>> {
        self.user_repo().get_by_ids(ids).await
    }

    pub async fn list_users(&self, page: u64, limit: u64) -> Result<Vec<User>> {
        self.user_repo().list(page, limit).await
    }

    pub async fn user_email_exists(&self, email: &str) -> Result<bool> {
        self.user_repo().email_exists(email).await
    }

    pub async fn username_exists(&self, username: &str) -> Result<bool> {
        self.user_repo().username_exists(username).await
    }

    pub async fn verify_user_password(&self, email: &str, password: &str) -> Result<Option<User>> {
        self.user_repo().verify_password(email, password).await
    }

    pub async fn update_user_password(
        &self,
        user_id: i32,
        new_password: &str,
        security: &SecurityConfig,
    ) -> Result<()> {
        self.user_repo()
            .update_password(user_id, new_password, security)
            .await
    }

    pub async fn verify_api_key(&self, api_key: &str) -> Result<Option<User>> {
        self.user_repo().verify_api_key(api_key).await
    }

    // ------------------------------------------------------------------
    // Subscriptions
    // ------------------------------------------------------------------

    pub async fn subscribe(&self, user_id: i32, author_id: i32) -> Result<bool> {
        self.subscription_repo().add(user_id, author_id).await
    }

    pub async fn unsubscribe(&self, user_id: i32, author_id: i32) -> Result<bool> {
        self.subscription_repo().remove(user_id, author_id).await
    }

    pub async fn is_subscribed(&self, user_id: i32, author_id: i32) -> Result<bool> {
        self.subscription_repo().exists(user_id, author_id).await
    }

    pub async fn subscribed_author_ids(
        &self,
        user_id: i32,
        page: u64,
        limit: u64,
    ) -> Result<Vec<i32>> {
        self.subscription_repo()
            .author_ids_for(user_id, page, limit)
            .await
    }

    pub async fn followed_among(&self, user_id: i32, author_ids: &[i32]) -> Result<Vec<i32>> {
        self.subscription_repo()
            .followed_among(user_id, author_ids)
            .await
    }

    // ------------------------------------------------------------------
    // Catalog
    // ------------------------------------------------------------------

    pub async fn list_ingredients(&self, name_prefix: Option<&str>) -> Result<Vec<IngredientRow>> {
        self.catalog_repo().list_ingredients(name_prefix).await
    }

    pub async fn get_ingredient(&self, id: i32) -> Result<Option<IngredientRow>> {
        self.catalog_repo().get_ingredient(id).await
    }

    pub async fn existing_ingredient_ids(&self, ids: &[i32]) -> Result<Vec<i32>> {
        self.catalog_repo().existing_ingredient_ids(ids).await
    }

    pub async fn insert_unit(&self, name: &str) -> Result<bool> {
        self.catalog_repo().insert_unit(name).await
    }

    pub async fn insert_ingredient(&self, name: &str, unit_name: &str) -> Result<bool> {
        self.catalog_repo().insert_ingredient(name, unit_name).await
    }

    pub async fn set_unit_plural_forms(
        &self,
        name: &str,
        plural_first: Option<&str>,
        plural_second: Option<&str>,
    ) -> Result<bool> {
        self.catalog_repo()
            .set_unit_plural_forms(name, plural_first, plural_second)
            .await
    }

    // ------------------------------------------------------------------
    // Tags
    // ------------------------------------------------------------------

    pub async fn list_tags(&self) -> Result<Vec<tags::Model>> {
        self.tag_repo().list().await
    }

    pub async fn get_tag(&self, id: i32) -> Result<Option<tags::Model>> {
        self.tag_repo().get(id).await
    }

    pub async fn get_tags_by_ids(&self, ids: &[i32]) -> Result<Vec<tags::Model>> {
        self.tag_repo().get_by_ids(ids).await
    }

    pub async fn tag_ids_by_slugs(&self, slugs: &[String]) -> Result<Vec<i32>> {
        self.tag_repo().ids_by_slugs(slugs).await
    }

    pub async fn insert_tag(&self, name: &str, color: &str, slug: &str) -> Result<bool> {
        self.tag_repo().insert(name, color, slug).await
    }

    // ------------------------------------------------------------------
    // Recipes
    // ------------------------------------------------------------------

    pub async fn create_recipe(&self, author_id: i32, write: RecipeWrite) -> Result<recipes::Model> {
        self.recipe_repo().create(author_id, write).await
    }

    pub async fn update_recipe(&self, recipe_id: i32, write: RecipeWrite) -> Result<recipes::Model> {
        self.recipe_repo().update(recipe_id, write).await
    }

    pub async fn get_recipe(&self, id: i32) -> Result<Option<recipes::Model>> {
        self.recipe_repo().get(id).await
    }

    pub async fn remove_recipe(&self, id: i32) -> Result<bool> {
        self.recipe_repo().remove(id).await
    }

    pub async fn list_recipes(
        &self,
        filters: &RecipeFilters,
        page: u64,
        limit: u64,
    ) -> Result<RecipePage> {
        self.recipe_repo().list(filters, page, limit).await
    }

    pub async fn recipe_count_by_author(&self, author_id: i32) -> Result<u64> {
        self.recipe_repo().count_by_author(author_id).await
    }

    pub async fn recipes_by_author(
        &self,
        author_id: i32,
        limit: Option<u64>,
    ) -> Result<Vec<recipes::Model>> {
        self.recipe_repo().list_by_author(author_id, limit).await
    }

    pub async fn recipe_details(
        &self,
        models: Vec<recipes::Model>,
        viewer: Option<i32>,
    ) -> Result<Vec<RecipeDetails>> {
        self.recipe_repo().details_for(models, viewer).await
    }

    // ------------------------------------------------------------------
    // Favorites / shopping cart
    // ------------------------------------------------------------------

    pub async fn add_favorite(&self, user_id: i32, recipe_id: i32) -> Result<bool> {
        self.favorite_repo().add(user_id, recipe_id).await
    }

    pub async fn remove_favorite(&self, user_id: i32, recipe_id: i32) -> Result<bool> {
        self.favorite_repo().remove(user_id, recipe_id).await
    }

    pub async fn is_favorited(&self, user_id: i32, recipe_id: i32) -> Result<bool> {
        self.favorite_repo().exists(user_id, recipe_id).await
    }

    pub async fn add_to_cart(&self, user_id: i32, recipe_id: i32) -> Result<bool> {
        self.cart_repo().add(user_id, recipe_id).await
    }

    pub async fn remove_from_cart(&self, user_id: i32, recipe_id: i32) -> Result<bool> {
        self.cart_repo().remove(user_id, recipe_id).await
    }

    pub async fn is_in_cart(&self, user_id: i32, recipe_id: i32) -> Result<bool> {
        self.cart_repo().exists(user_id, recipe_id).await
    }

    pub async fn shopping_list(&self, user_id: i32) -> Result<Vec<ShoppingListRow>> {
        self.cart_repo().aggregate_for_user(user_id).await
    }
}
