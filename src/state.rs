use std::sync::Arc;
use tokio::sync::RwLock;

use crate::config::Config;
use crate::db::Store;
use crate::services::{
    ImageService, RecipeService, SeaOrmRecipeService, ShoppingListService,
};

/// Everything the request handlers share: the store, the config, and the
/// domain services wired over them.
#[derive(Clone)]
pub struct SharedState {
    pub config: Arc<RwLock<Config>>,

    pub store: Store,

    pub recipe_service: Arc<dyn RecipeService>,

    pub shopping_list: Arc<ShoppingListService>,

    pub image_service: Arc<ImageService>,
}

impl SharedState {
    pub async fn new(config: Config) -> anyhow::Result<Self> {
        let store = Store::with_pool_options(
            &config.general.database_path,
            config.general.max_db_connections,
            config.general.min_db_connections,
        )
        .await?;

        let image_service = Arc::new(ImageService::new(config.clone()));
        let config_arc = Arc::new(RwLock::new(config));

        let recipe_service = Arc::new(SeaOrmRecipeService::new(
            store.clone(),
            image_service.clone(),
        )) as Arc<dyn RecipeService + Send + Sync + 'static>;

        let shopping_list = Arc::new(ShoppingListService::new(
            store.clone(),
            config_arc.clone(),
        ));

        Ok(Self {
            config: config_arc,
            store,
            recipe_service,
            shopping_list,
            image_service,
        })
    }

    pub async fn config(&self) -> Config {
        self.config.read().await.clone()
    }
}
