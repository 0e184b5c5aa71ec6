use axum::{
    Router,
    http::HeaderValue,
    middleware,
    routing::{delete, get, patch, post},
};
use std::sync::Arc;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use tower_sessions::{Expiry, MemoryStore, SessionManagerLayer};

use time;

use crate::config::Config;
use crate::state::SharedState;

pub mod auth;
mod cart;
mod error;
mod favorites;
mod ingredients;
mod observability;
mod recipes;
mod tags;
mod types;
mod users;
mod validation;

pub use error::ApiError;
pub use types::*;

use metrics_exporter_prometheus::PrometheusHandle;
use tokio::sync::RwLock;

pub struct AppState {
    pub shared: Arc<SharedState>,

    pub prometheus_handle: Option<PrometheusHandle>,
}

impl AppState {
    #[must_use]
    pub fn config(&self) -> &Arc<RwLock<Config>> {
        &self.shared.config
    }

    #[must_use]
    pub fn store(&self) -> &crate::db::Store {
        &self.shared.store
    }

    #[must_use]
    pub fn recipes(&self) -> &Arc<dyn crate::services::RecipeService> {
        &self.shared.recipe_service
    }

    #[must_use]
    pub fn shopping_list(&self) -> &Arc<crate::services::ShoppingListService> {
        &self.shared.shopping_list
    }
}

#[must_use]
pub fn create_app_state(
    shared: Arc<SharedState>,
    prometheus_handle: Option<PrometheusHandle>,
) -> Arc<AppState> {
    Arc::new(AppState {
        shared,
        prometheus_handle,
    })
}

pub async fn create_app_state_from_config(
    config: Config,
    prometheus_handle: Option<PrometheusHandle>,
) -> anyhow::Result<Arc<AppState>> {
    let shared = Arc::new(SharedState::new(config).await?);
    Ok(create_app_state(shared, prometheus_handle))
}

pub async fn router(state: Arc<AppState>) -> Router {
    let (images_path, cors_origins, session_minutes) = {
        let config = state.config().read().await;
        (
            config.general.images_path.clone(),
            config.server.cors_allowed_origins.clone(),
            config.server.session_minutes,
        )
    };

    let session_store = MemoryStore::default();
    let session_layer = SessionManagerLayer::new(session_store)
        .with_secure(false)
        .with_same_site(tower_sessions::cookie::SameSite::Lax)
        .with_expiry(Expiry::OnInactivity(time::Duration::minutes(
            session_minutes,
        )));

    let api_router = Router::new()
        .merge(public_router())
        .merge(protected_router())
        .route("/auth/login", post(auth::login))
        .route("/auth/logout", post(auth::logout))
        .layer(middleware::from_fn_with_state(
            state.clone(),
            auth::identify,
        ))
        .layer(session_layer)
        .with_state(state.clone());

    let cors_layer = if cors_origins.contains(&"*".to_string()) {
        CorsLayer::new().allow_origin(Any)
    } else {
        let origins: Vec<HeaderValue> =
            cors_origins.iter().filter_map(|s| s.parse().ok()).collect();
        CorsLayer::new().allow_origin(origins)
    };

    Router::new()
        .nest("/api", api_router)
        .nest_service("/images", tower_http::services::ServeDir::new(images_path))
        .layer(cors_layer.allow_methods(Any).allow_headers(Any))
        .layer(TraceLayer::new_for_http())
        .layer(middleware::from_fn(observability::logging_middleware))
}

/// Routes open to anonymous callers. Handlers still see the caller's
/// identity (when any) for per-viewer flags.
fn public_router() -> Router<Arc<AppState>> {
    Router::new()
        .route("/users", get(users::list_users))
        .route("/users", post(users::register))
        .route("/users/{id}", get(users::get_user))
        .route("/tags", get(tags::list_tags))
        .route("/tags/{id}", get(tags::get_tag))
        .route("/ingredients", get(ingredients::list_ingredients))
        .route("/ingredients/{id}", get(ingredients::get_ingredient))
        .route("/recipes", get(recipes::list_recipes))
        .route("/recipes/{id}", get(recipes::get_recipe))
}

fn protected_router() -> Router<Arc<AppState>> {
    Router::new()
        .route("/users/me", get(users::me))
        .route("/users/set_password", post(users::set_password))
        .route("/users/subscriptions", get(users::subscriptions))
        .route("/users/{id}/subscribe", post(users::subscribe))
        .route("/users/{id}/subscribe", delete(users::unsubscribe))
        .route("/recipes", post(recipes::create_recipe))
        .route("/recipes/{id}", patch(recipes::update_recipe))
        .route("/recipes/{id}", delete(recipes::delete_recipe))
        .route("/recipes/{id}/favorite", post(favorites::add_favorite))
        .route("/recipes/{id}/favorite", delete(favorites::remove_favorite))
        .route("/recipes/{id}/shopping_cart", post(cart::add_to_cart))
        .route(
            "/recipes/{id}/shopping_cart",
            delete(cart::remove_from_cart),
        )
        .route(
            "/recipes/download_shopping_cart",
            get(cart::download_shopping_cart),
        )
        .route("/metrics", get(observability::get_metrics))
        .route_layer(middleware::from_fn(auth::require_auth))
}
