//! Service-level tests for the recipe write transaction, the shopping-list
//! aggregator, and the toggle edges.

use std::sync::Arc;
use tokio::sync::RwLock;

use ladle::config::{Config, EmptyCartPolicy, ListFormat};
use ladle::db::{NewUser, Store, User};
use ladle::services::{
    CartError, CatalogLoader, ImageService, IngredientAmount, RecipeError, RecipeInput,
    RecipeService, SeaOrmRecipeService, ShoppingListService,
};

struct TestEnv {
    store: Store,
    config: Arc<RwLock<Config>>,
    recipes: SeaOrmRecipeService,
}

async fn spawn_env() -> TestEnv {
    let db_path = std::env::temp_dir().join(format!("ladle-flow-test-{}.db", uuid::Uuid::new_v4()));
    let images_path =
        std::env::temp_dir().join(format!("ladle-flow-images-{}", uuid::Uuid::new_v4()));

    let mut config = Config::default();
    config.general.database_path = format!("sqlite:{}", db_path.display());
    config.general.images_path = images_path.to_string_lossy().to_string();

    let store = Store::new(&config.general.database_path)
        .await
        .expect("store");

    let images = Arc::new(ImageService::new(config.clone()));
    let recipes = SeaOrmRecipeService::new(store.clone(), images);

    TestEnv {
        store,
        config: Arc::new(RwLock::new(config)),
        recipes,
    }
}

async fn seed_catalog(store: &Store) {
    store.insert_unit("г").await.unwrap();
    store.insert_unit("шт").await.unwrap();
    store.insert_ingredient("мука", "г").await.unwrap();
    store.insert_ingredient("сахар", "г").await.unwrap();
    store.insert_ingredient("яйцо", "шт").await.unwrap();
    store.insert_tag("Завтрак", "#E26C2D", "breakfast").await.unwrap();
    store.insert_tag("Обед", "#49B64E", "lunch").await.unwrap();
}

async fn seed_user(store: &Store, username: &str) -> User {
    store
        .create_user(
            NewUser {
                email: format!("{username}@example.com"),
                username: username.to_string(),
                first_name: "Test".to_string(),
                last_name: "Cook".to_string(),
                password: "correct horse".to_string(),
            },
            &Config::default().security,
        )
        .await
        .expect("seed user")
}

fn input(name: &str, ingredients: Vec<IngredientAmount>) -> RecipeInput {
    RecipeInput {
        name: name.to_string(),
        text: "Mix everything.".to_string(),
        cooking_time: 30,
        image: Some("aGVsbG8=".to_string()),
        tag_ids: vec![1, 2],
        ingredients,
    }
}

fn amounts(pairs: &[(i32, i32)]) -> Vec<IngredientAmount> {
    pairs
        .iter()
        .map(|(id, amount)| IngredientAmount {
            ingredient_id: *id,
            amount: *amount,
        })
        .collect()
}

#[tokio::test]
async fn create_persists_exact_association_sets() {
    let env = spawn_env().await;
    seed_catalog(&env.store).await;
    let user = seed_user(&env.store, "chef").await;

    let details = env
        .recipes
        .create(user.id, input("Pancakes", amounts(&[(1, 200), (3, 2)])))
        .await
        .expect("create");

    assert_eq!(details.ingredients.len(), 2);
    assert_eq!(details.tags.len(), 2);
    assert_eq!(details.author.id, user.id);

    // Read back through a fresh query, not the returned value.
    let read_back = env
        .recipes
        .get(details.recipe.id, Some(user.id))
        .await
        .expect("read back");
    assert_eq!(read_back.ingredients.len(), 2);
    assert_eq!(read_back.tags.len(), 2);
}

#[tokio::test]
async fn update_is_full_replacement_not_merge() {
    let env = spawn_env().await;
    seed_catalog(&env.store).await;
    let user = seed_user(&env.store, "chef").await;

    let created = env
        .recipes
        .create(user.id, input("Dough", amounts(&[(1, 200), (2, 50)])))
        .await
        .expect("create");

    let mut update = input("Dough", amounts(&[(3, 4)]));
    update.image = None;
    update.tag_ids = vec![1];

    let updated = env
        .recipes
        .update(created.recipe.id, user.id, update)
        .await
        .expect("update");

    assert_eq!(updated.ingredients.len(), 1);
    assert_eq!(updated.ingredients[0].ingredient_id, 3);
    assert_eq!(updated.tags.len(), 1);
    // The stored image survives an update without a new payload.
    assert_eq!(updated.recipe.image, created.recipe.image);
}

#[tokio::test]
async fn rejected_submissions_write_nothing() {
    let env = spawn_env().await;
    seed_catalog(&env.store).await;
    let user = seed_user(&env.store, "chef").await;

    let duplicate = env
        .recipes
        .create(user.id, input("Broken", amounts(&[(1, 100), (1, 150)])))
        .await;
    assert!(matches!(duplicate, Err(RecipeError::Validation(_))));

    let zero_amount = env
        .recipes
        .create(user.id, input("Broken", amounts(&[(1, 0)])))
        .await;
    assert!(matches!(zero_amount, Err(RecipeError::Validation(_))));

    let unknown_ingredient = env
        .recipes
        .create(user.id, input("Broken", amounts(&[(99, 10)])))
        .await;
    assert!(matches!(unknown_ingredient, Err(RecipeError::Validation(_))));

    let mut unknown_tag = input("Broken", amounts(&[(1, 10)]));
    unknown_tag.tag_ids = vec![1, 42];
    let unknown_tag = env.recipes.create(user.id, unknown_tag).await;
    assert!(matches!(unknown_tag, Err(RecipeError::Validation(_))));

    let page = env
        .store
        .list_recipes(&ladle::db::RecipeFilters::default(), 1, 10)
        .await
        .unwrap();
    assert_eq!(page.total, 0);

    // The boundary amount is accepted.
    let boundary = env
        .recipes
        .create(user.id, input("Boundary", amounts(&[(1, 1)])))
        .await;
    assert!(boundary.is_ok());
}

#[tokio::test]
async fn non_author_updates_are_forbidden() {
    let env = spawn_env().await;
    seed_catalog(&env.store).await;
    let author = seed_user(&env.store, "author").await;
    let reader = seed_user(&env.store, "reader").await;

    let created = env
        .recipes
        .create(author.id, input("Secret", amounts(&[(1, 100)])))
        .await
        .expect("create");

    let update = env
        .recipes
        .update(created.recipe.id, reader.id, input("Stolen", amounts(&[(1, 1)])))
        .await;
    assert!(matches!(update, Err(RecipeError::NotAuthor)));

    let delete = env.recipes.delete(created.recipe.id, reader.id).await;
    assert!(matches!(delete, Err(RecipeError::NotAuthor)));
}

#[tokio::test]
async fn aggregation_sums_shared_ingredients_across_cart() {
    let env = spawn_env().await;
    seed_catalog(&env.store).await;
    let user = seed_user(&env.store, "chef").await;

    let bread = env
        .recipes
        .create(user.id, input("Bread", amounts(&[(1, 100), (3, 1)])))
        .await
        .unwrap();
    let buns = env
        .recipes
        .create(user.id, input("Buns", amounts(&[(1, 150)])))
        .await
        .unwrap();

    assert!(env.store.add_to_cart(user.id, bread.recipe.id).await.unwrap());
    assert!(env.store.add_to_cart(user.id, buns.recipe.id).await.unwrap());

    let rows = env.store.shopping_list(user.id).await.unwrap();
    assert_eq!(rows.len(), 2);

    // Ordered by ingredient name ascending.
    assert_eq!(rows[0].name, "мука");
    assert_eq!(rows[0].total, 250);
    assert_eq!(rows[1].name, "яйцо");
    assert_eq!(rows[1].total, 1);
}

#[tokio::test]
async fn empty_cart_policy_is_configurable() {
    let env = spawn_env().await;
    seed_catalog(&env.store).await;
    let user = seed_user(&env.store, "chef").await;

    let service = ShoppingListService::new(env.store.clone(), env.config.clone());

    let rejected = service.render(user.id).await;
    assert!(matches!(rejected, Err(CartError::Empty)));

    env.config.write().await.cart.on_empty = EmptyCartPolicy::Empty;

    let rendered = service.render(user.id).await.expect("empty document");
    assert_eq!(rendered.body, "");
}

#[tokio::test]
async fn phrased_rendering_pluralizes_units() {
    let env = spawn_env().await;
    seed_catalog(&env.store).await;
    let user = seed_user(&env.store, "chef").await;

    assert!(
        env.store
            .set_unit_plural_forms("шт", Some("штуки"), Some("штук"))
            .await
            .unwrap()
    );

    let eggs = env
        .recipes
        .create(user.id, input("Omelette", amounts(&[(3, 10)])))
        .await
        .unwrap();
    env.store.add_to_cart(user.id, eggs.recipe.id).await.unwrap();

    env.config.write().await.cart.format = ListFormat::Phrased;

    let service = ShoppingListService::new(env.store.clone(), env.config.clone());
    let rendered = service.render(user.id).await.expect("render");

    assert!(rendered.content_type.starts_with("text/html"));
    assert!(rendered.body.contains("10 штук"));
}

#[tokio::test]
async fn toggle_edges_conflict_on_double_add_and_absent_remove() {
    let env = spawn_env().await;
    seed_catalog(&env.store).await;
    let user = seed_user(&env.store, "chef").await;
    let author = seed_user(&env.store, "author").await;

    let recipe = env
        .recipes
        .create(author.id, input("Cake", amounts(&[(1, 100)])))
        .await
        .unwrap();
    let recipe_id = recipe.recipe.id;

    for _ in 0..2 {
        assert!(env.store.add_favorite(user.id, recipe_id).await.unwrap());
        assert!(!env.store.add_favorite(user.id, recipe_id).await.unwrap());
        assert!(env.store.is_favorited(user.id, recipe_id).await.unwrap());
        assert!(env.store.remove_favorite(user.id, recipe_id).await.unwrap());
        assert!(!env.store.remove_favorite(user.id, recipe_id).await.unwrap());
        assert!(!env.store.is_favorited(user.id, recipe_id).await.unwrap());
    }

    assert!(env.store.subscribe(user.id, author.id).await.unwrap());
    assert!(!env.store.subscribe(user.id, author.id).await.unwrap());
    assert!(env.store.unsubscribe(user.id, author.id).await.unwrap());
    assert!(!env.store.unsubscribe(user.id, author.id).await.unwrap());
}

#[tokio::test]
async fn deleting_a_recipe_cascades_its_rows_out_of_the_aggregate() {
    let env = spawn_env().await;
    seed_catalog(&env.store).await;
    let user = seed_user(&env.store, "chef").await;

    let bread = env
        .recipes
        .create(user.id, input("Bread", amounts(&[(1, 100)])))
        .await
        .unwrap();
    let buns = env
        .recipes
        .create(user.id, input("Buns", amounts(&[(1, 150)])))
        .await
        .unwrap();

    env.store.add_to_cart(user.id, bread.recipe.id).await.unwrap();
    env.store.add_to_cart(user.id, buns.recipe.id).await.unwrap();

    env.recipes.delete(buns.recipe.id, user.id).await.unwrap();

    let rows = env.store.shopping_list(user.id).await.unwrap();
    assert_eq!(rows.len(), 1);
    assert_eq!(rows[0].total, 100);
}

#[tokio::test]
async fn username_lookup_is_case_insensitive() {
    let env = spawn_env().await;
    seed_user(&env.store, "Baker").await;

    assert!(env.store.username_exists("baker").await.unwrap());
    assert!(env.store.username_exists("BAKER").await.unwrap());
    assert!(!env.store.username_exists("butcher").await.unwrap());
}

#[tokio::test]
async fn catalog_import_is_idempotent() {
    let env = spawn_env().await;

    let dir = std::env::temp_dir().join(format!("ladle-catalog-{}", uuid::Uuid::new_v4()));
    tokio::fs::create_dir_all(&dir).await.unwrap();

    let ingredients_path = dir.join("ingredients.json");
    tokio::fs::write(
        &ingredients_path,
        serde_json::json!([
            { "name": "мука", "measurement_unit": "г" },
            { "name": "сахар", "measurement_unit": "г" },
            { "name": "яйцо", "measurement_unit": "шт" }
        ])
        .to_string(),
    )
    .await
    .unwrap();

    let tags_path = dir.join("tags.json");
    tokio::fs::write(
        &tags_path,
        serde_json::json!([
            { "name": "Завтрак", "color": "#E26C2D", "slug": "breakfast" }
        ])
        .to_string(),
    )
    .await
    .unwrap();

    let loader = CatalogLoader::new(env.store.clone());

    let (units, ingredients) = loader.load_ingredients(&ingredients_path).await.unwrap();
    assert_eq!(units, 2);
    assert_eq!(ingredients, 3);
    assert_eq!(loader.load_tags(&tags_path).await.unwrap(), 1);

    // The second run inserts nothing.
    let (units, ingredients) = loader.load_ingredients(&ingredients_path).await.unwrap();
    assert_eq!(units, 0);
    assert_eq!(ingredients, 0);
    assert_eq!(loader.load_tags(&tags_path).await.unwrap(), 0);

    let bad_tags = dir.join("bad_tags.json");
    tokio::fs::write(
        &bad_tags,
        serde_json::json!([{ "name": "Bad", "color": "red", "slug": "bad" }]).to_string(),
    )
    .await
    .unwrap();
    assert!(loader.load_tags(&bad_tags).await.is_err());
}
