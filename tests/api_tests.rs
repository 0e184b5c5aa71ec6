//! HTTP-level tests for the public API surface.

use axum::{
    Router,
    body::Body,
    http::{Request, StatusCode},
};
use http_body_util::BodyExt;
use ladle::config::Config;
use std::sync::Arc;
use tower::ServiceExt;

async fn spawn_app() -> (Arc<ladle::api::AppState>, Router) {
    let db_path = std::env::temp_dir().join(format!("ladle-api-test-{}.db", uuid::Uuid::new_v4()));
    let images_path = std::env::temp_dir().join(format!("ladle-api-images-{}", uuid::Uuid::new_v4()));

    let mut config = Config::default();
    config.general.database_path = format!("sqlite:{}", db_path.display());
    config.general.images_path = images_path.to_string_lossy().to_string();

    let state = ladle::api::create_app_state_from_config(config, None)
        .await
        .expect("failed to create app state");

    let router = ladle::api::router(state.clone()).await;
    (state, router)
}

async fn seed_catalog(state: &ladle::api::AppState) {
    let store = state.store();
    store.insert_unit("г").await.expect("seed unit");
    store.insert_unit("шт").await.expect("seed unit");
    store
        .insert_ingredient("мука", "г")
        .await
        .expect("seed ingredient");
    store
        .insert_ingredient("сахар", "г")
        .await
        .expect("seed ingredient");
    store
        .insert_ingredient("яйцо", "шт")
        .await
        .expect("seed ingredient");
    store
        .insert_tag("Завтрак", "#E26C2D", "breakfast")
        .await
        .expect("seed tag");
    store
        .insert_tag("Обед", "#49B64E", "lunch")
        .await
        .expect("seed tag");
}

async fn body_json(response: axum::response::Response) -> serde_json::Value {
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    serde_json::from_slice(&bytes).unwrap()
}

fn json_request(method: &str, uri: &str, body: serde_json::Value) -> Request<Body> {
    Request::builder()
        .method(method)
        .uri(uri)
        .header("Content-Type", "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

fn authed_request(method: &str, uri: &str, api_key: &str) -> Request<Body> {
    Request::builder()
        .method(method)
        .uri(uri)
        .header("X-Api-Key", api_key)
        .body(Body::empty())
        .unwrap()
}

fn authed_json_request(
    method: &str,
    uri: &str,
    api_key: &str,
    body: serde_json::Value,
) -> Request<Body> {
    Request::builder()
        .method(method)
        .uri(uri)
        .header("X-Api-Key", api_key)
        .header("Content-Type", "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

/// Register a user and log in, returning the API key.
async fn register_and_login(app: &Router, username: &str) -> String {
    let email = format!("{username}@example.com");

    let register = app
        .clone()
        .oneshot(json_request(
            "POST",
            "/api/users",
            serde_json::json!({
                "email": email,
                "username": username,
                "first_name": "Test",
                "last_name": "Cook",
                "password": "correct horse"
            }),
        ))
        .await
        .unwrap();
    assert_eq!(register.status(), StatusCode::CREATED);

    let login = app
        .clone()
        .oneshot(json_request(
            "POST",
            "/api/auth/login",
            serde_json::json!({ "email": email, "password": "correct horse" }),
        ))
        .await
        .unwrap();
    assert_eq!(login.status(), StatusCode::OK);

    let json = body_json(login).await;
    json["data"]["api_key"].as_str().unwrap().to_string()
}

fn recipe_payload(name: &str, ingredients: serde_json::Value) -> serde_json::Value {
    serde_json::json!({
        "name": name,
        "text": "Mix everything and bake.",
        "cooking_time": 30,
        "image": "data:image/png;base64,aGVsbG8=",
        "tags": [1, 2],
        "ingredients": ingredients
    })
}

#[tokio::test]
async fn anonymous_can_browse_but_not_write() {
    let (state, app) = spawn_app().await;
    seed_catalog(&state).await;

    for uri in ["/api/tags", "/api/ingredients", "/api/recipes", "/api/users"] {
        let response = app
            .clone()
            .oneshot(Request::builder().uri(uri).body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK, "GET {uri}");
    }

    let response = app
        .clone()
        .oneshot(json_request(
            "POST",
            "/api/recipes",
            recipe_payload("Pie", serde_json::json!([{ "id": 1, "amount": 100 }])),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn login_rejects_bad_credentials() {
    let (_, app) = spawn_app().await;
    register_and_login(&app, "chef").await;

    let response = app
        .clone()
        .oneshot(json_request(
            "POST",
            "/api/auth/login",
            serde_json::json!({ "email": "chef@example.com", "password": "wrong" }),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn registration_rejects_case_colliding_usernames() {
    let (_, app) = spawn_app().await;
    register_and_login(&app, "baker").await;

    let response = app
        .clone()
        .oneshot(json_request(
            "POST",
            "/api/users",
            serde_json::json!({
                "email": "other@example.com",
                "username": "Baker",
                "first_name": "Other",
                "last_name": "Cook",
                "password": "correct horse"
            }),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn recipe_create_read_back_has_exact_associations() {
    let (state, app) = spawn_app().await;
    seed_catalog(&state).await;
    let api_key = register_and_login(&app, "chef").await;

    let response = app
        .clone()
        .oneshot(authed_json_request(
            "POST",
            "/api/recipes",
            &api_key,
            recipe_payload(
                "Pancakes",
                serde_json::json!([
                    { "id": 1, "amount": 200 },
                    { "id": 2, "amount": 50 },
                    { "id": 3, "amount": 2 }
                ]),
            ),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::CREATED);

    let json = body_json(response).await;
    let recipe_id = json["data"]["id"].as_i64().unwrap();
    assert_eq!(json["data"]["ingredients"].as_array().unwrap().len(), 3);
    assert_eq!(json["data"]["tags"].as_array().unwrap().len(), 2);
    assert_eq!(json["data"]["is_favorited"], serde_json::json!(false));
    assert_eq!(json["data"]["author"]["username"], "chef");

    let read_back = app
        .clone()
        .oneshot(
            Request::builder()
                .uri(format!("/api/recipes/{recipe_id}"))
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(read_back.status(), StatusCode::OK);

    let json = body_json(read_back).await;
    assert_eq!(json["data"]["ingredients"].as_array().unwrap().len(), 3);
    assert_eq!(json["data"]["tags"].as_array().unwrap().len(), 2);
}

#[tokio::test]
async fn recipe_update_replaces_ingredient_set() {
    let (state, app) = spawn_app().await;
    seed_catalog(&state).await;
    let api_key = register_and_login(&app, "chef").await;

    let response = app
        .clone()
        .oneshot(authed_json_request(
            "POST",
            "/api/recipes",
            &api_key,
            recipe_payload(
                "Dough",
                serde_json::json!([
                    { "id": 1, "amount": 200 },
                    { "id": 2, "amount": 50 }
                ]),
            ),
        ))
        .await
        .unwrap();
    let recipe_id = body_json(response).await["data"]["id"].as_i64().unwrap();

    let update = app
        .clone()
        .oneshot(authed_json_request(
            "PATCH",
            &format!("/api/recipes/{recipe_id}"),
            &api_key,
            serde_json::json!({
                "name": "Dough",
                "text": "Mix everything and bake.",
                "cooking_time": 25,
                "tags": [1],
                "ingredients": [{ "id": 3, "amount": 4 }]
            }),
        ))
        .await
        .unwrap();
    assert_eq!(update.status(), StatusCode::OK);

    let json = body_json(update).await;
    let ingredients = json["data"]["ingredients"].as_array().unwrap();
    assert_eq!(ingredients.len(), 1);
    assert_eq!(ingredients[0]["id"], serde_json::json!(3));
    assert_eq!(json["data"]["tags"].as_array().unwrap().len(), 1);
    assert_eq!(json["data"]["cooking_time"], serde_json::json!(25));
}

#[tokio::test]
async fn recipe_rejects_duplicate_ingredients_and_bad_amounts() {
    let (state, app) = spawn_app().await;
    seed_catalog(&state).await;
    let api_key = register_and_login(&app, "chef").await;

    let duplicate = app
        .clone()
        .oneshot(authed_json_request(
            "POST",
            "/api/recipes",
            &api_key,
            recipe_payload(
                "Broken",
                serde_json::json!([
                    { "id": 1, "amount": 100 },
                    { "id": 1, "amount": 150 }
                ]),
            ),
        ))
        .await
        .unwrap();
    assert_eq!(duplicate.status(), StatusCode::BAD_REQUEST);

    let zero_amount = app
        .clone()
        .oneshot(authed_json_request(
            "POST",
            "/api/recipes",
            &api_key,
            recipe_payload("Broken", serde_json::json!([{ "id": 1, "amount": 0 }])),
        ))
        .await
        .unwrap();
    assert_eq!(zero_amount.status(), StatusCode::BAD_REQUEST);

    // Nothing was written by the rejected submissions.
    let listing = app
        .clone()
        .oneshot(Request::builder().uri("/api/recipes").body(Body::empty()).unwrap())
        .await
        .unwrap();
    let json = body_json(listing).await;
    assert_eq!(json["data"]["total"], serde_json::json!(0));

    let boundary = app
        .clone()
        .oneshot(authed_json_request(
            "POST",
            "/api/recipes",
            &api_key,
            recipe_payload("Boundary", serde_json::json!([{ "id": 1, "amount": 1 }])),
        ))
        .await
        .unwrap();
    assert_eq!(boundary.status(), StatusCode::CREATED);
}

#[tokio::test]
async fn recipe_update_is_author_only() {
    let (state, app) = spawn_app().await;
    seed_catalog(&state).await;
    let author_key = register_and_login(&app, "author").await;
    let other_key = register_and_login(&app, "reader").await;

    let response = app
        .clone()
        .oneshot(authed_json_request(
            "POST",
            "/api/recipes",
            &author_key,
            recipe_payload("Secret", serde_json::json!([{ "id": 1, "amount": 100 }])),
        ))
        .await
        .unwrap();
    let recipe_id = body_json(response).await["data"]["id"].as_i64().unwrap();

    let forbidden = app
        .clone()
        .oneshot(authed_json_request(
            "PATCH",
            &format!("/api/recipes/{recipe_id}"),
            &other_key,
            serde_json::json!({
                "name": "Stolen",
                "text": "Mine now.",
                "cooking_time": 5,
                "tags": [1],
                "ingredients": [{ "id": 1, "amount": 1 }]
            }),
        ))
        .await
        .unwrap();
    assert_eq!(forbidden.status(), StatusCode::FORBIDDEN);

    let forbidden_delete = app
        .clone()
        .oneshot(authed_request(
            "DELETE",
            &format!("/api/recipes/{recipe_id}"),
            &other_key,
        ))
        .await
        .unwrap();
    assert_eq!(forbidden_delete.status(), StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn favorite_toggle_cycle() {
    let (state, app) = spawn_app().await;
    seed_catalog(&state).await;
    let api_key = register_and_login(&app, "chef").await;

    let response = app
        .clone()
        .oneshot(authed_json_request(
            "POST",
            "/api/recipes",
            &api_key,
            recipe_payload("Cake", serde_json::json!([{ "id": 1, "amount": 100 }])),
        ))
        .await
        .unwrap();
    let recipe_id = body_json(response).await["data"]["id"].as_i64().unwrap();
    let uri = format!("/api/recipes/{recipe_id}/favorite");

    let add = app
        .clone()
        .oneshot(authed_request("POST", &uri, &api_key))
        .await
        .unwrap();
    assert_eq!(add.status(), StatusCode::CREATED);

    let add_again = app
        .clone()
        .oneshot(authed_request("POST", &uri, &api_key))
        .await
        .unwrap();
    assert_eq!(add_again.status(), StatusCode::BAD_REQUEST);

    let flagged = app
        .clone()
        .oneshot(authed_request(
            "GET",
            &format!("/api/recipes/{recipe_id}"),
            &api_key,
        ))
        .await
        .unwrap();
    assert_eq!(
        body_json(flagged).await["data"]["is_favorited"],
        serde_json::json!(true)
    );

    let remove = app
        .clone()
        .oneshot(authed_request("DELETE", &uri, &api_key))
        .await
        .unwrap();
    assert_eq!(remove.status(), StatusCode::NO_CONTENT);

    let remove_again = app
        .clone()
        .oneshot(authed_request("DELETE", &uri, &api_key))
        .await
        .unwrap();
    assert_eq!(remove_again.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn subscription_rules() {
    let (_, app) = spawn_app().await;
    let follower_key = register_and_login(&app, "follower").await;
    register_and_login(&app, "writer").await;

    // Registered users get ids 1 and 2 in order.
    let me = app
        .clone()
        .oneshot(authed_request("GET", "/api/users/me", &follower_key))
        .await
        .unwrap();
    let my_id = body_json(me).await["data"]["id"].as_i64().unwrap();
    let author_id = if my_id == 1 { 2 } else { 1 };

    let self_subscribe = app
        .clone()
        .oneshot(authed_request(
            "POST",
            &format!("/api/users/{my_id}/subscribe"),
            &follower_key,
        ))
        .await
        .unwrap();
    assert_eq!(self_subscribe.status(), StatusCode::BAD_REQUEST);

    let uri = format!("/api/users/{author_id}/subscribe");
    let subscribe = app
        .clone()
        .oneshot(authed_request("POST", &uri, &follower_key))
        .await
        .unwrap();
    assert_eq!(subscribe.status(), StatusCode::CREATED);

    let subscribe_again = app
        .clone()
        .oneshot(authed_request("POST", &uri, &follower_key))
        .await
        .unwrap();
    assert_eq!(subscribe_again.status(), StatusCode::BAD_REQUEST);

    let listing = app
        .clone()
        .oneshot(authed_request("GET", "/api/users/subscriptions", &follower_key))
        .await
        .unwrap();
    let json = body_json(listing).await;
    let authors = json["data"].as_array().unwrap();
    assert_eq!(authors.len(), 1);
    assert_eq!(authors[0]["username"], "writer");
    assert_eq!(authors[0]["is_subscribed"], serde_json::json!(true));

    let unsubscribe = app
        .clone()
        .oneshot(authed_request("DELETE", &uri, &follower_key))
        .await
        .unwrap();
    assert_eq!(unsubscribe.status(), StatusCode::NO_CONTENT);

    let unsubscribe_again = app
        .clone()
        .oneshot(authed_request("DELETE", &uri, &follower_key))
        .await
        .unwrap();
    assert_eq!(unsubscribe_again.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn shopping_cart_download_aggregates_shared_ingredients() {
    let (state, app) = spawn_app().await;
    seed_catalog(&state).await;
    let api_key = register_and_login(&app, "chef").await;

    // Empty cart downloads are rejected under the default policy.
    let empty = app
        .clone()
        .oneshot(authed_request(
            "GET",
            "/api/recipes/download_shopping_cart",
            &api_key,
        ))
        .await
        .unwrap();
    assert_eq!(empty.status(), StatusCode::BAD_REQUEST);

    let mut recipe_ids = Vec::new();
    for (name, amount) in [("Bread", 100), ("Buns", 150)] {
        let response = app
            .clone()
            .oneshot(authed_json_request(
                "POST",
                "/api/recipes",
                &api_key,
                recipe_payload(name, serde_json::json!([{ "id": 1, "amount": amount }])),
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::CREATED);
        recipe_ids.push(body_json(response).await["data"]["id"].as_i64().unwrap());
    }

    for recipe_id in &recipe_ids {
        let add = app
            .clone()
            .oneshot(authed_request(
                "POST",
                &format!("/api/recipes/{recipe_id}/shopping_cart"),
                &api_key,
            ))
            .await
            .unwrap();
        assert_eq!(add.status(), StatusCode::CREATED);
    }

    let download = app
        .clone()
        .oneshot(authed_request(
            "GET",
            "/api/recipes/download_shopping_cart",
            &api_key,
        ))
        .await
        .unwrap();
    assert_eq!(download.status(), StatusCode::OK);
    assert!(
        download
            .headers()
            .get("content-type")
            .and_then(|v| v.to_str().ok())
            .is_some_and(|v| v.starts_with(mime::TEXT_PLAIN.as_ref()))
    );

    let bytes = download.into_body().collect().await.unwrap().to_bytes();
    let body = String::from_utf8(bytes.to_vec()).unwrap();
    assert_eq!(body, "мука(г) - 250\n");
}

#[tokio::test]
async fn recipe_list_filters_by_tag_and_favorites() {
    let (state, app) = spawn_app().await;
    seed_catalog(&state).await;
    let api_key = register_and_login(&app, "chef").await;

    let breakfast = app
        .clone()
        .oneshot(authed_json_request(
            "POST",
            "/api/recipes",
            &api_key,
            serde_json::json!({
                "name": "Porridge",
                "text": "Warm and filling.",
                "cooking_time": 10,
                "image": "aGVsbG8=",
                "tags": [1],
                "ingredients": [{ "id": 1, "amount": 50 }]
            }),
        ))
        .await
        .unwrap();
    let porridge_id = body_json(breakfast).await["data"]["id"].as_i64().unwrap();

    app.clone()
        .oneshot(authed_json_request(
            "POST",
            "/api/recipes",
            &api_key,
            serde_json::json!({
                "name": "Soup",
                "text": "For lunch.",
                "cooking_time": 40,
                "image": "aGVsbG8=",
                "tags": [2],
                "ingredients": [{ "id": 2, "amount": 30 }]
            }),
        ))
        .await
        .unwrap();

    let filtered = app
        .clone()
        .oneshot(
            Request::builder()
                .uri("/api/recipes?tags=breakfast")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    let json = body_json(filtered).await;
    assert_eq!(json["data"]["total"], serde_json::json!(1));
    assert_eq!(json["data"]["recipes"][0]["name"], "Porridge");

    app.clone()
        .oneshot(authed_request(
            "POST",
            &format!("/api/recipes/{porridge_id}/favorite"),
            &api_key,
        ))
        .await
        .unwrap();

    let favorites = app
        .clone()
        .oneshot(authed_request(
            "GET",
            "/api/recipes?is_favorited=1",
            &api_key,
        ))
        .await
        .unwrap();
    let json = body_json(favorites).await;
    assert_eq!(json["data"]["total"], serde_json::json!(1));
    assert_eq!(json["data"]["recipes"][0]["name"], "Porridge");

    // Anonymous callers asking for favorites get an empty page.
    let anonymous = app
        .clone()
        .oneshot(
            Request::builder()
                .uri("/api/recipes?is_favorited=1")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    let json = body_json(anonymous).await;
    assert_eq!(json["data"]["total"], serde_json::json!(0));
}
