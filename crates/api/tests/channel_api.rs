//! Integration tests for user profiles, channel pages, search, the
//! category catalog, and cursor paging through the public feed.

mod common;

use axum::http::StatusCode;
use axum::Router;
use common::{
    assert_error_code, body_json, build_test_app, build_test_app_with_fakes, get, get_auth,
    patch_json_auth, post_auth, post_json_auth, put_auth, token,
};
use serde_json::json;
use sqlx::PgPool;

async fn publish_video(app: &Router, owner: &str, title: &str) -> String {
    let created = body_json(post_auth(app.clone(), "/api/v1/videos", owner).await).await;
    let id = created["data"]["id"].as_str().unwrap().to_string();
    patch_json_auth(
        app.clone(),
        &format!("/api/v1/videos/{id}"),
        owner,
        json!({"title": title, "visibility": "public"}),
    )
    .await;
    id
}

#[sqlx::test(migrations = "../db/migrations")]
async fn profile_carries_counts_and_viewer_subscription(pool: PgPool) {
    let app = build_test_app(pool);
    let alice = token("alice");
    let bob = token("bob");

    let video = publish_video(&app, &alice, "Hello").await;
    let detail = body_json(get(app.clone(), &format!("/api/v1/videos/{video}")).await).await;
    let alice_id = detail["data"]["user_id"].as_str().unwrap().to_string();

    put_auth(app.clone(), &format!("/api/v1/subscriptions/{alice_id}"), &bob).await;

    let profile = body_json(get(app.clone(), &format!("/api/v1/users/{alice_id}")).await).await;
    assert_eq!(profile["data"]["subscriber_count"], 1);
    assert_eq!(profile["data"]["video_count"], 1);
    assert_eq!(profile["data"]["viewer_subscribed"], false);

    let profile =
        body_json(get_auth(app.clone(), &format!("/api/v1/users/{alice_id}"), &bob).await).await;
    assert_eq!(profile["data"]["viewer_subscribed"], true);

    // The channel page lists only published videos.
    post_auth(app.clone(), "/api/v1/videos", &alice).await;
    let channel =
        body_json(get(app, &format!("/api/v1/users/{alice_id}/videos")).await).await;
    assert_eq!(channel["data"]["items"].as_array().unwrap().len(), 1);
}

#[sqlx::test(migrations = "../db/migrations")]
async fn update_me_and_banner_replacement(pool: PgPool) {
    let (app, _, images) = build_test_app_with_fakes(pool);
    let alice = token("alice");

    let response = patch_json_auth(app.clone(), "/api/v1/users/me", &alice, json!({"name": " "})).await;
    assert_error_code(response, StatusCode::BAD_REQUEST, "BAD_REQUEST").await;

    let response =
        patch_json_auth(app.clone(), "/api/v1/users/me", &alice, json!({"name": "Alice A."})).await;
    assert_eq!(response.status(), StatusCode::OK);
    let json = body_json(response).await;
    assert_eq!(json["data"]["name"], "Alice A.");

    let response = post_json_auth(
        app.clone(),
        "/api/v1/users/me/banner",
        &alice,
        json!({"file_url": "https://blob.test/banner1.jpg", "file_key": "banner-1"}),
    )
    .await;
    assert_eq!(response.status(), StatusCode::OK);

    // A second upload deletes the first banner from the store.
    let response = post_json_auth(
        app,
        "/api/v1/users/me/banner",
        &alice,
        json!({"file_url": "https://blob.test/banner2.jpg", "file_key": "banner-2"}),
    )
    .await;
    let json = body_json(response).await;
    assert_eq!(json["data"]["banner_key"], "banner-2");
    assert_eq!(images.deletes.lock().unwrap().as_slice(), ["banner-1"]);
}

#[sqlx::test(migrations = "../db/migrations")]
async fn search_matches_title_and_requires_query(pool: PgPool) {
    let app = build_test_app(pool);
    let alice = token("alice");
    publish_video(&app, &alice, "Rust ownership explained").await;
    publish_video(&app, &alice, "Gardening basics").await;

    let response = get(app.clone(), "/api/v1/search?query=%20").await;
    assert_error_code(response, StatusCode::BAD_REQUEST, "BAD_REQUEST").await;

    let results = body_json(get(app.clone(), "/api/v1/search?query=ownership").await).await;
    let items = results["data"]["items"].as_array().unwrap();
    assert_eq!(items.len(), 1);
    assert_eq!(items[0]["title"], "Rust ownership explained");

    let results = body_json(get(app, "/api/v1/search?query=knitting").await).await;
    assert!(results["data"]["items"].as_array().unwrap().is_empty());
}

#[sqlx::test(migrations = "../db/migrations")]
async fn categories_list_is_public(pool: PgPool) {
    sqlx::query("INSERT INTO categories (name) VALUES ('Music'), ('Gaming')")
        .execute(&pool)
        .await
        .unwrap();
    let app = build_test_app(pool);

    let response = get(app, "/api/v1/categories").await;
    assert_eq!(response.status(), StatusCode::OK);
    let json = body_json(response).await;
    assert_eq!(json["data"].as_array().unwrap().len(), 2);
}

#[sqlx::test(migrations = "../db/migrations")]
async fn feed_pages_walk_without_overlap(pool: PgPool) {
    let app = build_test_app(pool);
    let alice = token("alice");
    for title in ["One", "Two", "Three"] {
        publish_video(&app, &alice, title).await;
    }

    let first = body_json(get(app.clone(), "/api/v1/videos?limit=2").await).await;
    let items = first["data"]["items"].as_array().unwrap();
    assert_eq!(items.len(), 2);
    assert_eq!(items[0]["title"], "Three");
    assert_eq!(items[1]["title"], "Two");
    let cursor = first["data"]["next_cursor"].as_str().unwrap().to_string();

    let second = body_json(get(app.clone(), &format!("/api/v1/videos?limit=2&cursor={cursor}")).await).await;
    let items = second["data"]["items"].as_array().unwrap();
    assert_eq!(items.len(), 1);
    assert_eq!(items[0]["title"], "One");
    assert!(second["data"]["next_cursor"].is_null(), "final page advertises no cursor");

    // Limits outside [1, 100] are rejected.
    let response = get(app.clone(), "/api/v1/videos?limit=0").await;
    assert_error_code(response, StatusCode::BAD_REQUEST, "VALIDATION_ERROR").await;
    let response = get(app, "/api/v1/videos?limit=101").await;
    assert_error_code(response, StatusCode::BAD_REQUEST, "VALIDATION_ERROR").await;
}
