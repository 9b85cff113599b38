//! Integration tests for the processor webhook: signature checks,
//! payload validation, and the asset state transitions. Deliveries are
//! at-least-once and unordered, so redelivery and unmatched ids must
//! never error.

mod common;

use axum::http::StatusCode;
use common::{assert_error_code, build_test_app, build_test_app_with_fakes, post_webhook, sign};
use reelhouse_core::signature::WebhookVerifier;
use sqlx::PgPool;
use uuid::Uuid;

async fn seed_video_with_upload(pool: &PgPool, upload_id: &str) -> Uuid {
    let user_id: Uuid = sqlx::query_scalar(
        "INSERT INTO users (external_id, name, image_url) \
         VALUES ('creator', 'Creator', 'https://img.test/c.png') RETURNING id",
    )
    .fetch_one(pool)
    .await
    .unwrap();
    sqlx::query_scalar(
        "INSERT INTO videos (user_id, title, upload_id, status) \
         VALUES ($1, 'Untitled', $2, 'waiting') RETURNING id",
    )
    .bind(user_id)
    .bind(upload_id)
    .fetch_one(pool)
    .await
    .unwrap()
}

async fn video_status(pool: &PgPool, id: Uuid) -> Option<String> {
    sqlx::query_scalar("SELECT status FROM videos WHERE id = $1")
        .bind(id)
        .fetch_one(pool)
        .await
        .unwrap()
}

#[sqlx::test(migrations = "../db/migrations")]
async fn missing_signature_is_rejected(pool: PgPool) {
    let app = build_test_app(pool);
    let body = r#"{"type":"video.asset.created","data":{}}"#;

    let response = post_webhook(app, "/api/webhooks/video", body, None).await;
    assert_error_code(response, StatusCode::UNAUTHORIZED, "UNAUTHORIZED").await;
}

#[sqlx::test(migrations = "../db/migrations")]
async fn wrong_secret_is_rejected_before_any_write(pool: PgPool) {
    let video = seed_video_with_upload(&pool, "up-a").await;
    let app = build_test_app(pool.clone());

    let body = r#"{"type":"video.asset.errored","data":{"upload_id":"up-a","status":"errored"}}"#;
    let forged = WebhookVerifier::new("not-the-secret").sign(chrono::Utc::now().timestamp(), body.as_bytes());

    let response = post_webhook(app, "/api/webhooks/video", body, Some(&forged)).await;
    assert_error_code(response, StatusCode::UNAUTHORIZED, "UNAUTHORIZED").await;
    assert_eq!(video_status(&pool, video).await.as_deref(), Some("waiting"));
}

#[sqlx::test(migrations = "../db/migrations")]
async fn replayed_stale_signature_is_rejected(pool: PgPool) {
    let video = seed_video_with_upload(&pool, "up-r").await;
    let app = build_test_app(pool.clone());

    // A correctly signed capture from well outside the freshness
    // window must not replay.
    let body = r#"{"type":"video.asset.errored","data":{"upload_id":"up-r","status":"errored"}}"#;
    let stale = WebhookVerifier::new(common::WEBHOOK_SECRET)
        .sign(chrono::Utc::now().timestamp() - 3600, body.as_bytes());

    let response = post_webhook(app, "/api/webhooks/video", body, Some(&stale)).await;
    assert_error_code(response, StatusCode::UNAUTHORIZED, "UNAUTHORIZED").await;
    assert_eq!(video_status(&pool, video).await.as_deref(), Some("waiting"));
}

#[sqlx::test(migrations = "../db/migrations")]
async fn malformed_payload_is_a_400(pool: PgPool) {
    let app = build_test_app(pool);
    let body = "not json at all";

    let response = post_webhook(app, "/api/webhooks/video", body, Some(&sign(body))).await;
    assert_error_code(response, StatusCode::BAD_REQUEST, "BAD_REQUEST").await;
}

#[sqlx::test(migrations = "../db/migrations")]
async fn missing_correlation_field_is_a_400(pool: PgPool) {
    let video = seed_video_with_upload(&pool, "up-b").await;
    let app = build_test_app(pool.clone());

    let body = r#"{"type":"video.asset.created","data":{"id":"asset-1","status":"preparing"}}"#;
    let response = post_webhook(app, "/api/webhooks/video", body, Some(&sign(body))).await;

    assert_error_code(response, StatusCode::BAD_REQUEST, "BAD_REQUEST").await;
    assert_eq!(video_status(&pool, video).await.as_deref(), Some("waiting"));
}

#[sqlx::test(migrations = "../db/migrations")]
async fn unknown_event_type_is_acknowledged(pool: PgPool) {
    let app = build_test_app(pool);
    let body = r#"{"type":"video.asset.static_renditions.ready","data":{"upload_id":"up-x"}}"#;

    let response = post_webhook(app, "/api/webhooks/video", body, Some(&sign(body))).await;
    assert_eq!(response.status(), StatusCode::OK);
}

#[sqlx::test(migrations = "../db/migrations")]
async fn unmatched_upload_id_is_acknowledged(pool: PgPool) {
    let app = build_test_app(pool);
    let body = r#"{"type":"video.asset.created","data":{"upload_id":"up-none","id":"asset-1","status":"preparing"}}"#;

    let response = post_webhook(app, "/api/webhooks/video", body, Some(&sign(body))).await;
    assert_eq!(response.status(), StatusCode::OK);
}

#[sqlx::test(migrations = "../db/migrations")]
async fn created_event_attaches_asset(pool: PgPool) {
    let video = seed_video_with_upload(&pool, "up-c").await;
    let app = build_test_app(pool.clone());

    let body = r#"{"type":"video.asset.created","data":{"upload_id":"up-c","id":"asset-c","status":"preparing"}}"#;
    let response = post_webhook(app, "/api/webhooks/video", body, Some(&sign(body))).await;
    assert_eq!(response.status(), StatusCode::OK);

    let (asset_id, status): (Option<String>, Option<String>) =
        sqlx::query_as("SELECT asset_id, status FROM videos WHERE id = $1")
            .bind(video)
            .fetch_one(&pool)
            .await
            .unwrap();
    assert_eq!(asset_id.as_deref(), Some("asset-c"));
    assert_eq!(status.as_deref(), Some("preparing"));
}

#[sqlx::test(migrations = "../db/migrations")]
async fn ready_event_rehosts_images_then_updates_row(pool: PgPool) {
    let video = seed_video_with_upload(&pool, "up-d").await;
    let (app, _processor, images) = build_test_app_with_fakes(pool.clone());

    let body = r#"{"type":"video.asset.ready","data":{"upload_id":"up-d","id":"asset-d","status":"ready","playback_ids":[{"id":"pb-d"}],"duration":61.0005}}"#;
    let response = post_webhook(app, "/api/webhooks/video", body, Some(&sign(body))).await;
    assert_eq!(response.status(), StatusCode::OK);

    // Both derived images were pulled from the processor CDN.
    assert_eq!(
        images.uploads.lock().unwrap().as_slice(),
        [
            "https://images.test/pb-d/thumbnail.jpg",
            "https://images.test/pb-d/animated.gif",
        ]
    );

    let (status, playback_id, thumbnail_key, preview_key, duration_ms): (
        Option<String>,
        Option<String>,
        Option<String>,
        Option<String>,
        i32,
    ) = sqlx::query_as(
        "SELECT status, playback_id, thumbnail_key, preview_key, duration_ms \
         FROM videos WHERE id = $1",
    )
    .bind(video)
    .fetch_one(&pool)
    .await
    .unwrap();
    assert_eq!(status.as_deref(), Some("ready"));
    assert_eq!(playback_id.as_deref(), Some("pb-d"));
    assert_eq!(thumbnail_key.as_deref(), Some("hosted-key-1"));
    assert_eq!(preview_key.as_deref(), Some("hosted-key-2"));
    assert_eq!(duration_ms, 61_001, "fractional seconds round to whole ms");
}

#[sqlx::test(migrations = "../db/migrations")]
async fn ready_event_with_failed_rehost_leaves_row_untouched(pool: PgPool) {
    let video = seed_video_with_upload(&pool, "up-e").await;
    let (app, _processor, images) = build_test_app_with_fakes(pool.clone());
    images
        .fail_uploads
        .store(true, std::sync::atomic::Ordering::SeqCst);

    let body = r#"{"type":"video.asset.ready","data":{"upload_id":"up-e","id":"asset-e","status":"ready","playback_ids":[{"id":"pb-e"}],"duration":10.0}}"#;
    let response = post_webhook(app, "/api/webhooks/video", body, Some(&sign(body))).await;

    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(
        video_status(&pool, video).await.as_deref(),
        Some("waiting"),
        "the row is not updated when hosting fails"
    );
}

#[sqlx::test(migrations = "../db/migrations")]
async fn errored_and_deleted_events_apply(pool: PgPool) {
    let video = seed_video_with_upload(&pool, "up-f").await;
    let (app, _, _) = build_test_app_with_fakes(pool.clone());

    let body = r#"{"type":"video.asset.errored","data":{"upload_id":"up-f","status":"errored"}}"#;
    let response = post_webhook(app.clone(), "/api/webhooks/video", body, Some(&sign(body))).await;
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(video_status(&pool, video).await.as_deref(), Some("errored"));

    let body = r#"{"type":"video.asset.deleted","data":{"upload_id":"up-f"}}"#;
    let response = post_webhook(app.clone(), "/api/webhooks/video", body, Some(&sign(body))).await;
    assert_eq!(response.status(), StatusCode::OK);

    let remaining: i64 = sqlx::query_scalar("SELECT count(*) FROM videos WHERE id = $1")
        .bind(video)
        .fetch_one(&pool)
        .await
        .unwrap();
    assert_eq!(remaining, 0);

    // Redelivery of the delete is a no-op, still acknowledged.
    let response = post_webhook(app, "/api/webhooks/video", body, Some(&sign(body))).await;
    assert_eq!(response.status(), StatusCode::OK);
}

#[sqlx::test(migrations = "../db/migrations")]
async fn track_ready_event_is_correlated_by_asset_id(pool: PgPool) {
    let video = seed_video_with_upload(&pool, "up-g").await;
    sqlx::query("UPDATE videos SET asset_id = 'asset-g' WHERE id = $1")
        .bind(video)
        .execute(&pool)
        .await
        .unwrap();
    let app = build_test_app(pool.clone());

    let body = r#"{"type":"video.asset.track.ready","data":{"asset_id":"asset-g","id":"trk-g","status":"ready"}}"#;
    let response = post_webhook(app, "/api/webhooks/video", body, Some(&sign(body))).await;
    assert_eq!(response.status(), StatusCode::OK);

    let (track_id, track_status): (Option<String>, Option<String>) =
        sqlx::query_as("SELECT track_id, track_status FROM videos WHERE id = $1")
            .bind(video)
            .fetch_one(&pool)
            .await
            .unwrap();
    assert_eq!(track_id.as_deref(), Some("trk-g"));
    assert_eq!(track_status.as_deref(), Some("ready"));
}
