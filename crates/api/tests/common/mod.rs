//! Shared harness for the API integration tests: a router built the
//! same way `main.rs` builds it, with in-memory fakes standing in for
//! the external media services.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use axum::body::Body;
use axum::http::{header, Method, Request, StatusCode};
use axum::response::Response;
use axum::Router;
use http_body_util::BodyExt;
use sqlx::PgPool;
use tower::ServiceExt;

use reelhouse_api::auth::jwt::{Claims, JwtConfig};
use reelhouse_api::config::ServerConfig;
use reelhouse_api::limit::ApiRateLimiter;
use reelhouse_api::router::build_app_router;
use reelhouse_api::state::AppState;
use reelhouse_core::signature::WebhookVerifier;
use reelhouse_media::{
    AssetInfo, DirectUpload, ImageHost, MediaError, StoredFile, UploadInfo, VideoProcessor,
};

pub const WEBHOOK_SECRET: &str = "test-webhook-secret";
pub const JWT_SECRET: &str = "test-jwt-secret-that-is-long-enough";

pub fn test_config() -> ServerConfig {
    ServerConfig {
        host: "127.0.0.1".to_string(),
        port: 0,
        cors_origins: vec!["http://localhost:3000".to_string()],
        request_timeout_secs: 30,
        webhook_secret: WEBHOOK_SECRET.to_string(),
        jwt: JwtConfig {
            secret: JWT_SECRET.to_string(),
        },
    }
}

// ---------------------------------------------------------------------------
// Fake media services
// ---------------------------------------------------------------------------

/// Deterministic stand-in for the video processor.
#[derive(Default)]
pub struct FakeProcessor {
    uploads: AtomicUsize,
    pub deleted_assets: Mutex<Vec<String>>,
}

#[async_trait]
impl VideoProcessor for FakeProcessor {
    async fn create_direct_upload(&self) -> Result<DirectUpload, MediaError> {
        let n = self.uploads.fetch_add(1, Ordering::SeqCst) + 1;
        Ok(DirectUpload {
            upload_id: format!("up-{n}"),
            upload_url: format!("https://upload.test/{n}"),
        })
    }

    async fn get_upload(&self, upload_id: &str) -> Result<UploadInfo, MediaError> {
        Ok(UploadInfo {
            asset_id: Some(format!("asset-for-{upload_id}")),
        })
    }

    async fn get_asset(&self, _asset_id: &str) -> Result<AssetInfo, MediaError> {
        Ok(AssetInfo {
            status: "ready".to_string(),
            playback_id: Some("pb-revalidated".to_string()),
            duration_ms: 61_001,
        })
    }

    async fn delete_asset(&self, asset_id: &str) -> Result<(), MediaError> {
        self.deleted_assets.lock().unwrap().push(asset_id.to_string());
        Ok(())
    }

    async fn fetch_transcript(
        &self,
        _playback_id: &str,
        _track_id: &str,
    ) -> Result<String, MediaError> {
        Ok("a transcript".to_string())
    }

    fn thumbnail_url(&self, playback_id: &str) -> String {
        format!("https://images.test/{playback_id}/thumbnail.jpg")
    }

    fn preview_url(&self, playback_id: &str) -> String {
        format!("https://images.test/{playback_id}/animated.gif")
    }
}

/// In-memory blob store that logs uploads and deletes.
#[derive(Default)]
pub struct FakeImages {
    counter: AtomicUsize,
    pub uploads: Mutex<Vec<String>>,
    pub deletes: Mutex<Vec<String>>,
    pub fail_uploads: std::sync::atomic::AtomicBool,
}

#[async_trait]
impl ImageHost for FakeImages {
    async fn upload_from_url(&self, source_url: &str) -> Result<StoredFile, MediaError> {
        if self.fail_uploads.load(Ordering::SeqCst) {
            return Err(MediaError::Api {
                status: 503,
                body: "store unavailable".into(),
            });
        }
        self.uploads.lock().unwrap().push(source_url.to_string());
        let n = self.counter.fetch_add(1, Ordering::SeqCst) + 1;
        Ok(StoredFile {
            key: format!("hosted-key-{n}"),
            url: format!("https://blob.test/hosted-{n}.jpg"),
        })
    }

    async fn delete(&self, key: &str) -> Result<(), MediaError> {
        self.deletes.lock().unwrap().push(key.to_string());
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// App construction
// ---------------------------------------------------------------------------

pub fn build_test_app(pool: PgPool) -> Router {
    let (app, _, _) = build_test_app_with_fakes(pool);
    app
}

/// Build the app and hand back the fakes for inspection.
pub fn build_test_app_with_fakes(pool: PgPool) -> (Router, Arc<FakeProcessor>, Arc<FakeImages>) {
    let config = test_config();
    let processor = Arc::new(FakeProcessor::default());
    let images = Arc::new(FakeImages::default());

    let state = AppState {
        pool,
        config: Arc::new(config.clone()),
        processor: Arc::clone(&processor) as Arc<dyn VideoProcessor>,
        images: Arc::clone(&images) as Arc<dyn ImageHost>,
        verifier: Arc::new(WebhookVerifier::new(WEBHOOK_SECRET)),
        limiter: Arc::new(ApiRateLimiter::default()),
    };

    (build_app_router(state, &config), processor, images)
}

// ---------------------------------------------------------------------------
// Auth and signing
// ---------------------------------------------------------------------------

/// Mint an access token for a fictional provider identity.
pub fn token(external_id: &str) -> String {
    let now = chrono::Utc::now().timestamp();
    let claims = Claims {
        sub: external_id.to_string(),
        name: format!("user {external_id}"),
        image_url: "https://img.test/avatar.png".to_string(),
        exp: now + 900,
        iat: now,
    };
    jsonwebtoken::encode(
        &jsonwebtoken::Header::default(),
        &claims,
        &jsonwebtoken::EncodingKey::from_secret(JWT_SECRET.as_bytes()),
    )
    .unwrap()
}

/// Sign a webhook body with the configured test secret.
pub fn sign(body: &str) -> String {
    WebhookVerifier::new(WEBHOOK_SECRET).sign(chrono::Utc::now().timestamp(), body.as_bytes())
}

// ---------------------------------------------------------------------------
// Request helpers
// ---------------------------------------------------------------------------

pub async fn get(app: Router, uri: &str) -> Response {
    let request = Request::builder().uri(uri).body(Body::empty()).unwrap();
    app.oneshot(request).await.unwrap()
}

pub async fn get_auth(app: Router, uri: &str, token: &str) -> Response {
    let request = Request::builder()
        .uri(uri)
        .header(header::AUTHORIZATION, format!("Bearer {token}"))
        .body(Body::empty())
        .unwrap();
    app.oneshot(request).await.unwrap()
}

pub async fn send_json(
    app: Router,
    method: Method,
    uri: &str,
    token: Option<&str>,
    body: Option<serde_json::Value>,
) -> Response {
    let mut builder = Request::builder().method(method).uri(uri);
    if let Some(token) = token {
        builder = builder.header(header::AUTHORIZATION, format!("Bearer {token}"));
    }
    let request = match body {
        Some(json) => builder
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(json.to_string()))
            .unwrap(),
        None => builder.body(Body::empty()).unwrap(),
    };
    app.oneshot(request).await.unwrap()
}

pub async fn post_auth(app: Router, uri: &str, token: &str) -> Response {
    send_json(app, Method::POST, uri, Some(token), None).await
}

pub async fn post_json_auth(
    app: Router,
    uri: &str,
    token: &str,
    body: serde_json::Value,
) -> Response {
    send_json(app, Method::POST, uri, Some(token), Some(body)).await
}

pub async fn patch_json_auth(
    app: Router,
    uri: &str,
    token: &str,
    body: serde_json::Value,
) -> Response {
    send_json(app, Method::PATCH, uri, Some(token), Some(body)).await
}

pub async fn put_auth(app: Router, uri: &str, token: &str) -> Response {
    send_json(app, Method::PUT, uri, Some(token), None).await
}

pub async fn delete_auth(app: Router, uri: &str, token: &str) -> Response {
    send_json(app, Method::DELETE, uri, Some(token), None).await
}

/// POST a raw webhook body with an explicit signature header.
pub async fn post_webhook(app: Router, uri: &str, body: &str, signature: Option<&str>) -> Response {
    let mut builder = Request::builder()
        .method(Method::POST)
        .uri(uri)
        .header(header::CONTENT_TYPE, "application/json");
    if let Some(signature) = signature {
        builder = builder.header("video-signature", signature);
    }
    let request = builder.body(Body::from(body.to_string())).unwrap();
    app.oneshot(request).await.unwrap()
}

pub async fn body_json(response: Response) -> serde_json::Value {
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    serde_json::from_slice(&bytes).unwrap()
}

/// Assert the `{error, code}` envelope with the expected status.
pub async fn assert_error_code(response: Response, status: StatusCode, code: &str) {
    assert_eq!(response.status(), status);
    let json = body_json(response).await;
    assert_eq!(json["code"], code);
    assert!(json["error"].is_string());
}
