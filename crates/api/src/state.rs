use std::sync::Arc;

use reelhouse_core::signature::WebhookVerifier;
use reelhouse_media::{ImageHost, VideoProcessor};

use crate::config::ServerConfig;
use crate::limit::ApiRateLimiter;

/// Shared application state available to all Axum handlers via
/// `State<AppState>`.
///
/// Cheaply cloneable (inner data is behind `Arc`).
#[derive(Clone)]
pub struct AppState {
    /// Database connection pool.
    pub pool: reelhouse_db::DbPool,
    /// Server configuration.
    pub config: Arc<ServerConfig>,
    /// Video processing service client.
    pub processor: Arc<dyn VideoProcessor>,
    /// Blob store client for hosted images.
    pub images: Arc<dyn ImageHost>,
    /// Verifier for processor webhook signatures.
    pub verifier: Arc<WebhookVerifier>,
    /// Per-user rate limiter for expensive mutations.
    pub limiter: Arc<ApiRateLimiter>,
}
