use std::sync::Arc;
use std::time::Duration;

use tokio_util::sync::CancellationToken;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use reelhouse_media::{HttpImageHost, HttpTextGenerator, HttpVideoProcessor};
use reelhouse_worker::Worker;

fn require_env(name: &str) -> String {
    std::env::var(name).unwrap_or_else(|_| panic!("{name} must be set in the environment"))
}

#[tokio::main]
async fn main() {
    dotenvy::dotenv().ok();

    // --- Tracing ---
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "reelhouse_worker=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    // --- Database ---
    let database_url = require_env("DATABASE_URL");
    let pool = reelhouse_db::create_pool(&database_url)
        .await
        .expect("Failed to connect to database");
    reelhouse_db::health_check(&pool)
        .await
        .expect("Database health check failed");
    tracing::info!("Database connection established");

    // --- Service clients ---
    let http = reqwest::Client::builder()
        .timeout(Duration::from_secs(60))
        .build()
        .expect("Failed to build HTTP client");

    let processor = Arc::new(HttpVideoProcessor::new(
        http.clone(),
        require_env("PROCESSOR_API_URL"),
        require_env("PROCESSOR_IMAGE_CDN_URL"),
        require_env("PROCESSOR_STREAM_CDN_URL"),
        require_env("PROCESSOR_TOKEN"),
    ));
    let images = Arc::new(HttpImageHost::new(
        http.clone(),
        require_env("IMAGE_HOST_API_URL"),
        require_env("IMAGE_HOST_TOKEN"),
    ));
    let text = Arc::new(HttpTextGenerator::new(
        http,
        require_env("TEXTGEN_API_URL"),
        require_env("TEXTGEN_TOKEN"),
        std::env::var("TEXTGEN_MODEL").unwrap_or_else(|_| "deepseek/deepseek-chat".into()),
    ));

    // --- Claim loop ---
    let worker = Worker::new(pool, processor, images, text);
    let cancel = CancellationToken::new();

    let loop_cancel = cancel.clone();
    let handle = tokio::spawn(async move {
        worker.run(loop_cancel).await;
    });

    shutdown_signal().await;
    cancel.cancel();
    let _ = tokio::time::timeout(Duration::from_secs(30), handle).await;
    tracing::info!("Graceful shutdown complete");
}

/// Wait for SIGINT or SIGTERM.
async fn shutdown_signal() {
    let ctrl_c = async {
        tokio::signal::ctrl_c()
            .await
            .expect("Failed to install Ctrl-C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())
            .expect("Failed to install SIGTERM handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {
            tracing::info!("Received SIGINT (Ctrl-C), starting graceful shutdown");
        }
        () = terminate => {
            tracing::info!("Received SIGTERM, starting graceful shutdown");
        }
    }
}
