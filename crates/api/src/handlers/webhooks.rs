//! Inbound webhook from the video processor.
//!
//! Deliveries are at-least-once and unordered. Every transition is a
//! deterministic write keyed by a unique correlation id, so a
//! redelivered or late event converges on the same row state. The
//! signature is checked on the raw body bytes before anything else;
//! unknown event types and unmatched correlation ids are acknowledged
//! with 200 so the processor stops retrying them.

use axum::body::Bytes;
use axum::extract::State;
use axum::http::{HeaderMap, StatusCode};
use axum::response::IntoResponse;
use reelhouse_db::models::video::AssetReadyUpdate;
use reelhouse_db::repositories::VideoRepo;
use reelhouse_media::processor::seconds_to_ms;
use serde::Deserialize;

use crate::error::{AppError, AppResult};
use crate::state::AppState;

/// Header carrying the delivery signature.
pub const SIGNATURE_HEADER: &str = "video-signature";

#[derive(Debug, Deserialize)]
struct Envelope {
    #[serde(rename = "type")]
    event_type: String,
    #[serde(default)]
    data: serde_json::Value,
}

#[derive(Debug, Deserialize)]
struct AssetEvent {
    id: Option<String>,
    upload_id: Option<String>,
    status: Option<String>,
    playback_ids: Option<Vec<PlaybackId>>,
    duration: Option<f64>,
}

#[derive(Debug, Deserialize)]
struct PlaybackId {
    id: String,
}

#[derive(Debug, Deserialize)]
struct TrackEvent {
    asset_id: Option<String>,
    id: Option<String>,
    status: Option<String>,
}

/// POST /api/webhooks/video
pub async fn handle_video_event(
    State(state): State<AppState>,
    headers: HeaderMap,
    body: Bytes,
) -> AppResult<impl IntoResponse> {
    let signature = headers
        .get(SIGNATURE_HEADER)
        .and_then(|v| v.to_str().ok())
        .ok_or_else(|| {
            AppError::Core(reelhouse_core::error::CoreError::Unauthorized(
                "missing webhook signature".into(),
            ))
        })?;
    state
        .verifier
        .verify(signature, &body)
        .map_err(AppError::Core)?;

    let envelope: Envelope = serde_json::from_slice(&body)
        .map_err(|e| AppError::BadRequest(format!("malformed webhook payload: {e}")))?;

    let affected = match envelope.event_type.as_str() {
        "video.asset.created" => {
            let event: AssetEvent = parse_data(envelope.data)?;
            let upload_id = require(event.upload_id, "upload_id")?;
            let asset_id = require(event.id, "id")?;
            let status = event.status.unwrap_or_else(|| "preparing".to_string());
            VideoRepo::apply_asset_created(&state.pool, &upload_id, &asset_id, &status).await?
        }

        "video.asset.ready" => {
            let event: AssetEvent = parse_data(envelope.data)?;
            let upload_id = require(event.upload_id, "upload_id")?;
            let asset_id = require(event.id, "id")?;
            let playback_id = event
                .playback_ids
                .and_then(|ids| ids.into_iter().next())
                .map(|p| p.id);
            let playback_id = require(playback_id, "playback_ids")?;

            // Re-host the derived images before touching the row: if
            // hosting fails the delivery 500s and gets retried whole.
            let thumbnail = state
                .images
                .upload_from_url(&state.processor.thumbnail_url(&playback_id))
                .await?;
            let preview = state
                .images
                .upload_from_url(&state.processor.preview_url(&playback_id))
                .await?;

            let update = AssetReadyUpdate {
                status: event.status.unwrap_or_else(|| "ready".to_string()),
                asset_id,
                playback_id,
                thumbnail_url: thumbnail.url,
                thumbnail_key: thumbnail.key,
                preview_url: preview.url,
                preview_key: preview.key,
                duration_ms: seconds_to_ms(event.duration),
            };
            VideoRepo::apply_asset_ready(&state.pool, &upload_id, &update).await?
        }

        "video.asset.errored" => {
            let event: AssetEvent = parse_data(envelope.data)?;
            let upload_id = require(event.upload_id, "upload_id")?;
            let status = event.status.unwrap_or_else(|| "errored".to_string());
            VideoRepo::apply_asset_errored(&state.pool, &upload_id, &status).await?
        }

        "video.asset.deleted" => {
            let event: AssetEvent = parse_data(envelope.data)?;
            let upload_id = require(event.upload_id, "upload_id")?;
            VideoRepo::delete_by_upload_id(&state.pool, &upload_id).await?
        }

        "video.asset.track.ready" => {
            let event: TrackEvent = parse_data(envelope.data)?;
            let asset_id = require(event.asset_id, "asset_id")?;
            let track_id = require(event.id, "id")?;
            let status = event.status.unwrap_or_else(|| "ready".to_string());
            VideoRepo::apply_track_ready(&state.pool, &asset_id, &track_id, &status).await?
        }

        other => {
            tracing::debug!(event_type = other, "Ignoring unrecognized webhook event");
            0
        }
    };

    if affected == 0 {
        tracing::debug!(event_type = %envelope.event_type, "Webhook matched no row");
    } else {
        tracing::info!(event_type = %envelope.event_type, "Webhook applied");
    }

    // Acknowledge regardless of whether a row matched.
    Ok(StatusCode::OK)
}

fn parse_data<T: serde::de::DeserializeOwned>(data: serde_json::Value) -> AppResult<T> {
    serde_json::from_value(data)
        .map_err(|e| AppError::BadRequest(format!("malformed webhook payload: {e}")))
}

fn require<T>(value: Option<T>, field: &str) -> AppResult<T> {
    value.ok_or_else(|| AppError::BadRequest(format!("webhook payload missing {field}")))
}
