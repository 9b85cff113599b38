//! Handlers for the video feeds and the owner's video lifecycle.

use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::Json;
use reelhouse_core::error::CoreError;
use reelhouse_core::types::DbId;
use reelhouse_db::models::reaction::ReactionKind;
use reelhouse_db::models::video::{UpdateVideo, Video};
use reelhouse_db::repositories::{JobRepo, ReactionRepo, VideoRepo, ViewRepo};
use serde::{Deserialize, Serialize};

use crate::auth::extractor::{AuthUser, MaybeAuthUser};
use crate::error::{AppError, AppResult};
use crate::query::{count_cursor, time_cursor, CursorParams};
use crate::response::DataResponse;
use crate::state::AppState;

// ---------------------------------------------------------------------------
// Feeds
// ---------------------------------------------------------------------------

#[derive(Debug, Deserialize)]
pub struct FeedParams {
    pub cursor: Option<String>,
    pub limit: Option<i64>,
    pub category_id: Option<DbId>,
}

/// GET /api/v1/videos
///
/// The public feed, newest first, optionally filtered by category.
pub async fn list_feed(
    State(state): State<AppState>,
    Query(params): Query<FeedParams>,
) -> AppResult<impl IntoResponse> {
    let request = CursorParams {
        cursor: params.cursor,
        limit: params.limit,
    }
    .into_request()?;
    let cursor = time_cursor(&request)?;

    let page = VideoRepo::list_feed(&state.pool, params.category_id, cursor, request.limit).await?;
    Ok(Json(DataResponse { data: page }))
}

/// GET /api/v1/videos/trending
///
/// Public videos ranked by unique-viewer count.
pub async fn list_trending(
    State(state): State<AppState>,
    Query(params): Query<CursorParams>,
) -> AppResult<impl IntoResponse> {
    let request = params.into_request()?;
    let cursor = count_cursor(&request)?;

    let page = VideoRepo::list_trending(&state.pool, cursor, request.limit).await?;
    Ok(Json(DataResponse { data: page }))
}

/// GET /api/v1/videos/subscribed
///
/// Public videos from creators the caller follows.
pub async fn list_subscribed(
    user: AuthUser,
    State(state): State<AppState>,
    Query(params): Query<CursorParams>,
) -> AppResult<impl IntoResponse> {
    let request = params.into_request()?;
    let cursor = time_cursor(&request)?;

    let page = VideoRepo::list_subscribed(&state.pool, user.user_id, cursor, request.limit).await?;
    Ok(Json(DataResponse { data: page }))
}

/// GET /api/v1/videos/history
///
/// The caller's watch history, most recent watch first.
pub async fn list_history(
    user: AuthUser,
    State(state): State<AppState>,
    Query(params): Query<CursorParams>,
) -> AppResult<impl IntoResponse> {
    let request = params.into_request()?;
    let cursor = time_cursor(&request)?;

    let page = VideoRepo::list_history(&state.pool, user.user_id, cursor, request.limit).await?;
    Ok(Json(DataResponse { data: page }))
}

/// GET /api/v1/videos/liked
///
/// Videos the caller currently likes, most recent like first.
pub async fn list_liked(
    user: AuthUser,
    State(state): State<AppState>,
    Query(params): Query<CursorParams>,
) -> AppResult<impl IntoResponse> {
    let request = params.into_request()?;
    let cursor = time_cursor(&request)?;

    let page = VideoRepo::list_liked(&state.pool, user.user_id, cursor, request.limit).await?;
    Ok(Json(DataResponse { data: page }))
}

/// GET /api/v1/videos/studio
///
/// All of the caller's own videos, private included.
pub async fn list_studio(
    user: AuthUser,
    State(state): State<AppState>,
    Query(params): Query<CursorParams>,
) -> AppResult<impl IntoResponse> {
    let request = params.into_request()?;
    let cursor = time_cursor(&request)?;

    let page = VideoRepo::list_by_owner(&state.pool, user.user_id, cursor, request.limit).await?;
    Ok(Json(DataResponse { data: page }))
}

// ---------------------------------------------------------------------------
// Lifecycle
// ---------------------------------------------------------------------------

#[derive(Debug, Serialize)]
pub struct CreatedVideo {
    #[serde(flatten)]
    pub video: Video,
    /// Where the client PUTs the file.
    pub upload_url: String,
}

/// POST /api/v1/videos
///
/// Ask the processor for a direct-upload slot and insert the
/// placeholder row. The row stays private until the owner publishes it.
pub async fn create_video(
    user: AuthUser,
    State(state): State<AppState>,
) -> AppResult<impl IntoResponse> {
    state.limiter.check(user.user_id)?;

    let upload = state.processor.create_direct_upload().await?;
    let video = VideoRepo::create(
        &state.pool,
        user.user_id,
        "Untitled",
        &upload.upload_id,
        "waiting",
    )
    .await?;

    tracing::info!(video_id = %video.id, user_id = %user.user_id, "Video created");

    Ok((
        StatusCode::CREATED,
        Json(DataResponse {
            data: CreatedVideo {
                video,
                upload_url: upload.upload_url,
            },
        }),
    ))
}

/// GET /api/v1/videos/{id}
///
/// The watch page: aggregates plus viewer-relative facts.
pub async fn get_video(
    MaybeAuthUser(viewer): MaybeAuthUser,
    State(state): State<AppState>,
    Path(video_id): Path<DbId>,
) -> AppResult<impl IntoResponse> {
    let detail = VideoRepo::get_detail(&state.pool, video_id, viewer)
        .await?
        .ok_or(AppError::Core(CoreError::NotFound {
            entity: "Video",
            id: video_id,
        }))?;

    Ok(Json(DataResponse { data: detail }))
}

/// PATCH /api/v1/videos/{id}
///
/// Owner-scoped partial update; absent fields keep their values.
pub async fn update_video(
    user: AuthUser,
    State(state): State<AppState>,
    Path(video_id): Path<DbId>,
    Json(input): Json<UpdateVideo>,
) -> AppResult<impl IntoResponse> {
    if let Some(title) = &input.title {
        if title.trim().is_empty() {
            return Err(AppError::BadRequest("title must not be empty".into()));
        }
    }

    let updated = VideoRepo::update(&state.pool, video_id, user.user_id, &input)
        .await?
        .ok_or(AppError::Core(CoreError::NotFound {
            entity: "Video",
            id: video_id,
        }))?;

    Ok(Json(DataResponse { data: updated }))
}

/// DELETE /api/v1/videos/{id}
///
/// Owner-scoped delete. Stored images and the processor asset are
/// cleaned up best-effort after the row is gone.
pub async fn delete_video(
    user: AuthUser,
    State(state): State<AppState>,
    Path(video_id): Path<DbId>,
) -> AppResult<impl IntoResponse> {
    let deleted = VideoRepo::delete(&state.pool, video_id, user.user_id)
        .await?
        .ok_or(AppError::Core(CoreError::NotFound {
            entity: "Video",
            id: video_id,
        }))?;

    for key in [&deleted.thumbnail_key, &deleted.preview_key] {
        if let Some(key) = key {
            if let Err(err) = state.images.delete(key).await {
                tracing::warn!(video_id = %video_id, %key, error = %err, "Stored image cleanup failed");
            }
        }
    }
    if let Some(asset_id) = &deleted.asset_id {
        if let Err(err) = state.processor.delete_asset(asset_id).await {
            tracing::warn!(video_id = %video_id, %asset_id, error = %err, "Asset cleanup failed");
        }
    }

    tracing::info!(video_id = %video_id, user_id = %user.user_id, "Video deleted");

    Ok(StatusCode::NO_CONTENT)
}

/// POST /api/v1/videos/{id}/revalidate
///
/// Re-pull the asset state from the processor, for when a webhook was
/// missed.
pub async fn revalidate_video(
    user: AuthUser,
    State(state): State<AppState>,
    Path(video_id): Path<DbId>,
) -> AppResult<impl IntoResponse> {
    let video = find_owned(&state, video_id, user.user_id).await?;
    let upload_id = video.upload_id.ok_or_else(|| {
        AppError::BadRequest("video has no upload to revalidate against".into())
    })?;

    let upload = state.processor.get_upload(&upload_id).await?;
    let asset_id = upload
        .asset_id
        .ok_or_else(|| AppError::BadRequest("upload has no asset yet".into()))?;
    let asset = state.processor.get_asset(&asset_id).await?;

    let updated = VideoRepo::set_asset_state(
        &state.pool,
        video_id,
        user.user_id,
        &asset.status,
        &asset_id,
        asset.playback_id.as_deref(),
        asset.duration_ms,
    )
    .await?
    .ok_or(AppError::Core(CoreError::NotFound {
        entity: "Video",
        id: video_id,
    }))?;

    Ok(Json(DataResponse { data: updated }))
}

/// POST /api/v1/videos/{id}/restore-thumbnail
///
/// Drop the uploaded thumbnail and re-host the processor's default
/// frame in its place.
pub async fn restore_thumbnail(
    user: AuthUser,
    State(state): State<AppState>,
    Path(video_id): Path<DbId>,
) -> AppResult<impl IntoResponse> {
    let video = find_owned(&state, video_id, user.user_id).await?;
    let playback_id = video
        .playback_id
        .ok_or_else(|| AppError::BadRequest("video is not ready for playback yet".into()))?;

    if let Some(old_key) = &video.thumbnail_key {
        if let Err(err) = state.images.delete(old_key).await {
            tracing::warn!(video_id = %video_id, key = %old_key, error = %err, "Old thumbnail cleanup failed");
        }
    }

    let hosted = state
        .images
        .upload_from_url(&state.processor.thumbnail_url(&playback_id))
        .await?;
    let updated = VideoRepo::set_thumbnail(
        &state.pool,
        video_id,
        user.user_id,
        &hosted.url,
        &hosted.key,
    )
    .await?
    .ok_or(AppError::Core(CoreError::NotFound {
        entity: "Video",
        id: video_id,
    }))?;

    Ok(Json(DataResponse { data: updated }))
}

#[derive(Debug, Deserialize)]
pub struct UploadedFile {
    pub file_url: String,
    pub file_key: String,
}

/// POST /api/v1/videos/{id}/thumbnail
///
/// Completion callback after the client uploaded a custom thumbnail to
/// the blob store.
pub async fn complete_thumbnail_upload(
    user: AuthUser,
    State(state): State<AppState>,
    Path(video_id): Path<DbId>,
    Json(input): Json<UploadedFile>,
) -> AppResult<impl IntoResponse> {
    let video = find_owned(&state, video_id, user.user_id).await?;

    if let Some(old_key) = &video.thumbnail_key {
        if let Err(err) = state.images.delete(old_key).await {
            tracing::warn!(video_id = %video_id, key = %old_key, error = %err, "Old thumbnail cleanup failed");
        }
    }

    let updated = VideoRepo::set_thumbnail(
        &state.pool,
        video_id,
        user.user_id,
        &input.file_url,
        &input.file_key,
    )
    .await?
    .ok_or(AppError::Core(CoreError::NotFound {
        entity: "Video",
        id: video_id,
    }))?;

    Ok(Json(DataResponse { data: updated }))
}

// ---------------------------------------------------------------------------
// Engagement
// ---------------------------------------------------------------------------

/// POST /api/v1/videos/{id}/views
///
/// Record that the caller watched this video. A repeat watch bumps the
/// history timestamp instead of adding a row.
pub async fn record_view(
    user: AuthUser,
    State(state): State<AppState>,
    Path(video_id): Path<DbId>,
) -> AppResult<impl IntoResponse> {
    require_video(&state, video_id).await?;
    let view = ViewRepo::record(&state.pool, user.user_id, video_id).await?;
    Ok((StatusCode::CREATED, Json(DataResponse { data: view })))
}

#[derive(Debug, Deserialize)]
pub struct ReactionInput {
    #[serde(rename = "type")]
    pub kind: ReactionKind,
}

/// POST /api/v1/videos/{id}/reactions
///
/// Toggle a like/dislike. `reaction` is null when the toggle removed
/// the caller's reaction.
pub async fn toggle_reaction(
    user: AuthUser,
    State(state): State<AppState>,
    Path(video_id): Path<DbId>,
    Json(input): Json<ReactionInput>,
) -> AppResult<impl IntoResponse> {
    require_video(&state, video_id).await?;
    let reaction =
        ReactionRepo::toggle_video(&state.pool, user.user_id, video_id, input.kind).await?;
    Ok(Json(DataResponse {
        data: serde_json::json!({ "reaction": reaction }),
    }))
}

// ---------------------------------------------------------------------------
// Metadata generation
// ---------------------------------------------------------------------------

#[derive(Debug, Deserialize, Default)]
pub struct GenerateInput {
    /// Required for thumbnail generation, ignored otherwise.
    pub prompt: Option<String>,
}

/// POST /api/v1/videos/{id}/generate/{field}
///
/// Enqueue a metadata generation job and return its handle. The job is
/// executed by the worker binary.
pub async fn generate_metadata(
    user: AuthUser,
    State(state): State<AppState>,
    Path((video_id, field)): Path<(DbId, String)>,
    input: Option<Json<GenerateInput>>,
) -> AppResult<impl IntoResponse> {
    state.limiter.check(user.user_id)?;

    let job_type = match field.as_str() {
        "title" => "generate-title",
        "description" => "generate-description",
        "thumbnail" => "generate-thumbnail",
        other => {
            return Err(AppError::BadRequest(format!(
                "unknown generation target: {other}"
            )))
        }
    };

    // Ownership is checked again by the worker; failing here gives the
    // caller an immediate 404 instead of a failed job.
    find_owned(&state, video_id, user.user_id).await?;

    let mut payload = serde_json::Map::new();
    if job_type == "generate-thumbnail" {
        let prompt = input
            .as_ref()
            .and_then(|i| i.prompt.clone())
            .filter(|p| !p.trim().is_empty())
            .ok_or_else(|| AppError::BadRequest("thumbnail generation requires a prompt".into()))?;
        payload.insert("prompt".into(), serde_json::Value::String(prompt));
    }

    let job = JobRepo::enqueue(
        &state.pool,
        job_type,
        user.user_id,
        video_id,
        serde_json::Value::Object(payload),
    )
    .await?;

    tracing::info!(job_id = %job.id, job_type, video_id = %video_id, "Metadata job enqueued");

    Ok((
        StatusCode::ACCEPTED,
        Json(DataResponse {
            data: serde_json::json!({ "job_id": job.id }),
        }),
    ))
}

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

async fn find_owned(state: &AppState, video_id: DbId, user_id: DbId) -> AppResult<Video> {
    VideoRepo::find_owned(&state.pool, video_id, user_id)
        .await?
        .ok_or(AppError::Core(CoreError::NotFound {
            entity: "Video",
            id: video_id,
        }))
}

async fn require_video(state: &AppState, video_id: DbId) -> AppResult<()> {
    VideoRepo::find_by_id(&state.pool, video_id)
        .await?
        .ok_or(AppError::Core(CoreError::NotFound {
            entity: "Video",
            id: video_id,
        }))?;
    Ok(())
}
