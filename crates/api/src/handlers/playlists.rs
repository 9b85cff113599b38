//! Handlers for playlists. Playlists are private to their owner; every
//! operation here is owner-scoped.

use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::Json;
use reelhouse_core::error::CoreError;
use reelhouse_core::types::DbId;
use reelhouse_db::models::playlist::CreatePlaylist;
use reelhouse_db::repositories::{PlaylistRepo, VideoRepo};

use crate::auth::extractor::AuthUser;
use crate::error::{AppError, AppResult};
use crate::query::{time_cursor, CursorParams};
use crate::response::DataResponse;
use crate::state::AppState;

/// POST /api/v1/playlists
pub async fn create_playlist(
    user: AuthUser,
    State(state): State<AppState>,
    Json(input): Json<CreatePlaylist>,
) -> AppResult<impl IntoResponse> {
    if input.name.trim().is_empty() {
        return Err(AppError::BadRequest("name must not be empty".into()));
    }
    let playlist = PlaylistRepo::create(&state.pool, user.user_id, &input).await?;
    Ok((StatusCode::CREATED, Json(DataResponse { data: playlist })))
}

/// GET /api/v1/playlists
///
/// The caller's playlists with derived fields, most recently touched
/// first.
pub async fn list_playlists(
    user: AuthUser,
    State(state): State<AppState>,
    Query(params): Query<CursorParams>,
) -> AppResult<impl IntoResponse> {
    let request = params.into_request()?;
    let cursor = time_cursor(&request)?;

    let page = PlaylistRepo::list(&state.pool, user.user_id, cursor, request.limit).await?;
    Ok(Json(DataResponse { data: page }))
}

/// GET /api/v1/playlists/{id}
pub async fn get_playlist(
    user: AuthUser,
    State(state): State<AppState>,
    Path(playlist_id): Path<DbId>,
) -> AppResult<impl IntoResponse> {
    let playlist = PlaylistRepo::get_row(&state.pool, playlist_id, user.user_id)
        .await?
        .ok_or(AppError::Core(CoreError::NotFound {
            entity: "Playlist",
            id: playlist_id,
        }))?;
    Ok(Json(DataResponse { data: playlist }))
}

/// DELETE /api/v1/playlists/{id}
pub async fn delete_playlist(
    user: AuthUser,
    State(state): State<AppState>,
    Path(playlist_id): Path<DbId>,
) -> AppResult<impl IntoResponse> {
    PlaylistRepo::delete(&state.pool, playlist_id, user.user_id)
        .await?
        .ok_or(AppError::Core(CoreError::NotFound {
            entity: "Playlist",
            id: playlist_id,
        }))?;
    Ok(StatusCode::NO_CONTENT)
}

/// PUT /api/v1/playlists/{id}/videos/{video_id}
///
/// Add a video to the caller's playlist. Duplicate membership is a 409
/// via the composite key.
pub async fn add_video(
    user: AuthUser,
    State(state): State<AppState>,
    Path((playlist_id, video_id)): Path<(DbId, DbId)>,
) -> AppResult<impl IntoResponse> {
    require_owned_playlist(&state, playlist_id, user.user_id).await?;
    VideoRepo::find_by_id(&state.pool, video_id)
        .await?
        .ok_or(AppError::Core(CoreError::NotFound {
            entity: "Video",
            id: video_id,
        }))?;

    let membership = PlaylistRepo::add_video(&state.pool, playlist_id, video_id).await?;
    Ok((StatusCode::CREATED, Json(DataResponse { data: membership })))
}

/// DELETE /api/v1/playlists/{id}/videos/{video_id}
pub async fn remove_video(
    user: AuthUser,
    State(state): State<AppState>,
    Path((playlist_id, video_id)): Path<(DbId, DbId)>,
) -> AppResult<impl IntoResponse> {
    require_owned_playlist(&state, playlist_id, user.user_id).await?;

    let removed = PlaylistRepo::remove_video(&state.pool, playlist_id, video_id).await?;
    if !removed {
        return Err(AppError::Core(CoreError::NotFound {
            entity: "Video",
            id: video_id,
        }));
    }
    Ok(StatusCode::NO_CONTENT)
}

/// GET /api/v1/playlists/{id}/videos
///
/// The playlist's videos, most recently added first.
pub async fn list_videos(
    user: AuthUser,
    State(state): State<AppState>,
    Path(playlist_id): Path<DbId>,
    Query(params): Query<CursorParams>,
) -> AppResult<impl IntoResponse> {
    require_owned_playlist(&state, playlist_id, user.user_id).await?;

    let request = params.into_request()?;
    let cursor = time_cursor(&request)?;

    let page = PlaylistRepo::list_videos(&state.pool, playlist_id, cursor, request.limit).await?;
    Ok(Json(DataResponse { data: page }))
}

/// GET /api/v1/playlists/for-video/{video_id}
///
/// The caller's playlists, each flagged with whether it already
/// contains the video. Drives the "save to playlist" menu.
pub async fn for_video(
    user: AuthUser,
    State(state): State<AppState>,
    Path(video_id): Path<DbId>,
    Query(params): Query<CursorParams>,
) -> AppResult<impl IntoResponse> {
    let request = params.into_request()?;
    let cursor = time_cursor(&request)?;

    let page =
        PlaylistRepo::for_video(&state.pool, user.user_id, video_id, cursor, request.limit).await?;
    Ok(Json(DataResponse { data: page }))
}

async fn require_owned_playlist(
    state: &AppState,
    playlist_id: DbId,
    user_id: DbId,
) -> AppResult<()> {
    PlaylistRepo::find_owned(&state.pool, playlist_id, user_id)
        .await?
        .ok_or(AppError::Core(CoreError::NotFound {
            entity: "Playlist",
            id: playlist_id,
        }))?;
    Ok(())
}
