//! Handlers for user profiles and channel pages.

use axum::extract::{Path, Query, State};
use axum::response::IntoResponse;
use axum::Json;
use reelhouse_core::error::CoreError;
use reelhouse_core::types::DbId;
use reelhouse_db::repositories::{UserRepo, VideoRepo};
use serde::Deserialize;

use crate::auth::extractor::{AuthUser, MaybeAuthUser};
use crate::error::{AppError, AppResult};
use crate::query::{time_cursor, CursorParams};
use crate::response::DataResponse;
use crate::state::AppState;

use super::videos::UploadedFile;

#[derive(Debug, Deserialize)]
pub struct UpdateMe {
    pub name: String,
}

/// PATCH /api/v1/users/me
pub async fn update_me(
    user: AuthUser,
    State(state): State<AppState>,
    Json(input): Json<UpdateMe>,
) -> AppResult<impl IntoResponse> {
    if input.name.trim().is_empty() {
        return Err(AppError::BadRequest("name must not be empty".into()));
    }

    let updated = UserRepo::update_name(&state.pool, user.user_id, input.name.trim())
        .await?
        .ok_or(AppError::Core(CoreError::NotFound {
            entity: "User",
            id: user.user_id,
        }))?;
    Ok(Json(DataResponse { data: updated }))
}

/// POST /api/v1/users/me/banner
///
/// Completion callback after the client uploaded a channel banner.
pub async fn complete_banner_upload(
    user: AuthUser,
    State(state): State<AppState>,
    Json(input): Json<UploadedFile>,
) -> AppResult<impl IntoResponse> {
    let current = UserRepo::find_by_id(&state.pool, user.user_id)
        .await?
        .ok_or(AppError::Core(CoreError::NotFound {
            entity: "User",
            id: user.user_id,
        }))?;

    if let Some(old_key) = &current.banner_key {
        if let Err(err) = state.images.delete(old_key).await {
            tracing::warn!(user_id = %user.user_id, key = %old_key, error = %err, "Old banner cleanup failed");
        }
    }

    let updated = UserRepo::set_banner(&state.pool, user.user_id, &input.file_url, &input.file_key)
        .await?
        .ok_or(AppError::Core(CoreError::NotFound {
            entity: "User",
            id: user.user_id,
        }))?;
    Ok(Json(DataResponse { data: updated }))
}

/// GET /api/v1/users/{id}
///
/// A channel page: profile, counts, and whether the viewer subscribes.
pub async fn get_profile(
    MaybeAuthUser(viewer): MaybeAuthUser,
    State(state): State<AppState>,
    Path(user_id): Path<DbId>,
) -> AppResult<impl IntoResponse> {
    let profile = UserRepo::get_profile(&state.pool, user_id, viewer)
        .await?
        .ok_or(AppError::Core(CoreError::NotFound {
            entity: "User",
            id: user_id,
        }))?;
    Ok(Json(DataResponse { data: profile }))
}

/// GET /api/v1/users/{id}/videos
///
/// A channel's public videos, newest first.
pub async fn list_channel_videos(
    State(state): State<AppState>,
    Path(user_id): Path<DbId>,
    Query(params): Query<CursorParams>,
) -> AppResult<impl IntoResponse> {
    let request = params.into_request()?;
    let cursor = time_cursor(&request)?;

    let page = VideoRepo::list_by_channel(&state.pool, user_id, cursor, request.limit).await?;
    Ok(Json(DataResponse { data: page }))
}
