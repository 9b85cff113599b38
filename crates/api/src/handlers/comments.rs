//! Handlers for threaded comments.
//!
//! Replies are single-level: a reply's parent must itself be a
//! top-level comment on the same video.

use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::Json;
use reelhouse_core::error::CoreError;
use reelhouse_core::pagination::Page;
use reelhouse_core::types::DbId;
use reelhouse_db::models::comment::{CommentRow, CreateComment};
use reelhouse_db::repositories::{CommentRepo, ReactionRepo, VideoRepo};
use serde::{Deserialize, Serialize};

use crate::auth::extractor::{AuthUser, MaybeAuthUser};
use crate::error::{AppError, AppResult};
use crate::query::{time_cursor, CursorParams};
use crate::response::DataResponse;
use crate::state::AppState;

use super::videos::ReactionInput;

/// POST /api/v1/comments
pub async fn create_comment(
    user: AuthUser,
    State(state): State<AppState>,
    Json(input): Json<CreateComment>,
) -> AppResult<impl IntoResponse> {
    if input.value.trim().is_empty() {
        return Err(AppError::BadRequest("comment must not be empty".into()));
    }
    VideoRepo::find_by_id(&state.pool, input.video_id)
        .await?
        .ok_or(AppError::Core(CoreError::NotFound {
            entity: "Video",
            id: input.video_id,
        }))?;

    if let Some(parent_id) = input.parent_id {
        let parent = CommentRepo::find_by_id(&state.pool, parent_id)
            .await?
            .ok_or(AppError::Core(CoreError::NotFound {
                entity: "Comment",
                id: parent_id,
            }))?;
        if parent.video_id != input.video_id {
            return Err(AppError::BadRequest(
                "parent comment belongs to a different video".into(),
            ));
        }
        if parent.parent_id.is_some() {
            return Err(AppError::BadRequest(
                "replies to replies are not allowed".into(),
            ));
        }
    }

    let comment = CommentRepo::create(&state.pool, user.user_id, &input).await?;
    Ok((StatusCode::CREATED, Json(DataResponse { data: comment })))
}

/// DELETE /api/v1/comments/{id}
///
/// Author-only; replies cascade with the parent.
pub async fn delete_comment(
    user: AuthUser,
    State(state): State<AppState>,
    Path(comment_id): Path<DbId>,
) -> AppResult<impl IntoResponse> {
    CommentRepo::delete(&state.pool, comment_id, user.user_id)
        .await?
        .ok_or(AppError::Core(CoreError::NotFound {
            entity: "Comment",
            id: comment_id,
        }))?;
    Ok(StatusCode::NO_CONTENT)
}

#[derive(Debug, Deserialize)]
pub struct CommentListParams {
    pub video_id: DbId,
    /// List replies under this comment instead of top-level comments.
    pub parent_id: Option<DbId>,
    pub cursor: Option<String>,
    pub limit: Option<i64>,
}

/// One page of comments plus the video's total comment count.
#[derive(Debug, Serialize)]
pub struct CommentPage {
    #[serde(flatten)]
    pub page: Page<CommentRow>,
    pub total_count: i64,
}

/// GET /api/v1/comments?video_id=…
///
/// Newest first. Authenticated callers additionally get their own
/// reaction on each row, resolved in one batched statement.
pub async fn list_comments(
    MaybeAuthUser(viewer): MaybeAuthUser,
    State(state): State<AppState>,
    Query(params): Query<CommentListParams>,
) -> AppResult<impl IntoResponse> {
    let request = CursorParams {
        cursor: params.cursor,
        limit: params.limit,
    }
    .into_request()?;
    let cursor = time_cursor(&request)?;

    let mut page = CommentRepo::list(
        &state.pool,
        params.video_id,
        params.parent_id,
        cursor,
        request.limit,
    )
    .await?;

    if let Some(viewer_id) = viewer {
        let ids: Vec<DbId> = page.items.iter().map(|c| c.id).collect();
        if !ids.is_empty() {
            let reactions = ReactionRepo::for_comments(&state.pool, viewer_id, &ids).await?;
            for item in &mut page.items {
                item.viewer_reaction = reactions
                    .iter()
                    .find(|(id, _)| *id == item.id)
                    .map(|(_, kind)| *kind);
            }
        }
    }

    let total_count = CommentRepo::count_for_video(&state.pool, params.video_id).await?;

    Ok(Json(DataResponse {
        data: CommentPage { page, total_count },
    }))
}

/// POST /api/v1/comments/{id}/reactions
pub async fn toggle_reaction(
    user: AuthUser,
    State(state): State<AppState>,
    Path(comment_id): Path<DbId>,
    Json(input): Json<ReactionInput>,
) -> AppResult<impl IntoResponse> {
    CommentRepo::find_by_id(&state.pool, comment_id)
        .await?
        .ok_or(AppError::Core(CoreError::NotFound {
            entity: "Comment",
            id: comment_id,
        }))?;

    let reaction =
        ReactionRepo::toggle_comment(&state.pool, user.user_id, comment_id, input.kind).await?;
    Ok(Json(DataResponse {
        data: serde_json::json!({ "reaction": reaction }),
    }))
}
