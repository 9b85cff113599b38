//! Handler for video search.

use axum::extract::{Query, State};
use axum::response::IntoResponse;
use axum::Json;
use reelhouse_core::types::DbId;
use reelhouse_db::repositories::VideoRepo;
use serde::Deserialize;

use crate::error::{AppError, AppResult};
use crate::query::{time_cursor, CursorParams};
use crate::response::DataResponse;
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct SearchParams {
    pub query: String,
    pub category_id: Option<DbId>,
    pub cursor: Option<String>,
    pub limit: Option<i64>,
}

/// GET /api/v1/search?query=…
///
/// Title/description substring match over public videos, newest first.
pub async fn search_videos(
    State(state): State<AppState>,
    Query(params): Query<SearchParams>,
) -> AppResult<impl IntoResponse> {
    let text = params.query.trim();
    if text.is_empty() {
        return Err(AppError::BadRequest("query must not be empty".into()));
    }

    let request = CursorParams {
        cursor: params.cursor,
        limit: params.limit,
    }
    .into_request()?;
    let cursor = time_cursor(&request)?;

    let page =
        VideoRepo::search(&state.pool, text, params.category_id, cursor, request.limit).await?;
    Ok(Json(DataResponse { data: page }))
}
