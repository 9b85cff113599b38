//! Handlers for creator subscriptions.

use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::Json;
use reelhouse_core::error::CoreError;
use reelhouse_core::types::DbId;
use reelhouse_db::repositories::{SubscriptionRepo, UserRepo};

use crate::auth::extractor::AuthUser;
use crate::error::{AppError, AppResult};
use crate::query::{time_cursor, CursorParams};
use crate::response::DataResponse;
use crate::state::AppState;

/// PUT /api/v1/subscriptions/{creator_id}
///
/// Idempotent; subscribing to yourself is rejected.
pub async fn subscribe(
    user: AuthUser,
    State(state): State<AppState>,
    Path(creator_id): Path<DbId>,
) -> AppResult<impl IntoResponse> {
    if creator_id == user.user_id {
        return Err(AppError::BadRequest("cannot subscribe to yourself".into()));
    }
    UserRepo::find_by_id(&state.pool, creator_id)
        .await?
        .ok_or(AppError::Core(CoreError::NotFound {
            entity: "User",
            id: creator_id,
        }))?;

    let subscription = SubscriptionRepo::subscribe(&state.pool, user.user_id, creator_id).await?;
    Ok((StatusCode::CREATED, Json(DataResponse { data: subscription })))
}

/// DELETE /api/v1/subscriptions/{creator_id}
pub async fn unsubscribe(
    user: AuthUser,
    State(state): State<AppState>,
    Path(creator_id): Path<DbId>,
) -> AppResult<impl IntoResponse> {
    let removed = SubscriptionRepo::unsubscribe(&state.pool, user.user_id, creator_id).await?;
    if !removed {
        return Err(AppError::Core(CoreError::NotFound {
            entity: "Subscription",
            id: creator_id,
        }));
    }
    Ok(StatusCode::NO_CONTENT)
}

/// GET /api/v1/subscriptions
///
/// The caller's subscriptions, newest first.
pub async fn list_subscriptions(
    user: AuthUser,
    State(state): State<AppState>,
    Query(params): Query<CursorParams>,
) -> AppResult<impl IntoResponse> {
    let request = params.into_request()?;
    let cursor = time_cursor(&request)?;

    let page = SubscriptionRepo::list(&state.pool, user.user_id, cursor, request.limit).await?;
    Ok(Json(DataResponse { data: page }))
}
