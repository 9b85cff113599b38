//! Handlers for background job inspection and retry.

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::Json;
use reelhouse_core::error::CoreError;
use reelhouse_core::types::DbId;
use reelhouse_db::repositories::JobRepo;

use crate::auth::extractor::AuthUser;
use crate::error::{AppError, AppResult};
use crate::response::DataResponse;
use crate::state::AppState;

/// GET /api/v1/jobs/{id}
///
/// Owner only; someone else's job is a 404.
pub async fn get_job(
    user: AuthUser,
    State(state): State<AppState>,
    Path(job_id): Path<DbId>,
) -> AppResult<impl IntoResponse> {
    let job = JobRepo::find_owned(&state.pool, job_id, user.user_id)
        .await?
        .ok_or(AppError::Core(CoreError::NotFound {
            entity: "Job",
            id: job_id,
        }))?;
    Ok(Json(DataResponse { data: job }))
}

/// POST /api/v1/jobs/{id}/retry
///
/// Reset a failed job to pending. The step log is kept, so the worker
/// resumes past steps that already completed.
pub async fn retry_job(
    user: AuthUser,
    State(state): State<AppState>,
    Path(job_id): Path<DbId>,
) -> AppResult<impl IntoResponse> {
    let retried = match JobRepo::retry(&state.pool, job_id, user.user_id).await? {
        Some(job) => job,
        None => {
            // Distinguish a missing/unowned job from one in the wrong state.
            return match JobRepo::find_owned(&state.pool, job_id, user.user_id).await? {
                Some(_) => Err(AppError::Core(CoreError::Conflict(
                    "only failed jobs can be retried".into(),
                ))),
                None => Err(AppError::Core(CoreError::NotFound {
                    entity: "Job",
                    id: job_id,
                })),
            };
        }
    };

    tracing::info!(job_id = %job_id, "Job queued for retry");

    Ok((StatusCode::ACCEPTED, Json(DataResponse { data: retried })))
}
