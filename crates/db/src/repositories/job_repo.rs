//! Queue operations for background jobs.
//!
//! Claiming uses `FOR UPDATE SKIP LOCKED` so concurrent workers never
//! block each other or double-claim. Step results live in `job_steps`
//! and survive a retry, which is what makes retries resumable.

use reelhouse_core::types::DbId;
use sqlx::PgPool;

use crate::models::job::{Job, JobStep};

const COLUMNS: &str = "\
    id, job_type, status, user_id, video_id, payload, error, attempts, \
    claimed_at, started_at, completed_at, created_at, updated_at";

pub struct JobRepo;

impl JobRepo {
    pub async fn enqueue(
        pool: &PgPool,
        job_type: &str,
        user_id: DbId,
        video_id: DbId,
        payload: serde_json::Value,
    ) -> Result<Job, sqlx::Error> {
        let query = format!(
            "INSERT INTO jobs (job_type, user_id, video_id, payload) \
             VALUES ($1, $2, $3, $4) RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, Job>(&query)
            .bind(job_type)
            .bind(user_id)
            .bind(video_id)
            .bind(payload)
            .fetch_one(pool)
            .await
    }

    /// Claim the oldest pending job, if any. The inner SELECT locks the
    /// row with SKIP LOCKED, so a job is handed to at most one worker.
    pub async fn claim_next(pool: &PgPool) -> Result<Option<Job>, sqlx::Error> {
        let query = format!(
            "UPDATE jobs SET status = 'running', attempts = attempts + 1, \
                claimed_at = now(), started_at = COALESCE(started_at, now()), \
                updated_at = now() \
             WHERE id = (\
                SELECT id FROM jobs WHERE status = 'pending' \
                ORDER BY created_at LIMIT 1 \
                FOR UPDATE SKIP LOCKED) \
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, Job>(&query).fetch_optional(pool).await
    }

    pub async fn complete(pool: &PgPool, id: DbId) -> Result<Option<Job>, sqlx::Error> {
        let query = format!(
            "UPDATE jobs SET status = 'completed', error = NULL, \
                completed_at = now(), updated_at = now() \
             WHERE id = $1 RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, Job>(&query)
            .bind(id)
            .fetch_optional(pool)
            .await
    }

    pub async fn fail(
        pool: &PgPool,
        id: DbId,
        error: &str,
    ) -> Result<Option<Job>, sqlx::Error> {
        let query = format!(
            "UPDATE jobs SET status = 'failed', error = $2, \
                completed_at = now(), updated_at = now() \
             WHERE id = $1 RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, Job>(&query)
            .bind(id)
            .bind(error)
            .fetch_optional(pool)
            .await
    }

    /// Put a failed job back in the queue. Owner-scoped, and only valid
    /// from `failed`. The step log is left intact: on the next claim the
    /// worker re-runs only the steps that never completed.
    pub async fn retry(
        pool: &PgPool,
        id: DbId,
        user_id: DbId,
    ) -> Result<Option<Job>, sqlx::Error> {
        let query = format!(
            "UPDATE jobs SET status = 'pending', error = NULL, \
                claimed_at = NULL, completed_at = NULL, updated_at = now() \
             WHERE id = $1 AND user_id = $2 AND status = 'failed' \
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, Job>(&query)
            .bind(id)
            .bind(user_id)
            .fetch_optional(pool)
            .await
    }

    pub async fn find_owned(
        pool: &PgPool,
        id: DbId,
        user_id: DbId,
    ) -> Result<Option<Job>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM jobs WHERE id = $1 AND user_id = $2");
        sqlx::query_as::<_, Job>(&query)
            .bind(id)
            .bind(user_id)
            .fetch_optional(pool)
            .await
    }

    /// Record a step as done. Upsert keeps redelivered step completions
    /// harmless.
    pub async fn record_step(
        pool: &PgPool,
        job_id: DbId,
        step: &str,
        result: Option<serde_json::Value>,
    ) -> Result<JobStep, sqlx::Error> {
        sqlx::query_as::<_, JobStep>(
            "INSERT INTO job_steps (job_id, step, result) VALUES ($1, $2, $3) \
             ON CONFLICT (job_id, step) DO UPDATE \
                SET result = EXCLUDED.result, completed_at = now() \
             RETURNING job_id, step, result, completed_at",
        )
        .bind(job_id)
        .bind(step)
        .bind(result)
        .fetch_one(pool)
        .await
    }

    /// The recorded result of a step, if it already completed in an
    /// earlier attempt.
    pub async fn step_result(
        pool: &PgPool,
        job_id: DbId,
        step: &str,
    ) -> Result<Option<JobStep>, sqlx::Error> {
        sqlx::query_as::<_, JobStep>(
            "SELECT job_id, step, result, completed_at FROM job_steps \
             WHERE job_id = $1 AND step = $2",
        )
        .bind(job_id)
        .bind(step)
        .fetch_optional(pool)
        .await
    }
}
