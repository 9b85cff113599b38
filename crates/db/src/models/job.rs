//! Background job models: the queue row and the durable step log.

use reelhouse_core::types::{DbId, Timestamp};
use serde::Serialize;
use sqlx::FromRow;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, sqlx::Type)]
#[sqlx(type_name = "job_status", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum JobStatus {
    Pending,
    Running,
    Completed,
    Failed,
}

/// A row from the `jobs` table.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct Job {
    pub id: DbId,
    pub job_type: String,
    pub status: JobStatus,
    pub user_id: DbId,
    pub video_id: DbId,
    pub payload: serde_json::Value,
    pub error: Option<String>,
    pub attempts: i32,
    pub claimed_at: Option<Timestamp>,
    pub started_at: Option<Timestamp>,
    pub completed_at: Option<Timestamp>,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

/// A completed step of a job. Presence means the step does not need to
/// run again on retry.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct JobStep {
    pub job_id: DbId,
    pub step: String,
    pub result: Option<serde_json::Value>,
    pub completed_at: Timestamp,
}
