use reelhouse_core::types::{DbId, Timestamp};
use serde::Serialize;
use sqlx::FromRow;

/// A row from `video_views`: at most one per (user, video);
/// `updated_at` is the most recent watch time.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct VideoView {
    pub user_id: DbId,
    pub video_id: DbId,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}
