use reelhouse_core::types::DbId;
use sqlx::PgPool;

use crate::models::view::VideoView;

pub struct ViewRepo;

impl ViewRepo {
    /// Record that a user watched a video.
    ///
    /// One row per (user, video): a repeat watch bumps `updated_at`
    /// (the history sort key) instead of inserting a second row, so
    /// view counts stay unique-viewer counts.
    pub async fn record(
        pool: &PgPool,
        user_id: DbId,
        video_id: DbId,
    ) -> Result<VideoView, sqlx::Error> {
        sqlx::query_as::<_, VideoView>(
            "INSERT INTO video_views (user_id, video_id) VALUES ($1, $2) \
             ON CONFLICT (user_id, video_id) DO UPDATE SET updated_at = now() \
             RETURNING user_id, video_id, created_at, updated_at",
        )
        .bind(user_id)
        .bind(video_id)
        .fetch_one(pool)
        .await
    }
}
