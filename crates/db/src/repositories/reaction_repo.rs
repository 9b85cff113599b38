//! Like/dislike toggles for videos and comments.
//!
//! The composite primary key plus `ON CONFLICT … DO UPDATE` is the
//! concurrency story: two racing reaction requests from the same user
//! can never produce two rows.

use reelhouse_core::types::DbId;
use sqlx::PgPool;

use crate::models::reaction::{CommentReaction, ReactionKind, VideoReaction};

pub struct ReactionRepo;

impl ReactionRepo {
    /// Apply a reaction to a video.
    ///
    /// Repeating the current reaction removes it (returns `None`);
    /// anything else upserts the row in place, so exactly one reaction
    /// exists per (user, video) at all times.
    pub async fn toggle_video(
        pool: &PgPool,
        user_id: DbId,
        video_id: DbId,
        kind: ReactionKind,
    ) -> Result<Option<VideoReaction>, sqlx::Error> {
        let removed = sqlx::query(
            "DELETE FROM video_reactions \
             WHERE user_id = $1 AND video_id = $2 AND type = $3",
        )
        .bind(user_id)
        .bind(video_id)
        .bind(kind)
        .execute(pool)
        .await?;

        if removed.rows_affected() > 0 {
            return Ok(None);
        }

        let reaction = sqlx::query_as::<_, VideoReaction>(
            "INSERT INTO video_reactions (user_id, video_id, type) VALUES ($1, $2, $3) \
             ON CONFLICT (user_id, video_id) DO UPDATE \
                 SET type = EXCLUDED.type, updated_at = now() \
             RETURNING user_id, video_id, type, created_at, updated_at",
        )
        .bind(user_id)
        .bind(video_id)
        .bind(kind)
        .fetch_one(pool)
        .await?;

        Ok(Some(reaction))
    }

    /// Same toggle semantics as [`Self::toggle_video`], for comments.
    pub async fn toggle_comment(
        pool: &PgPool,
        user_id: DbId,
        comment_id: DbId,
        kind: ReactionKind,
    ) -> Result<Option<CommentReaction>, sqlx::Error> {
        let removed = sqlx::query(
            "DELETE FROM comment_reactions \
             WHERE user_id = $1 AND comment_id = $2 AND type = $3",
        )
        .bind(user_id)
        .bind(comment_id)
        .bind(kind)
        .execute(pool)
        .await?;

        if removed.rows_affected() > 0 {
            return Ok(None);
        }

        let reaction = sqlx::query_as::<_, CommentReaction>(
            "INSERT INTO comment_reactions (user_id, comment_id, type) VALUES ($1, $2, $3) \
             ON CONFLICT (user_id, comment_id) DO UPDATE \
                 SET type = EXCLUDED.type, updated_at = now() \
             RETURNING user_id, comment_id, type, created_at, updated_at",
        )
        .bind(user_id)
        .bind(comment_id)
        .bind(kind)
        .fetch_one(pool)
        .await?;

        Ok(Some(reaction))
    }

    /// The viewer's reactions across an already-fetched page of
    /// comments, resolved in one statement.
    pub async fn for_comments(
        pool: &PgPool,
        user_id: DbId,
        comment_ids: &[DbId],
    ) -> Result<Vec<(DbId, ReactionKind)>, sqlx::Error> {
        sqlx::query_as::<_, (DbId, ReactionKind)>(
            "SELECT comment_id, type FROM comment_reactions \
             WHERE user_id = $1 AND comment_id = ANY($2)",
        )
        .bind(user_id)
        .bind(comment_ids)
        .fetch_all(pool)
        .await
    }
}
