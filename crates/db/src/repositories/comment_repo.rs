use reelhouse_core::pagination::{Cursor, Page};
use reelhouse_core::types::{DbId, Timestamp};
use sqlx::PgPool;

use crate::models::comment::{Comment, CommentRow, CreateComment};

const COLUMNS: &str = "id, user_id, video_id, parent_id, value, created_at, updated_at";

pub struct CommentRepo;

impl CommentRepo {
    pub async fn create(
        pool: &PgPool,
        user_id: DbId,
        input: &CreateComment,
    ) -> Result<Comment, sqlx::Error> {
        let query = format!(
            "INSERT INTO comments (user_id, video_id, parent_id, value) \
             VALUES ($1, $2, $3, $4) RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, Comment>(&query)
            .bind(user_id)
            .bind(input.video_id)
            .bind(input.parent_id)
            .bind(&input.value)
            .fetch_one(pool)
            .await
    }

    pub async fn find_by_id(pool: &PgPool, id: DbId) -> Result<Option<Comment>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM comments WHERE id = $1");
        sqlx::query_as::<_, Comment>(&query)
            .bind(id)
            .fetch_optional(pool)
            .await
    }

    /// Author-scoped delete. Replies go with the parent via the
    /// self-referencing cascade.
    pub async fn delete(
        pool: &PgPool,
        id: DbId,
        user_id: DbId,
    ) -> Result<Option<Comment>, sqlx::Error> {
        let query = format!(
            "DELETE FROM comments WHERE id = $1 AND user_id = $2 RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, Comment>(&query)
            .bind(id)
            .bind(user_id)
            .fetch_optional(pool)
            .await
    }

    /// Total comment count for a video, replies included. Reported
    /// alongside the first page so clients can render "N comments"
    /// without walking every page.
    pub async fn count_for_video(pool: &PgPool, video_id: DbId) -> Result<i64, sqlx::Error> {
        sqlx::query_scalar("SELECT COUNT(*) FROM comments WHERE video_id = $1")
            .bind(video_id)
            .fetch_one(pool)
            .await
    }

    /// One page of comments on a video, newest first.
    ///
    /// `parent_id = None` lists top-level comments (each carrying its
    /// reply count); `Some(id)` lists the replies under one comment.
    pub async fn list(
        pool: &PgPool,
        video_id: DbId,
        parent_id: Option<DbId>,
        cursor: Option<(Timestamp, DbId)>,
        limit: i64,
    ) -> Result<Page<CommentRow>, sqlx::Error> {
        let mut conditions = vec!["c.video_id = $1".to_string()];
        let mut bind_idx: u32 = 2;

        if parent_id.is_some() {
            conditions.push(format!("c.parent_id = ${bind_idx}"));
            bind_idx += 1;
        } else {
            conditions.push("c.parent_id IS NULL".to_string());
        }

        if cursor.is_some() {
            conditions.push(format!(
                "(c.updated_at < ${k} OR (c.updated_at = ${k} AND c.id < ${id}))",
                k = bind_idx,
                id = bind_idx + 1,
            ));
            bind_idx += 2;
        }

        let query = format!(
            "SELECT c.id, c.user_id, c.video_id, c.parent_id, c.value, \
                c.created_at, c.updated_at, \
                u.name AS author_name, u.image_url AS author_image_url, \
                (SELECT COUNT(*) FROM comment_reactions cr \
                    WHERE cr.comment_id = c.id AND cr.type = 'like') AS like_count, \
                (SELECT COUNT(*) FROM comment_reactions cr \
                    WHERE cr.comment_id = c.id AND cr.type = 'dislike') AS dislike_count, \
                (SELECT COUNT(*) FROM comments r \
                    WHERE r.parent_id = c.id) AS reply_count \
             FROM comments c \
             JOIN users u ON u.id = c.user_id \
             WHERE {} \
             ORDER BY c.updated_at DESC, c.id DESC LIMIT ${bind_idx}",
            conditions.join(" AND "),
        );

        let mut q = sqlx::query_as::<_, CommentRow>(&query).bind(video_id);
        if let Some(pid) = parent_id {
            q = q.bind(pid);
        }
        if let Some((at, id)) = cursor {
            q = q.bind(at).bind(id);
        }
        let rows = q.bind(limit + 1).fetch_all(pool).await?;

        Ok(Page::clip(rows, limit, |r| Cursor::time(r.updated_at, r.id)))
    }
}
