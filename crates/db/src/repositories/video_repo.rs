//! Repository for the `videos` table: CRUD, the keyset-paginated list
//! queries behind every feed, and the webhook reconciler transitions.
//!
//! All list queries follow the same shape: fetch `limit + 1` rows
//! ordered `(sort_key DESC, id DESC)` with a composite "strictly
//! after" cursor predicate, project aggregate counts with correlated
//! subqueries in the same statement, and clip the probe row off.

use reelhouse_core::pagination::{Cursor, Page};
use reelhouse_core::types::{DbId, Timestamp};
use sqlx::PgPool;

use crate::models::reaction::ReactionKind;
use crate::models::video::{
    AssetReadyUpdate, HistoryVideoRow, LikedVideoRow, UpdateVideo, Video, VideoDetail,
    VideoFeedRow,
};

/// Column list for full `videos` rows.
const COLUMNS: &str = "\
    id, user_id, title, description, visibility, \
    upload_id, asset_id, playback_id, track_id, status, track_status, \
    thumbnail_url, thumbnail_key, preview_url, preview_key, \
    duration_ms, category_id, created_at, updated_at";

/// Unique-viewer view count, correlated per row. Appears in SELECT,
/// WHERE, and ORDER BY of the trending query, so it lives in one place.
const VIEW_COUNT: &str = "(SELECT COUNT(*) FROM video_views vv WHERE vv.video_id = v.id)";

/// Projected columns for one feed row: the video, its author, and the
/// aggregate counts. Aliases `v` (videos) and `u` (users).
const FEED_COLUMNS: &str = "\
    v.id, v.title, v.description, v.visibility, v.status, v.playback_id, \
    v.thumbnail_url, v.preview_url, v.duration_ms, v.category_id, \
    v.created_at, v.updated_at, \
    u.id AS author_id, u.name AS author_name, u.image_url AS author_image_url, \
    (SELECT COUNT(*) FROM video_views vv WHERE vv.video_id = v.id) AS view_count, \
    (SELECT COUNT(*) FROM video_reactions vr \
        WHERE vr.video_id = v.id AND vr.type = 'like') AS like_count, \
    (SELECT COUNT(*) FROM video_reactions vr \
        WHERE vr.video_id = v.id AND vr.type = 'dislike') AS dislike_count";

const FEED_FROM: &str = "FROM videos v JOIN users u ON u.id = v.user_id";

pub struct VideoRepo;

impl VideoRepo {
    // -----------------------------------------------------------------
    // CRUD
    // -----------------------------------------------------------------

    /// Insert the placeholder row for a fresh direct upload: private,
    /// untitled, waiting on the processor.
    pub async fn create(
        pool: &PgPool,
        user_id: DbId,
        title: &str,
        upload_id: &str,
        status: &str,
    ) -> Result<Video, sqlx::Error> {
        let query = format!(
            "INSERT INTO videos (user_id, title, upload_id, status) \
             VALUES ($1, $2, $3, $4) RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, Video>(&query)
            .bind(user_id)
            .bind(title)
            .bind(upload_id)
            .bind(status)
            .fetch_one(pool)
            .await
    }

    pub async fn find_by_id(pool: &PgPool, id: DbId) -> Result<Option<Video>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM videos WHERE id = $1");
        sqlx::query_as::<_, Video>(&query)
            .bind(id)
            .fetch_optional(pool)
            .await
    }

    /// Fetch a video only if `user_id` owns it. The ownership predicate
    /// is in the WHERE clause, so a miss and a foreign row are
    /// indistinguishable to the caller.
    pub async fn find_owned(
        pool: &PgPool,
        id: DbId,
        user_id: DbId,
    ) -> Result<Option<Video>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM videos WHERE id = $1 AND user_id = $2");
        sqlx::query_as::<_, Video>(&query)
            .bind(id)
            .bind(user_id)
            .fetch_optional(pool)
            .await
    }

    pub async fn update(
        pool: &PgPool,
        id: DbId,
        user_id: DbId,
        input: &UpdateVideo,
    ) -> Result<Option<Video>, sqlx::Error> {
        let query = format!(
            "UPDATE videos SET \
                title = COALESCE($3, title), \
                description = COALESCE($4, description), \
                category_id = COALESCE($5, category_id), \
                visibility = COALESCE($6, visibility), \
                updated_at = now() \
             WHERE id = $1 AND user_id = $2 RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, Video>(&query)
            .bind(id)
            .bind(user_id)
            .bind(&input.title)
            .bind(&input.description)
            .bind(input.category_id)
            .bind(input.visibility)
            .fetch_optional(pool)
            .await
    }

    /// Ownership-scoped delete; returns the removed row so the caller
    /// can clean up stored media by key.
    pub async fn delete(
        pool: &PgPool,
        id: DbId,
        user_id: DbId,
    ) -> Result<Option<Video>, sqlx::Error> {
        let query = format!(
            "DELETE FROM videos WHERE id = $1 AND user_id = $2 RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, Video>(&query)
            .bind(id)
            .bind(user_id)
            .fetch_optional(pool)
            .await
    }

    pub async fn set_thumbnail(
        pool: &PgPool,
        id: DbId,
        user_id: DbId,
        url: &str,
        key: &str,
    ) -> Result<Option<Video>, sqlx::Error> {
        let query = format!(
            "UPDATE videos SET thumbnail_url = $3, thumbnail_key = $4, updated_at = now() \
             WHERE id = $1 AND user_id = $2 RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, Video>(&query)
            .bind(id)
            .bind(user_id)
            .bind(url)
            .bind(key)
            .fetch_optional(pool)
            .await
    }

    /// Re-sync processing fields from the processor's view of the
    /// asset (the owner-triggered `revalidate` path).
    pub async fn set_asset_state(
        pool: &PgPool,
        id: DbId,
        user_id: DbId,
        status: &str,
        asset_id: &str,
        playback_id: Option<&str>,
        duration_ms: i32,
    ) -> Result<Option<Video>, sqlx::Error> {
        let query = format!(
            "UPDATE videos SET status = $3, asset_id = $4, playback_id = $5, \
                duration_ms = $6, updated_at = now() \
             WHERE id = $1 AND user_id = $2 RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, Video>(&query)
            .bind(id)
            .bind(user_id)
            .bind(status)
            .bind(asset_id)
            .bind(playback_id)
            .bind(duration_ms)
            .fetch_optional(pool)
            .await
    }

    // -----------------------------------------------------------------
    // Paginated lists
    // -----------------------------------------------------------------

    /// The public feed, optionally filtered by category. Sort key
    /// `(updated_at, id)`.
    pub async fn list_feed(
        pool: &PgPool,
        category_id: Option<DbId>,
        cursor: Option<(Timestamp, DbId)>,
        limit: i64,
    ) -> Result<Page<VideoFeedRow>, sqlx::Error> {
        let mut conditions = vec!["v.visibility = 'public'".to_string()];
        let mut bind_idx: u32 = 1;

        if category_id.is_some() {
            conditions.push(format!("v.category_id = ${bind_idx}"));
            bind_idx += 1;
        }
        push_time_cursor(&mut conditions, &mut bind_idx, "v.updated_at", cursor.is_some());

        let query = format!(
            "SELECT {FEED_COLUMNS} {FEED_FROM} \
             WHERE {} \
             ORDER BY v.updated_at DESC, v.id DESC LIMIT ${bind_idx}",
            conditions.join(" AND "),
        );

        let mut q = sqlx::query_as::<_, VideoFeedRow>(&query);
        if let Some(cid) = category_id {
            q = q.bind(cid);
        }
        if let Some((at, id)) = cursor {
            q = q.bind(at).bind(id);
        }
        let rows = q.bind(limit + 1).fetch_all(pool).await?;

        Ok(clip_by_updated_at(rows, limit))
    }

    /// Public videos ranked by unique-viewer count. The cursor carries
    /// the count materialized at page time; ties break on id as
    /// everywhere else.
    pub async fn list_trending(
        pool: &PgPool,
        cursor: Option<(i64, DbId)>,
        limit: i64,
    ) -> Result<Page<VideoFeedRow>, sqlx::Error> {
        let mut conditions = vec!["v.visibility = 'public'".to_string()];
        let mut bind_idx: u32 = 1;

        if cursor.is_some() {
            conditions.push(format!(
                "({VIEW_COUNT} < ${k} OR ({VIEW_COUNT} = ${k} AND v.id < ${id}))",
                k = bind_idx,
                id = bind_idx + 1,
            ));
            bind_idx += 2;
        }

        let query = format!(
            "SELECT {FEED_COLUMNS} {FEED_FROM} \
             WHERE {} \
             ORDER BY view_count DESC, v.id DESC LIMIT ${bind_idx}",
            conditions.join(" AND "),
        );

        let mut q = sqlx::query_as::<_, VideoFeedRow>(&query);
        if let Some((count, id)) = cursor {
            q = q.bind(count).bind(id);
        }
        let rows = q.bind(limit + 1).fetch_all(pool).await?;

        Ok(Page::clip(rows, limit, |r| {
            Cursor::count(r.view_count, r.id)
        }))
    }

    /// Title/description search over public videos, optionally
    /// category-filtered.
    pub async fn search(
        pool: &PgPool,
        text: &str,
        category_id: Option<DbId>,
        cursor: Option<(Timestamp, DbId)>,
        limit: i64,
    ) -> Result<Page<VideoFeedRow>, sqlx::Error> {
        let mut conditions = vec![
            "v.visibility = 'public'".to_string(),
            "(v.title ILIKE $1 ESCAPE '\\' OR v.description ILIKE $1 ESCAPE '\\')".to_string(),
        ];
        let mut bind_idx: u32 = 2;

        if category_id.is_some() {
            conditions.push(format!("v.category_id = ${bind_idx}"));
            bind_idx += 1;
        }
        push_time_cursor(&mut conditions, &mut bind_idx, "v.updated_at", cursor.is_some());

        let query = format!(
            "SELECT {FEED_COLUMNS} {FEED_FROM} \
             WHERE {} \
             ORDER BY v.updated_at DESC, v.id DESC LIMIT ${bind_idx}",
            conditions.join(" AND "),
        );

        let pattern = format!("%{}%", escape_like(text));
        let mut q = sqlx::query_as::<_, VideoFeedRow>(&query).bind(pattern);
        if let Some(cid) = category_id {
            q = q.bind(cid);
        }
        if let Some((at, id)) = cursor {
            q = q.bind(at).bind(id);
        }
        let rows = q.bind(limit + 1).fetch_all(pool).await?;

        Ok(clip_by_updated_at(rows, limit))
    }

    /// The studio list: everything the owner has, private included.
    pub async fn list_by_owner(
        pool: &PgPool,
        user_id: DbId,
        cursor: Option<(Timestamp, DbId)>,
        limit: i64,
    ) -> Result<Page<VideoFeedRow>, sqlx::Error> {
        Self::list_for_user(pool, user_id, false, cursor, limit).await
    }

    /// A channel page: one user's public videos.
    pub async fn list_by_channel(
        pool: &PgPool,
        user_id: DbId,
        cursor: Option<(Timestamp, DbId)>,
        limit: i64,
    ) -> Result<Page<VideoFeedRow>, sqlx::Error> {
        Self::list_for_user(pool, user_id, true, cursor, limit).await
    }

    async fn list_for_user(
        pool: &PgPool,
        user_id: DbId,
        public_only: bool,
        cursor: Option<(Timestamp, DbId)>,
        limit: i64,
    ) -> Result<Page<VideoFeedRow>, sqlx::Error> {
        let mut conditions = vec!["v.user_id = $1".to_string()];
        if public_only {
            conditions.push("v.visibility = 'public'".to_string());
        }
        let mut bind_idx: u32 = 2;
        push_time_cursor(&mut conditions, &mut bind_idx, "v.updated_at", cursor.is_some());

        let query = format!(
            "SELECT {FEED_COLUMNS} {FEED_FROM} \
             WHERE {} \
             ORDER BY v.updated_at DESC, v.id DESC LIMIT ${bind_idx}",
            conditions.join(" AND "),
        );

        let mut q = sqlx::query_as::<_, VideoFeedRow>(&query).bind(user_id);
        if let Some((at, id)) = cursor {
            q = q.bind(at).bind(id);
        }
        let rows = q.bind(limit + 1).fetch_all(pool).await?;

        Ok(clip_by_updated_at(rows, limit))
    }

    /// The subscriptions feed: public videos from creators the viewer
    /// follows.
    pub async fn list_subscribed(
        pool: &PgPool,
        viewer_id: DbId,
        cursor: Option<(Timestamp, DbId)>,
        limit: i64,
    ) -> Result<Page<VideoFeedRow>, sqlx::Error> {
        let mut conditions = vec!["v.visibility = 'public'".to_string()];
        let mut bind_idx: u32 = 2;
        push_time_cursor(&mut conditions, &mut bind_idx, "v.updated_at", cursor.is_some());

        let query = format!(
            "SELECT {FEED_COLUMNS} {FEED_FROM} \
             JOIN subscriptions s ON s.creator_id = v.user_id AND s.viewer_id = $1 \
             WHERE {} \
             ORDER BY v.updated_at DESC, v.id DESC LIMIT ${bind_idx}",
            conditions.join(" AND "),
        );

        let mut q = sqlx::query_as::<_, VideoFeedRow>(&query).bind(viewer_id);
        if let Some((at, id)) = cursor {
            q = q.bind(at).bind(id);
        }
        let rows = q.bind(limit + 1).fetch_all(pool).await?;

        Ok(clip_by_updated_at(rows, limit))
    }

    /// Watch history, newest watch first. Sort key is the view row's
    /// `updated_at` (most recent watch), not the video's.
    pub async fn list_history(
        pool: &PgPool,
        viewer_id: DbId,
        cursor: Option<(Timestamp, DbId)>,
        limit: i64,
    ) -> Result<Page<HistoryVideoRow>, sqlx::Error> {
        let mut conditions = vec!["v.visibility = 'public'".to_string()];
        let mut bind_idx: u32 = 2;
        push_time_cursor(&mut conditions, &mut bind_idx, "w.updated_at", cursor.is_some());

        let query = format!(
            "SELECT {FEED_COLUMNS}, w.updated_at AS viewed_at {FEED_FROM} \
             JOIN video_views w ON w.video_id = v.id AND w.user_id = $1 \
             WHERE {} \
             ORDER BY w.updated_at DESC, v.id DESC LIMIT ${bind_idx}",
            conditions.join(" AND "),
        );

        let mut q = sqlx::query_as::<_, HistoryVideoRow>(&query).bind(viewer_id);
        if let Some((at, id)) = cursor {
            q = q.bind(at).bind(id);
        }
        let rows = q.bind(limit + 1).fetch_all(pool).await?;

        Ok(Page::clip(rows, limit, |r| {
            Cursor::time(r.viewed_at, r.video.id)
        }))
    }

    /// Videos the viewer liked, most recent like first.
    pub async fn list_liked(
        pool: &PgPool,
        viewer_id: DbId,
        cursor: Option<(Timestamp, DbId)>,
        limit: i64,
    ) -> Result<Page<LikedVideoRow>, sqlx::Error> {
        let mut conditions = vec!["v.visibility = 'public'".to_string()];
        let mut bind_idx: u32 = 2;
        push_time_cursor(&mut conditions, &mut bind_idx, "r.updated_at", cursor.is_some());

        let query = format!(
            "SELECT {FEED_COLUMNS}, r.updated_at AS liked_at {FEED_FROM} \
             JOIN video_reactions r \
                ON r.video_id = v.id AND r.user_id = $1 AND r.type = 'like' \
             WHERE {} \
             ORDER BY r.updated_at DESC, v.id DESC LIMIT ${bind_idx}",
            conditions.join(" AND "),
        );

        let mut q = sqlx::query_as::<_, LikedVideoRow>(&query).bind(viewer_id);
        if let Some((at, id)) = cursor {
            q = q.bind(at).bind(id);
        }
        let rows = q.bind(limit + 1).fetch_all(pool).await?;

        Ok(Page::clip(rows, limit, |r| {
            Cursor::time(r.liked_at, r.video.id)
        }))
    }

    // -----------------------------------------------------------------
    // Detail
    // -----------------------------------------------------------------

    /// The watch page. Aggregates ride along in the row statement;
    /// viewer-relative facts come from one extra statement keyed by
    /// the resolved internal viewer id, skipped for anonymous viewers.
    pub async fn get_detail(
        pool: &PgPool,
        id: DbId,
        viewer: Option<DbId>,
    ) -> Result<Option<VideoDetail>, sqlx::Error> {
        let query = format!(
            "SELECT v.*, u.name AS author_name, u.image_url AS author_image_url, \
                (SELECT COUNT(*) FROM subscriptions s \
                    WHERE s.creator_id = v.user_id) AS subscriber_count, \
                {VIEW_COUNT} AS view_count, \
                (SELECT COUNT(*) FROM video_reactions vr \
                    WHERE vr.video_id = v.id AND vr.type = 'like') AS like_count, \
                (SELECT COUNT(*) FROM video_reactions vr \
                    WHERE vr.video_id = v.id AND vr.type = 'dislike') AS dislike_count \
             {FEED_FROM} WHERE v.id = $1"
        );
        let Some(mut detail) = sqlx::query_as::<_, VideoDetail>(&query)
            .bind(id)
            .fetch_optional(pool)
            .await?
        else {
            return Ok(None);
        };

        if let Some(viewer_id) = viewer {
            let (reaction, subscribed) = sqlx::query_as::<_, (Option<ReactionKind>, bool)>(
                "SELECT \
                    (SELECT type FROM video_reactions \
                        WHERE video_id = $1 AND user_id = $2), \
                    EXISTS(SELECT 1 FROM subscriptions \
                        WHERE creator_id = $3 AND viewer_id = $2)",
            )
            .bind(id)
            .bind(viewer_id)
            .bind(detail.video.user_id)
            .fetch_one(pool)
            .await?;

            detail.viewer_reaction = reaction;
            detail.viewer_subscribed = subscribed;
        }

        Ok(Some(detail))
    }

    // -----------------------------------------------------------------
    // Webhook reconciliation
    // -----------------------------------------------------------------
    //
    // Every transition is a deterministic SET (or idempotent delete)
    // matched by a unique external id, so redelivery converges on the
    // same row state. The returned count is 0 when no row matched.

    pub async fn apply_asset_created(
        pool: &PgPool,
        upload_id: &str,
        asset_id: &str,
        status: &str,
    ) -> Result<u64, sqlx::Error> {
        let result = sqlx::query(
            "UPDATE videos SET asset_id = $2, status = $3, updated_at = now() \
             WHERE upload_id = $1",
        )
        .bind(upload_id)
        .bind(asset_id)
        .bind(status)
        .execute(pool)
        .await?;
        Ok(result.rows_affected())
    }

    pub async fn apply_asset_ready(
        pool: &PgPool,
        upload_id: &str,
        update: &AssetReadyUpdate,
    ) -> Result<u64, sqlx::Error> {
        let result = sqlx::query(
            "UPDATE videos SET status = $2, asset_id = $3, playback_id = $4, \
                thumbnail_url = $5, thumbnail_key = $6, \
                preview_url = $7, preview_key = $8, \
                duration_ms = $9, updated_at = now() \
             WHERE upload_id = $1",
        )
        .bind(upload_id)
        .bind(&update.status)
        .bind(&update.asset_id)
        .bind(&update.playback_id)
        .bind(&update.thumbnail_url)
        .bind(&update.thumbnail_key)
        .bind(&update.preview_url)
        .bind(&update.preview_key)
        .bind(update.duration_ms)
        .execute(pool)
        .await?;
        Ok(result.rows_affected())
    }

    pub async fn apply_asset_errored(
        pool: &PgPool,
        upload_id: &str,
        status: &str,
    ) -> Result<u64, sqlx::Error> {
        let result = sqlx::query(
            "UPDATE videos SET status = $2, updated_at = now() WHERE upload_id = $1",
        )
        .bind(upload_id)
        .bind(status)
        .execute(pool)
        .await?;
        Ok(result.rows_affected())
    }

    /// The processor deleted the asset: drop the row. A missing row is
    /// a no-op, not an error.
    pub async fn delete_by_upload_id(
        pool: &PgPool,
        upload_id: &str,
    ) -> Result<u64, sqlx::Error> {
        let result = sqlx::query("DELETE FROM videos WHERE upload_id = $1")
            .bind(upload_id)
            .execute(pool)
            .await?;
        Ok(result.rows_affected())
    }

    /// Caption track ready; correlated by asset id rather than upload id.
    pub async fn apply_track_ready(
        pool: &PgPool,
        asset_id: &str,
        track_id: &str,
        track_status: &str,
    ) -> Result<u64, sqlx::Error> {
        let result = sqlx::query(
            "UPDATE videos SET track_id = $2, track_status = $3, updated_at = now() \
             WHERE asset_id = $1",
        )
        .bind(asset_id)
        .bind(track_id)
        .bind(track_status)
        .execute(pool)
        .await?;
        Ok(result.rows_affected())
    }

    /// Single-field writes used by the metadata job's persist step.
    pub async fn set_generated_title(
        pool: &PgPool,
        id: DbId,
        user_id: DbId,
        title: &str,
    ) -> Result<u64, sqlx::Error> {
        let result = sqlx::query(
            "UPDATE videos SET title = $3, updated_at = now() \
             WHERE id = $1 AND user_id = $2",
        )
        .bind(id)
        .bind(user_id)
        .bind(title)
        .execute(pool)
        .await?;
        Ok(result.rows_affected())
    }

    pub async fn set_generated_description(
        pool: &PgPool,
        id: DbId,
        user_id: DbId,
        description: &str,
    ) -> Result<u64, sqlx::Error> {
        let result = sqlx::query(
            "UPDATE videos SET description = $3, updated_at = now() \
             WHERE id = $1 AND user_id = $2",
        )
        .bind(id)
        .bind(user_id)
        .bind(description)
        .execute(pool)
        .await?;
        Ok(result.rows_affected())
    }
}

/// Append the composite keyset predicate for a time-sorted list:
/// strictly after the cursor in `(sort DESC, id DESC)` order.
fn push_time_cursor(
    conditions: &mut Vec<String>,
    bind_idx: &mut u32,
    sort_column: &str,
    has_cursor: bool,
) {
    if has_cursor {
        conditions.push(format!(
            "({col} < ${k} OR ({col} = ${k} AND v.id < ${id}))",
            col = sort_column,
            k = *bind_idx,
            id = *bind_idx + 1,
        ));
        *bind_idx += 2;
    }
}

fn clip_by_updated_at(rows: Vec<VideoFeedRow>, limit: i64) -> Page<VideoFeedRow> {
    Page::clip(rows, limit, |r| Cursor::time(r.updated_at, r.id))
}

/// Neutralize LIKE metacharacters so search text matches literally.
fn escape_like(text: &str) -> String {
    text.replace('\\', "\\\\")
        .replace('%', "\\%")
        .replace('_', "\\_")
}

#[cfg(test)]
mod tests {
    use super::escape_like;

    #[test]
    fn escape_like_neutralizes_metacharacters() {
        assert_eq!(escape_like("100%"), "100\\%");
        assert_eq!(escape_like("snake_case"), "snake\\_case");
        assert_eq!(escape_like("a\\b"), "a\\\\b");
        assert_eq!(escape_like("plain"), "plain");
    }
}
