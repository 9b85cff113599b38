use reelhouse_core::pagination::{Cursor, Page};
use reelhouse_core::types::{DbId, Timestamp};
use sqlx::PgPool;

use crate::models::playlist::{
    CreatePlaylist, Playlist, PlaylistForVideoRow, PlaylistRow, PlaylistVideo,
};
use crate::models::video::VideoFeedRow;

const COLUMNS: &str = "id, user_id, name, description, created_at, updated_at";

/// One playlist row with its derived fields: size and the thumbnail of
/// the most recently added member.
const ROW_SELECT: &str = "\
    p.id, p.user_id, p.name, p.description, p.created_at, p.updated_at, \
    (SELECT COUNT(*) FROM playlist_videos pv WHERE pv.playlist_id = p.id) AS video_count, \
    (SELECT v.thumbnail_url FROM playlist_videos pv \
        JOIN videos v ON v.id = pv.video_id \
        WHERE pv.playlist_id = p.id \
        ORDER BY pv.created_at DESC, pv.video_id DESC LIMIT 1) AS thumbnail_url";

pub struct PlaylistRepo;

impl PlaylistRepo {
    pub async fn create(
        pool: &PgPool,
        user_id: DbId,
        input: &CreatePlaylist,
    ) -> Result<Playlist, sqlx::Error> {
        let query = format!(
            "INSERT INTO playlists (user_id, name, description) \
             VALUES ($1, $2, $3) RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, Playlist>(&query)
            .bind(user_id)
            .bind(&input.name)
            .bind(&input.description)
            .fetch_one(pool)
            .await
    }

    pub async fn find_owned(
        pool: &PgPool,
        id: DbId,
        user_id: DbId,
    ) -> Result<Option<Playlist>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM playlists WHERE id = $1 AND user_id = $2");
        sqlx::query_as::<_, Playlist>(&query)
            .bind(id)
            .bind(user_id)
            .fetch_optional(pool)
            .await
    }

    pub async fn delete(
        pool: &PgPool,
        id: DbId,
        user_id: DbId,
    ) -> Result<Option<Playlist>, sqlx::Error> {
        let query = format!(
            "DELETE FROM playlists WHERE id = $1 AND user_id = $2 RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, Playlist>(&query)
            .bind(id)
            .bind(user_id)
            .fetch_optional(pool)
            .await
    }

    /// The owner's playlists, most recently touched first.
    pub async fn list(
        pool: &PgPool,
        user_id: DbId,
        cursor: Option<(Timestamp, DbId)>,
        limit: i64,
    ) -> Result<Page<PlaylistRow>, sqlx::Error> {
        let mut conditions = vec!["p.user_id = $1".to_string()];
        let mut bind_idx: u32 = 2;

        if cursor.is_some() {
            conditions.push(format!(
                "(p.updated_at < ${k} OR (p.updated_at = ${k} AND p.id < ${id}))",
                k = bind_idx,
                id = bind_idx + 1,
            ));
            bind_idx += 2;
        }

        let query = format!(
            "SELECT {ROW_SELECT} FROM playlists p \
             WHERE {} \
             ORDER BY p.updated_at DESC, p.id DESC LIMIT ${bind_idx}",
            conditions.join(" AND "),
        );

        let mut q = sqlx::query_as::<_, PlaylistRow>(&query).bind(user_id);
        if let Some((at, id)) = cursor {
            q = q.bind(at).bind(id);
        }
        let rows = q.bind(limit + 1).fetch_all(pool).await?;

        Ok(Page::clip(rows, limit, |r| Cursor::time(r.updated_at, r.id)))
    }

    /// One playlist with derived fields, owner-scoped.
    pub async fn get_row(
        pool: &PgPool,
        id: DbId,
        user_id: DbId,
    ) -> Result<Option<PlaylistRow>, sqlx::Error> {
        let query = format!(
            "SELECT {ROW_SELECT} FROM playlists p WHERE p.id = $1 AND p.user_id = $2"
        );
        sqlx::query_as::<_, PlaylistRow>(&query)
            .bind(id)
            .bind(user_id)
            .fetch_optional(pool)
            .await
    }

    /// Append a video; the unique membership key rejects duplicates.
    pub async fn add_video(
        pool: &PgPool,
        playlist_id: DbId,
        video_id: DbId,
    ) -> Result<PlaylistVideo, sqlx::Error> {
        sqlx::query_as::<_, PlaylistVideo>(
            "INSERT INTO playlist_videos (playlist_id, video_id, position) \
             VALUES ($1, $2, \
                (SELECT COALESCE(MAX(position), 0) + 1 FROM playlist_videos \
                    WHERE playlist_id = $1)) \
             RETURNING playlist_id, video_id, position, created_at, updated_at",
        )
        .bind(playlist_id)
        .bind(video_id)
        .fetch_one(pool)
        .await
    }

    /// Returns `false` when the video was not in the playlist.
    pub async fn remove_video(
        pool: &PgPool,
        playlist_id: DbId,
        video_id: DbId,
    ) -> Result<bool, sqlx::Error> {
        let result = sqlx::query(
            "DELETE FROM playlist_videos WHERE playlist_id = $1 AND video_id = $2",
        )
        .bind(playlist_id)
        .bind(video_id)
        .execute(pool)
        .await?;
        Ok(result.rows_affected() > 0)
    }

    /// The videos inside a playlist, most recently added first, keyed
    /// on `(added_at, video_id)`.
    pub async fn list_videos(
        pool: &PgPool,
        playlist_id: DbId,
        cursor: Option<(Timestamp, DbId)>,
        limit: i64,
    ) -> Result<Page<VideoFeedRow>, sqlx::Error> {
        let mut conditions = vec!["pv.playlist_id = $1".to_string()];
        let mut bind_idx: u32 = 2;

        if cursor.is_some() {
            conditions.push(format!(
                "(pv.created_at < ${k} OR (pv.created_at = ${k} AND v.id < ${id}))",
                k = bind_idx,
                id = bind_idx + 1,
            ));
            bind_idx += 2;
        }

        let query = format!(
            "SELECT v.id, v.title, v.description, v.visibility, v.status, v.playback_id, \
                v.thumbnail_url, v.preview_url, v.duration_ms, v.category_id, \
                v.created_at, pv.created_at AS updated_at, \
                u.id AS author_id, u.name AS author_name, u.image_url AS author_image_url, \
                (SELECT COUNT(*) FROM video_views vv WHERE vv.video_id = v.id) AS view_count, \
                (SELECT COUNT(*) FROM video_reactions vr \
                    WHERE vr.video_id = v.id AND vr.type = 'like') AS like_count, \
                (SELECT COUNT(*) FROM video_reactions vr \
                    WHERE vr.video_id = v.id AND vr.type = 'dislike') AS dislike_count \
             FROM playlist_videos pv \
             JOIN videos v ON v.id = pv.video_id \
             JOIN users u ON u.id = v.user_id \
             WHERE {} \
             ORDER BY pv.created_at DESC, v.id DESC LIMIT ${bind_idx}",
            conditions.join(" AND "),
        );

        let mut q = sqlx::query_as::<_, VideoFeedRow>(&query).bind(playlist_id);
        if let Some((at, id)) = cursor {
            q = q.bind(at).bind(id);
        }
        let rows = q.bind(limit + 1).fetch_all(pool).await?;

        Ok(Page::clip(rows, limit, |r| Cursor::time(r.updated_at, r.id)))
    }

    /// The owner's playlists annotated with whether each already
    /// contains `video_id` (the save-to-playlist picker).
    pub async fn for_video(
        pool: &PgPool,
        user_id: DbId,
        video_id: DbId,
        cursor: Option<(Timestamp, DbId)>,
        limit: i64,
    ) -> Result<Page<PlaylistForVideoRow>, sqlx::Error> {
        let mut conditions = vec!["p.user_id = $1".to_string()];
        let mut bind_idx: u32 = 3;

        if cursor.is_some() {
            conditions.push(format!(
                "(p.updated_at < ${k} OR (p.updated_at = ${k} AND p.id < ${id}))",
                k = bind_idx,
                id = bind_idx + 1,
            ));
            bind_idx += 2;
        }

        let query = format!(
            "SELECT p.id, p.name, p.updated_at, \
                EXISTS(SELECT 1 FROM playlist_videos pv \
                    WHERE pv.playlist_id = p.id AND pv.video_id = $2) AS contains_video \
             FROM playlists p \
             WHERE {} \
             ORDER BY p.updated_at DESC, p.id DESC LIMIT ${bind_idx}",
            conditions.join(" AND "),
        );

        let mut q = sqlx::query_as::<_, PlaylistForVideoRow>(&query)
            .bind(user_id)
            .bind(video_id);
        if let Some((at, id)) = cursor {
            q = q.bind(at).bind(id);
        }
        let rows = q.bind(limit + 1).fetch_all(pool).await?;

        Ok(Page::clip(rows, limit, |r| Cursor::time(r.updated_at, r.id)))
    }
}
