//! Video entity models and the projected row shapes returned by the
//! paginated list queries.

use reelhouse_core::types::{DbId, Timestamp};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

/// Who can see a video. Uploads start `private` and are published by
/// their owner.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "video_visibility", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum Visibility {
    Private,
    Public,
}

/// A full row from the `videos` table.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct Video {
    pub id: DbId,
    pub user_id: DbId,
    pub title: String,
    pub description: Option<String>,
    pub visibility: Visibility,
    pub upload_id: Option<String>,
    pub asset_id: Option<String>,
    pub playback_id: Option<String>,
    pub track_id: Option<String>,
    pub status: Option<String>,
    pub track_status: Option<String>,
    pub thumbnail_url: Option<String>,
    pub thumbnail_key: Option<String>,
    pub preview_url: Option<String>,
    pub preview_key: Option<String>,
    pub duration_ms: i32,
    pub category_id: Option<DbId>,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

/// DTO for `PATCH /videos/{id}`. Only owner-editable fields.
#[derive(Debug, Deserialize)]
pub struct UpdateVideo {
    pub title: Option<String>,
    pub description: Option<String>,
    pub category_id: Option<DbId>,
    pub visibility: Option<Visibility>,
}

/// One row of a video list: the video, its author, and the aggregate
/// counts projected by correlated subqueries in the same statement.
#[derive(Debug, FromRow, Serialize)]
pub struct VideoFeedRow {
    pub id: DbId,
    pub title: String,
    pub description: Option<String>,
    pub visibility: Visibility,
    pub status: Option<String>,
    pub playback_id: Option<String>,
    pub thumbnail_url: Option<String>,
    pub preview_url: Option<String>,
    pub duration_ms: i32,
    pub category_id: Option<DbId>,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
    pub author_id: DbId,
    pub author_name: String,
    pub author_image_url: String,
    pub view_count: i64,
    pub like_count: i64,
    pub dislike_count: i64,
}

/// A feed row plus the viewer's most recent watch time, which is the
/// sort key of the history list.
#[derive(Debug, FromRow, Serialize)]
pub struct HistoryVideoRow {
    #[sqlx(flatten)]
    #[serde(flatten)]
    pub video: VideoFeedRow,
    pub viewed_at: Timestamp,
}

/// A feed row plus when the viewer liked it; sort key of the liked list.
#[derive(Debug, FromRow, Serialize)]
pub struct LikedVideoRow {
    #[sqlx(flatten)]
    #[serde(flatten)]
    pub video: VideoFeedRow,
    pub liked_at: Timestamp,
}

/// The watch page: full video row, author with subscriber count, and
/// the viewer-relative facts (own reaction, subscribed flag).
#[derive(Debug, FromRow, Serialize)]
pub struct VideoDetail {
    #[sqlx(flatten)]
    #[serde(flatten)]
    pub video: Video,
    pub author_name: String,
    pub author_image_url: String,
    pub subscriber_count: i64,
    pub view_count: i64,
    pub like_count: i64,
    pub dislike_count: i64,
    #[sqlx(skip)]
    pub viewer_reaction: Option<super::reaction::ReactionKind>,
    #[sqlx(skip)]
    pub viewer_subscribed: bool,
}

/// Field updates applied by the `video.asset.ready` reconciler path.
#[derive(Debug)]
pub struct AssetReadyUpdate {
    pub status: String,
    pub asset_id: String,
    pub playback_id: String,
    pub thumbnail_url: String,
    pub thumbnail_key: String,
    pub preview_url: String,
    pub preview_key: String,
    pub duration_ms: i32,
}
