use reelhouse_core::types::{DbId, Timestamp};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

/// A row from the `playlists` table.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct Playlist {
    pub id: DbId,
    pub user_id: DbId,
    pub name: String,
    pub description: Option<String>,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

/// DTO for `POST /playlists`.
#[derive(Debug, Deserialize)]
pub struct CreatePlaylist {
    pub name: String,
    pub description: Option<String>,
}

/// A membership row from `playlist_videos`.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct PlaylistVideo {
    pub playlist_id: DbId,
    pub video_id: DbId,
    pub position: Option<i32>,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

/// One row of the playlist list: membership count plus the thumbnail
/// of the most recently added video, both projected in-statement.
#[derive(Debug, FromRow, Serialize)]
pub struct PlaylistRow {
    pub id: DbId,
    pub user_id: DbId,
    pub name: String,
    pub description: Option<String>,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
    pub video_count: i64,
    pub thumbnail_url: Option<String>,
}

/// A playlist paired with whether a given video is already in it.
/// Drives the "save to playlist" menu.
#[derive(Debug, FromRow, Serialize)]
pub struct PlaylistForVideoRow {
    pub id: DbId,
    pub name: String,
    pub updated_at: Timestamp,
    pub contains_video: bool,
}
