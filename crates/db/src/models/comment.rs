use reelhouse_core::types::{DbId, Timestamp};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

use super::reaction::ReactionKind;

/// A row from the `comments` table. `parent_id` is set on replies;
/// nesting is single-level (a parent is always a top-level comment).
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct Comment {
    pub id: DbId,
    pub video_id: DbId,
    pub user_id: DbId,
    pub parent_id: Option<DbId>,
    pub value: String,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

/// DTO for `POST /comments`.
#[derive(Debug, Deserialize)]
pub struct CreateComment {
    pub video_id: DbId,
    pub parent_id: Option<DbId>,
    pub value: String,
}

/// One row of a comment list: the comment, its author, reaction
/// counts, reply count, and the viewer's own reaction (filled in by a
/// second batched lookup, never per-row).
#[derive(Debug, FromRow, Serialize)]
pub struct CommentRow {
    pub id: DbId,
    pub video_id: DbId,
    pub user_id: DbId,
    pub parent_id: Option<DbId>,
    pub value: String,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
    pub author_name: String,
    pub author_image_url: String,
    pub like_count: i64,
    pub dislike_count: i64,
    pub reply_count: i64,
    #[sqlx(skip)]
    pub viewer_reaction: Option<ReactionKind>,
}
