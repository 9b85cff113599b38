use reelhouse_core::types::{DbId, Timestamp};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

/// Reaction discriminator shared by video and comment reactions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "reaction_type", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum ReactionKind {
    Like,
    Dislike,
}

/// A row from `video_reactions`. At most one per (user, video).
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct VideoReaction {
    pub user_id: DbId,
    pub video_id: DbId,
    #[sqlx(rename = "type")]
    #[serde(rename = "type")]
    pub kind: ReactionKind,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

/// A row from `comment_reactions`. At most one per (user, comment).
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct CommentReaction {
    pub user_id: DbId,
    pub comment_id: DbId,
    #[sqlx(rename = "type")]
    #[serde(rename = "type")]
    pub kind: ReactionKind,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}
