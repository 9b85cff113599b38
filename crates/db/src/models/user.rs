use reelhouse_core::types::{DbId, Timestamp};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

/// A row from the `users` table.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct User {
    pub id: DbId,
    pub external_id: String,
    pub name: String,
    pub image_url: String,
    pub banner_url: Option<String>,
    pub banner_key: Option<String>,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

/// Identity attributes carried by the auth provider's token. Upserted
/// into `users` on first authenticated access.
#[derive(Debug, Clone, Deserialize)]
pub struct Identity {
    pub external_id: String,
    pub name: String,
    pub image_url: String,
}

/// A user's public channel page: profile plus aggregate counts and the
/// viewer-relative subscription flag.
#[derive(Debug, FromRow, Serialize)]
pub struct UserProfile {
    pub id: DbId,
    pub name: String,
    pub image_url: String,
    pub banner_url: Option<String>,
    pub created_at: Timestamp,
    pub subscriber_count: i64,
    pub video_count: i64,
    pub viewer_subscribed: bool,
}
