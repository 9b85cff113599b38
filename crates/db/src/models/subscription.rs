use reelhouse_core::types::{DbId, Timestamp};
use serde::Serialize;
use sqlx::FromRow;

/// A row from `subscriptions`: existence means "viewer follows creator".
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct Subscription {
    pub viewer_id: DbId,
    pub creator_id: DbId,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

/// One entry of the viewer's subscription list: the creator plus their
/// subscriber count.
#[derive(Debug, FromRow, Serialize)]
pub struct SubscriptionRow {
    pub creator_id: DbId,
    pub creator_name: String,
    pub creator_image_url: String,
    pub subscriber_count: i64,
    pub subscribed_at: Timestamp,
}
