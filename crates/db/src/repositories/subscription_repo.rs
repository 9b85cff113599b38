use reelhouse_core::pagination::{Cursor, Page};
use reelhouse_core::types::{DbId, Timestamp};
use sqlx::PgPool;

use crate::models::subscription::{Subscription, SubscriptionRow};

pub struct SubscriptionRepo;

impl SubscriptionRepo {
    /// Subscribe `viewer` to `creator`. Idempotent: resubscribing
    /// refreshes the row instead of failing on the composite key.
    pub async fn subscribe(
        pool: &PgPool,
        viewer_id: DbId,
        creator_id: DbId,
    ) -> Result<Subscription, sqlx::Error> {
        sqlx::query_as::<_, Subscription>(
            "INSERT INTO subscriptions (viewer_id, creator_id) VALUES ($1, $2) \
             ON CONFLICT (viewer_id, creator_id) DO UPDATE SET updated_at = now() \
             RETURNING viewer_id, creator_id, created_at, updated_at",
        )
        .bind(viewer_id)
        .bind(creator_id)
        .fetch_one(pool)
        .await
    }

    /// Returns `false` when no subscription existed.
    pub async fn unsubscribe(
        pool: &PgPool,
        viewer_id: DbId,
        creator_id: DbId,
    ) -> Result<bool, sqlx::Error> {
        let result = sqlx::query(
            "DELETE FROM subscriptions WHERE viewer_id = $1 AND creator_id = $2",
        )
        .bind(viewer_id)
        .bind(creator_id)
        .execute(pool)
        .await?;
        Ok(result.rows_affected() > 0)
    }

    /// The viewer's subscription list, newest first, keyed on
    /// `(subscribed_at, creator_id)`.
    pub async fn list(
        pool: &PgPool,
        viewer_id: DbId,
        cursor: Option<(Timestamp, DbId)>,
        limit: i64,
    ) -> Result<Page<SubscriptionRow>, sqlx::Error> {
        let mut conditions = vec!["s.viewer_id = $1".to_string()];
        let mut bind_idx: u32 = 2;

        if cursor.is_some() {
            conditions.push(format!(
                "(s.created_at < ${k} OR (s.created_at = ${k} AND s.creator_id < ${id}))",
                k = bind_idx,
                id = bind_idx + 1,
            ));
            bind_idx += 2;
        }

        let query = format!(
            "SELECT s.creator_id, u.name AS creator_name, u.image_url AS creator_image_url, \
                (SELECT COUNT(*) FROM subscriptions x \
                    WHERE x.creator_id = s.creator_id) AS subscriber_count, \
                s.created_at AS subscribed_at \
             FROM subscriptions s \
             JOIN users u ON u.id = s.creator_id \
             WHERE {} \
             ORDER BY s.created_at DESC, s.creator_id DESC \
             LIMIT ${bind_idx}",
            conditions.join(" AND "),
        );

        let mut q = sqlx::query_as::<_, SubscriptionRow>(&query).bind(viewer_id);
        if let Some((at, id)) = cursor {
            q = q.bind(at).bind(id);
        }
        let rows = q.bind(limit + 1).fetch_all(pool).await?;

        Ok(Page::clip(rows, limit, |r| {
            Cursor::time(r.subscribed_at, r.creator_id)
        }))
    }
}
