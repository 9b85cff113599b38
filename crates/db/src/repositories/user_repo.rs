//! Repository for the `users` table.

use reelhouse_core::types::DbId;
use sqlx::PgPool;

use crate::models::user::{Identity, User, UserProfile};

const COLUMNS: &str =
    "id, external_id, name, image_url, banner_url, banner_key, created_at, updated_at";

/// Users are owned by the external auth provider; rows here are a
/// local projection created on first authenticated access.
pub struct UserRepo;

impl UserRepo {
    /// Insert-or-refresh a user from the auth provider's identity.
    ///
    /// Upserts on `external_id` so repeated logins keep the local name
    /// and avatar in sync without a separate sync path.
    pub async fn ensure(pool: &PgPool, identity: &Identity) -> Result<User, sqlx::Error> {
        let query = format!(
            "INSERT INTO users (external_id, name, image_url) \
             VALUES ($1, $2, $3) \
             ON CONFLICT (external_id) DO UPDATE \
                 SET name = EXCLUDED.name, image_url = EXCLUDED.image_url, updated_at = now() \
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, User>(&query)
            .bind(&identity.external_id)
            .bind(&identity.name)
            .bind(&identity.image_url)
            .fetch_one(pool)
            .await
    }

    /// Resolve the internal id for an external auth identity, if the
    /// user has ever authenticated. Anonymous viewers resolve to None.
    pub async fn resolve_id(
        pool: &PgPool,
        external_id: &str,
    ) -> Result<Option<DbId>, sqlx::Error> {
        sqlx::query_scalar("SELECT id FROM users WHERE external_id = $1")
            .bind(external_id)
            .fetch_optional(pool)
            .await
    }

    pub async fn find_by_id(pool: &PgPool, id: DbId) -> Result<Option<User>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM users WHERE id = $1");
        sqlx::query_as::<_, User>(&query)
            .bind(id)
            .fetch_optional(pool)
            .await
    }

    pub async fn update_name(
        pool: &PgPool,
        id: DbId,
        name: &str,
    ) -> Result<Option<User>, sqlx::Error> {
        let query = format!(
            "UPDATE users SET name = $2, updated_at = now() WHERE id = $1 RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, User>(&query)
            .bind(id)
            .bind(name)
            .fetch_optional(pool)
            .await
    }

    /// Record a freshly uploaded banner. The caller reads the row first
    /// when it needs the old key for stored-object cleanup.
    pub async fn set_banner(
        pool: &PgPool,
        id: DbId,
        url: &str,
        key: &str,
    ) -> Result<Option<User>, sqlx::Error> {
        let query = format!(
            "UPDATE users SET banner_url = $2, banner_key = $3, updated_at = now() \
             WHERE id = $1 RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, User>(&query)
            .bind(id)
            .bind(url)
            .bind(key)
            .fetch_optional(pool)
            .await
    }

    /// A user's channel page: profile, subscriber and public-video
    /// counts, and whether the viewer is subscribed. Anonymous viewers
    /// get `viewer_subscribed = false`.
    pub async fn get_profile(
        pool: &PgPool,
        id: DbId,
        viewer: Option<DbId>,
    ) -> Result<Option<UserProfile>, sqlx::Error> {
        sqlx::query_as::<_, UserProfile>(
            "SELECT u.id, u.name, u.image_url, u.banner_url, u.created_at, \
                (SELECT COUNT(*) FROM subscriptions s WHERE s.creator_id = u.id) AS subscriber_count, \
                (SELECT COUNT(*) FROM videos v \
                    WHERE v.user_id = u.id AND v.visibility = 'public') AS video_count, \
                EXISTS(SELECT 1 FROM subscriptions s \
                    WHERE s.creator_id = u.id AND s.viewer_id = $2) AS viewer_subscribed \
             FROM users u WHERE u.id = $1",
        )
        .bind(id)
        .bind(viewer)
        .fetch_optional(pool)
        .await
    }
}
