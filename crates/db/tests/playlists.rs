//! Playlist CRUD, membership, and the derived list projections.

use reelhouse_core::types::DbId;
use sqlx::PgPool;

use reelhouse_db::models::playlist::{CreatePlaylist, PlaylistVideo};
use reelhouse_db::models::user::Identity;
use reelhouse_db::repositories::{PlaylistRepo, UserRepo};

async fn seed_user(pool: &PgPool, external_id: &str) -> DbId {
    UserRepo::ensure(
        pool,
        &Identity {
            external_id: external_id.to_string(),
            name: format!("user {external_id}"),
            image_url: "https://img.test/avatar.png".to_string(),
        },
    )
    .await
    .unwrap()
    .id
}

async fn seed_video(pool: &PgPool, user_id: DbId, title: &str, thumbnail: Option<&str>) -> DbId {
    sqlx::query_scalar(
        "INSERT INTO videos (user_id, title, visibility, thumbnail_url) \
         VALUES ($1, $2, 'public', $3) RETURNING id",
    )
    .bind(user_id)
    .bind(title)
    .bind(thumbnail)
    .fetch_one(pool)
    .await
    .unwrap()
}

fn playlist(name: &str) -> CreatePlaylist {
    CreatePlaylist {
        name: name.to_string(),
        description: None,
    }
}

#[sqlx::test]
async fn test_duplicate_add_violates_membership_key(pool: PgPool) {
    let user = seed_user(&pool, "owner").await;
    let video = seed_video(&pool, user, "v", None).await;
    let list = PlaylistRepo::create(&pool, user, &playlist("watch later"))
        .await
        .unwrap();

    PlaylistRepo::add_video(&pool, list.id, video).await.unwrap();
    let err = PlaylistRepo::add_video(&pool, list.id, video).await.unwrap_err();
    match err {
        sqlx::Error::Database(db) => assert_eq!(db.code().as_deref(), Some("23505")),
        other => panic!("expected unique violation, got {other:?}"),
    }

    assert!(PlaylistRepo::remove_video(&pool, list.id, video).await.unwrap());
    assert!(!PlaylistRepo::remove_video(&pool, list.id, video).await.unwrap());
}

#[sqlx::test]
async fn test_membership_rows_without_position_still_decode(pool: PgPool) {
    let user = seed_user(&pool, "owner").await;
    let legacy = seed_video(&pool, user, "legacy", None).await;
    let fresh = seed_video(&pool, user, "fresh", None).await;
    let list = PlaylistRepo::create(&pool, user, &playlist("imported")).await.unwrap();

    // The position column is nullable; rows written outside add_video
    // may not carry one.
    sqlx::query("INSERT INTO playlist_videos (playlist_id, video_id) VALUES ($1, $2)")
        .bind(list.id)
        .bind(legacy)
        .execute(&pool)
        .await
        .unwrap();

    let rows = sqlx::query_as::<_, PlaylistVideo>(
        "SELECT playlist_id, video_id, position, created_at, updated_at FROM playlist_videos",
    )
    .fetch_all(&pool)
    .await
    .unwrap();
    assert_eq!(rows.len(), 1);
    assert_eq!(rows[0].position, None);

    // The next append still numbers itself past the NULL rows.
    let added = PlaylistRepo::add_video(&pool, list.id, fresh).await.unwrap();
    assert_eq!(added.position, Some(1));
}

#[sqlx::test]
async fn test_list_projects_count_and_latest_thumbnail(pool: PgPool) {
    let user = seed_user(&pool, "owner").await;
    let old = seed_video(&pool, user, "old", Some("https://img.test/old.jpg")).await;
    let new = seed_video(&pool, user, "new", Some("https://img.test/new.jpg")).await;
    let list = PlaylistRepo::create(&pool, user, &playlist("mix")).await.unwrap();

    PlaylistRepo::add_video(&pool, list.id, old).await.unwrap();
    // Pin the first membership earlier so "most recently added" is `new`.
    sqlx::query(
        "UPDATE playlist_videos SET created_at = now() - interval '1 hour' WHERE video_id = $1",
    )
    .bind(old)
    .execute(&pool)
    .await
    .unwrap();
    PlaylistRepo::add_video(&pool, list.id, new).await.unwrap();

    let page = PlaylistRepo::list(&pool, user, None, 10).await.unwrap();
    assert_eq!(page.items.len(), 1);
    assert_eq!(page.items[0].video_count, 2);
    assert_eq!(
        page.items[0].thumbnail_url.as_deref(),
        Some("https://img.test/new.jpg")
    );
}

#[sqlx::test]
async fn test_playlist_videos_ordered_by_added_at(pool: PgPool) {
    let user = seed_user(&pool, "owner").await;
    let first = seed_video(&pool, user, "first", None).await;
    let second = seed_video(&pool, user, "second", None).await;
    let list = PlaylistRepo::create(&pool, user, &playlist("queue")).await.unwrap();

    PlaylistRepo::add_video(&pool, list.id, first).await.unwrap();
    sqlx::query(
        "UPDATE playlist_videos SET created_at = now() - interval '1 hour' WHERE video_id = $1",
    )
    .bind(first)
    .execute(&pool)
    .await
    .unwrap();
    PlaylistRepo::add_video(&pool, list.id, second).await.unwrap();

    let page = PlaylistRepo::list_videos(&pool, list.id, None, 10).await.unwrap();
    let ids: Vec<DbId> = page.items.iter().map(|r| r.id).collect();
    assert_eq!(ids, vec![second, first], "most recently added first");
}

#[sqlx::test]
async fn test_for_video_flags_membership(pool: PgPool) {
    let user = seed_user(&pool, "owner").await;
    let video = seed_video(&pool, user, "v", None).await;
    let with = PlaylistRepo::create(&pool, user, &playlist("has it")).await.unwrap();
    PlaylistRepo::create(&pool, user, &playlist("does not")).await.unwrap();
    PlaylistRepo::add_video(&pool, with.id, video).await.unwrap();

    let page = PlaylistRepo::for_video(&pool, user, video, None, 10).await.unwrap();
    assert_eq!(page.items.len(), 2);
    for row in &page.items {
        assert_eq!(row.contains_video, row.id == with.id);
    }
}

#[sqlx::test]
async fn test_delete_is_owner_scoped_and_cascades(pool: PgPool) {
    let owner = seed_user(&pool, "owner").await;
    let stranger = seed_user(&pool, "stranger").await;
    let video = seed_video(&pool, owner, "v", None).await;
    let list = PlaylistRepo::create(&pool, owner, &playlist("mine")).await.unwrap();
    PlaylistRepo::add_video(&pool, list.id, video).await.unwrap();

    assert!(PlaylistRepo::delete(&pool, list.id, stranger).await.unwrap().is_none());
    assert!(PlaylistRepo::delete(&pool, list.id, owner).await.unwrap().is_some());

    let memberships: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM playlist_videos")
        .fetch_one(&pool)
        .await
        .unwrap();
    assert_eq!(memberships, 0);
}
