//! Threaded comments: one level of replies, reply counts, and the
//! cascade on delete.

use reelhouse_core::types::DbId;
use sqlx::PgPool;

use reelhouse_db::models::comment::CreateComment;
use reelhouse_db::models::user::Identity;
use reelhouse_db::repositories::{CommentRepo, UserRepo};

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

async fn seed_video(pool: &PgPool, user_id: DbId) -> DbId {
    sqlx::query_scalar(
        "INSERT INTO videos (user_id, title, visibility) VALUES ($1, 'v', 'public') RETURNING id",
    )
    .bind(user_id)
    .fetch_one(pool)
    .await
    .unwrap()
}

fn comment(video_id: DbId, parent_id: Option<DbId>, value: &str) -> CreateComment {
    CreateComment {
        video_id,
        parent_id,
        value: value.to_string(),
    }
}

#[sqlx::test]
async fn test_top_level_listing_excludes_replies(pool: PgPool) {
    let user = seed_user(&pool, "author").await;
    let video = seed_video(&pool, user).await;

    let root = CommentRepo::create(&pool, user, &comment(video, None, "root"))
        .await
        .unwrap();
    CommentRepo::create(&pool, user, &comment(video, Some(root.id), "reply 1"))
        .await
        .unwrap();
    CommentRepo::create(&pool, user, &comment(video, Some(root.id), "reply 2"))
        .await
        .unwrap();
    CommentRepo::create(&pool, user, &comment(video, None, "other root"))
        .await
        .unwrap();

    let page = CommentRepo::list(&pool, video, None, None, 10).await.unwrap();
    assert_eq!(page.items.len(), 2, "replies stay out of the top level");

    let root_row = page.items.iter().find(|c| c.id == root.id).unwrap();
    assert_eq!(root_row.reply_count, 2);

    let replies = CommentRepo::list(&pool, video, Some(root.id), None, 10)
        .await
        .unwrap();
    assert_eq!(replies.items.len(), 2);

    assert_eq!(CommentRepo::count_for_video(&pool, video).await.unwrap(), 4);
}

#[sqlx::test]
async fn test_delete_cascades_to_replies(pool: PgPool) {
    let author = seed_user(&pool, "author").await;
    let replier = seed_user(&pool, "replier").await;
    let video = seed_video(&pool, author).await;

    let root = CommentRepo::create(&pool, author, &comment(video, None, "root"))
        .await
        .unwrap();
    let reply = CommentRepo::create(&pool, replier, &comment(video, Some(root.id), "reply"))
        .await
        .unwrap();

    // Only the author may delete; a stranger's delete matches nothing.
    assert!(CommentRepo::delete(&pool, root.id, replier).await.unwrap().is_none());
    assert!(CommentRepo::delete(&pool, root.id, author).await.unwrap().is_some());

    assert!(CommentRepo::find_by_id(&pool, reply.id).await.unwrap().is_none());
    assert_eq!(CommentRepo::count_for_video(&pool, video).await.unwrap(), 0);
}

#[sqlx::test]
async fn test_listing_paginates_newest_first(pool: PgPool) {
    let user = seed_user(&pool, "author").await;
    let video = seed_video(&pool, user).await;

    for i in 0..3 {
        let c = CommentRepo::create(&pool, user, &comment(video, None, &format!("c{i}")))
            .await
            .unwrap();
        // Spread the sort keys so ordering is deterministic.
        sqlx::query("UPDATE comments SET updated_at = now() - ($2 * interval '1 minute') WHERE id = $1")
            .bind(c.id)
            .bind(2 - i)
            .execute(&pool)
            .await
            .unwrap();
    }

    let page1 = CommentRepo::list(&pool, video, None, None, 2).await.unwrap();
    assert_eq!(page1.items.len(), 2);
    assert_eq!(page1.items[0].value, "c2");

    let cursor = reelhouse_core::pagination::Cursor::decode(
        page1.next_cursor.as_deref().unwrap(),
    )
    .unwrap();
    let page2 = CommentRepo::list(
        &pool,
        video,
        None,
        Some((cursor.key.as_time().unwrap(), cursor.id)),
        2,
    )
    .await
    .unwrap();
    assert_eq!(page2.items.len(), 1);
    assert_eq!(page2.items[0].value, "c0");
    assert!(page2.next_cursor.is_none());
}
