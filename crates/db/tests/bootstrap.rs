use sqlx::PgPool;

/// Connect, migrate, verify the schema came up.
#[sqlx::test]
async fn test_full_bootstrap(pool: PgPool) {
    reelhouse_db::health_check(&pool).await.unwrap();

    let tables = [
        "users",
        "categories",
        "videos",
        "video_views",
        "video_reactions",
        "subscriptions",
        "comments",
        "comment_reactions",
        "playlists",
        "playlist_videos",
        "jobs",
        "job_steps",
    ];

    for table in tables {
        let count: (i64,) = sqlx::query_as(&format!("SELECT COUNT(*) FROM {table}"))
            .fetch_one(&pool)
            .await
            .unwrap_or_else(|e| panic!("{table} query failed: {e}"));
        assert_eq!(count.0, 0, "{table} should start empty");
    }
}
