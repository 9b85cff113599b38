pub mod categories;
pub mod comments;
pub mod health;
pub mod jobs;
pub mod playlists;
pub mod search;
pub mod subscriptions;
pub mod users;
pub mod videos;
pub mod webhooks;

use axum::Router;

use crate::state::AppState;

/// Build the `/api/v1` route tree.
///
/// Route hierarchy:
///
/// ```text
/// /videos                                   feed (GET), create (POST)
/// /videos/trending                          trending feed
/// /videos/subscribed                        subscriptions feed (auth)
/// /videos/history                           watch history (auth)
/// /videos/liked                             liked videos (auth)
/// /videos/studio                            own videos incl. private (auth)
/// /videos/{id}                              detail (GET), update (PATCH), delete
/// /videos/{id}/revalidate                   re-pull processor state (POST)
/// /videos/{id}/restore-thumbnail            regenerate thumbnail (POST)
/// /videos/{id}/thumbnail                    thumbnail upload completion (POST)
/// /videos/{id}/views                        record a view (POST)
/// /videos/{id}/reactions                    toggle like/dislike (POST)
/// /videos/{id}/generate/{field}             enqueue metadata job (POST)
///
/// /comments                                 create (POST), list (GET ?video_id=)
/// /comments/{id}                            delete
/// /comments/{id}/reactions                  toggle like/dislike (POST)
///
/// /subscriptions                            list (GET)
/// /subscriptions/{creator_id}               subscribe (PUT), unsubscribe (DELETE)
///
/// /playlists                                create (POST), list (GET)
/// /playlists/for-video/{video_id}           membership flags (GET)
/// /playlists/{id}                           detail (GET), delete
/// /playlists/{id}/videos                    list videos (GET)
/// /playlists/{id}/videos/{video_id}         add (PUT), remove (DELETE)
///
/// /users/me                                 update name (PATCH)
/// /users/me/banner                          banner upload completion (POST)
/// /users/{id}                               profile (GET)
/// /users/{id}/videos                        channel videos (GET)
///
/// /categories                               list (GET)
/// /search                                   search videos (GET ?query=&category_id=)
///
/// /jobs/{id}                                get job (GET, owner)
/// /jobs/{id}/retry                          retry failed job (POST, owner)
/// ```
pub fn api_routes() -> Router<AppState> {
    Router::new()
        .nest("/videos", videos::router())
        .nest("/comments", comments::router())
        .nest("/subscriptions", subscriptions::router())
        .nest("/playlists", playlists::router())
        .nest("/users", users::router())
        .nest("/categories", categories::router())
        .nest("/search", search::router())
        .nest("/jobs", jobs::router())
}
