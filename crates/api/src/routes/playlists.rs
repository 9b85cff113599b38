//! Route definitions for playlists. Mounted at `/playlists`.

use axum::routing::{get, put};
use axum::Router;

use crate::handlers::playlists;
use crate::state::AppState;

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(playlists::list_playlists).post(playlists::create_playlist))
        .route("/for-video/{video_id}", get(playlists::for_video))
        .route(
            "/{id}",
            get(playlists::get_playlist).delete(playlists::delete_playlist),
        )
        .route("/{id}/videos", get(playlists::list_videos))
        .route(
            "/{id}/videos/{video_id}",
            put(playlists::add_video).delete(playlists::remove_video),
        )
}
