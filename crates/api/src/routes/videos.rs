//! Route definitions for the video feeds and the owner's video
//! lifecycle. Mounted at `/videos`.

use axum::routing::{get, patch, post};
use axum::Router;

use crate::handlers::videos;
use crate::state::AppState;

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(videos::list_feed).post(videos::create_video))
        .route("/trending", get(videos::list_trending))
        .route("/subscribed", get(videos::list_subscribed))
        .route("/history", get(videos::list_history))
        .route("/liked", get(videos::list_liked))
        .route("/studio", get(videos::list_studio))
        .route(
            "/{id}",
            patch(videos::update_video)
                .get(videos::get_video)
                .delete(videos::delete_video),
        )
        .route("/{id}/revalidate", post(videos::revalidate_video))
        .route("/{id}/restore-thumbnail", post(videos::restore_thumbnail))
        .route("/{id}/thumbnail", post(videos::complete_thumbnail_upload))
        .route("/{id}/views", post(videos::record_view))
        .route("/{id}/reactions", post(videos::toggle_reaction))
        .route("/{id}/generate/{field}", post(videos::generate_metadata))
}
