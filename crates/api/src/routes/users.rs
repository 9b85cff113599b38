//! Route definitions for user profiles. Mounted at `/users`.

use axum::routing::{get, patch, post};
use axum::Router;

use crate::handlers::users;
use crate::state::AppState;

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/me", patch(users::update_me))
        .route("/me/banner", post(users::complete_banner_upload))
        .route("/{id}", get(users::get_profile))
        .route("/{id}/videos", get(users::list_channel_videos))
}
