//! Route definitions for threaded comments. Mounted at `/comments`.

use axum::routing::{delete, get, post};
use axum::Router;

use crate::handlers::comments;
use crate::state::AppState;

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(comments::list_comments).post(comments::create_comment))
        .route("/{id}", delete(comments::delete_comment))
        .route("/{id}/reactions", post(comments::toggle_reaction))
}
