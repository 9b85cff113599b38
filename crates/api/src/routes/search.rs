//! Route definition for video search. Mounted at `/search`.

use axum::routing::get;
use axum::Router;

use crate::handlers::search;
use crate::state::AppState;

pub fn router() -> Router<AppState> {
    Router::new().route("/", get(search::search_videos))
}
