//! Route definition for the processor webhook. Mounted at
//! `/api/webhooks`, outside the versioned API: the path is part of the
//! processor's delivery configuration and never changes with the API.

use axum::routing::post;
use axum::Router;

use crate::handlers::webhooks;
use crate::state::AppState;

pub fn router() -> Router<AppState> {
    Router::new().route("/video", post(webhooks::handle_video_event))
}
