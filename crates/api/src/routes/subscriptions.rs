//! Route definitions for subscriptions. Mounted at `/subscriptions`.

use axum::routing::{get, put};
use axum::Router;

use crate::handlers::subscriptions;
use crate::state::AppState;

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(subscriptions::list_subscriptions))
        .route(
            "/{creator_id}",
            put(subscriptions::subscribe).delete(subscriptions::unsubscribe),
        )
}
