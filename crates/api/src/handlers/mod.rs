pub mod categories;
pub mod comments;
pub mod jobs;
pub mod playlists;
pub mod search;
pub mod subscriptions;
pub mod users;
pub mod videos;
pub mod webhooks;
