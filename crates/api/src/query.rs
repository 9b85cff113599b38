//! Shared query parameter types for the paginated list endpoints.

use reelhouse_core::pagination::{Cursor, PageRequest, MAX_LIMIT};
use reelhouse_core::types::{DbId, Timestamp};
use serde::Deserialize;

use crate::error::{AppError, AppResult};

/// Default page size when the client sends no `limit`.
const DEFAULT_LIMIT: i64 = 20;

/// Generic keyset pagination parameters (`?cursor=&limit=`).
#[derive(Debug, Deserialize)]
pub struct CursorParams {
    /// Opaque token from a previous page's `next_cursor`.
    pub cursor: Option<String>,
    pub limit: Option<i64>,
}

impl CursorParams {
    /// Decode and validate into a [`PageRequest`]. Malformed tokens and
    /// limits outside `[1, 100]` are client errors.
    pub fn into_request(self) -> AppResult<PageRequest> {
        let cursor = self
            .cursor
            .as_deref()
            .map(Cursor::decode)
            .transpose()
            .map_err(AppError::Core)?;
        let limit = self.limit.unwrap_or(DEFAULT_LIMIT);
        PageRequest::new(cursor, limit).map_err(AppError::Core)
    }
}

/// The cursor as a typed `(timestamp, id)` pair, for time-sorted lists.
pub fn time_cursor(request: &PageRequest) -> AppResult<Option<(Timestamp, DbId)>> {
    request
        .cursor
        .map(|c| c.key.as_time().map(|t| (t, c.id)))
        .transpose()
        .map_err(AppError::Core)
}

/// The cursor as a typed `(count, id)` pair, for the trending list.
pub fn count_cursor(request: &PageRequest) -> AppResult<Option<(i64, DbId)>> {
    request
        .cursor
        .map(|c| c.key.as_count().map(|n| (n, c.id)))
        .transpose()
        .map_err(AppError::Core)
}
