//! Keyset pagination over composite `(sort_key, id)` keys.
//!
//! Every list query in the system is paginated the same way: fetch
//! `limit + 1` rows ordered by `(sort_key DESC, id DESC)`, filtered to
//! rows strictly after the cursor, then clip the probe row off and
//! derive the next cursor from the last retained row. The id tie-break
//! gives a strict total order even when many rows share a timestamp,
//! so pages never skip or duplicate rows.

use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::CoreError;

/// Smallest accepted page size.
pub const MIN_LIMIT: i64 = 1;

/// Largest accepted page size.
pub const MAX_LIMIT: i64 = 100;

/// The non-unique half of a composite sort key.
///
/// Timestamps cover the `updated_at` / `viewed_at` / `liked_at` sorts;
/// counts cover the trending sort. Serialized untagged so a cursor is
/// just `{"k": <value>, "id": <uuid>}` under the base64 wrapper.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum SortKey {
    Count(i64),
    Time(DateTime<Utc>),
}

impl SortKey {
    pub fn as_time(self) -> Result<DateTime<Utc>, CoreError> {
        match self {
            SortKey::Time(t) => Ok(t),
            SortKey::Count(_) => Err(CoreError::Validation(
                "cursor sort key must be a timestamp".into(),
            )),
        }
    }

    pub fn as_count(self) -> Result<i64, CoreError> {
        match self {
            SortKey::Count(n) => Ok(n),
            SortKey::Time(_) => Err(CoreError::Validation(
                "cursor sort key must be a count".into(),
            )),
        }
    }
}

/// Marks the last-seen row of a page: the sort-key value plus the row
/// id that breaks ties. Opaque on the wire (base64url-encoded JSON).
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Cursor {
    #[serde(rename = "k")]
    pub key: SortKey,
    pub id: Uuid,
}

impl Cursor {
    pub fn time(key: DateTime<Utc>, id: Uuid) -> Self {
        Self {
            key: SortKey::Time(key),
            id,
        }
    }

    pub fn count(key: i64, id: Uuid) -> Self {
        Self {
            key: SortKey::Count(key),
            id,
        }
    }

    /// Encode as an opaque URL-safe token.
    pub fn encode(&self) -> String {
        // Serializing a two-field struct of primitives cannot fail.
        let json = serde_json::to_vec(self).expect("cursor serialization");
        URL_SAFE_NO_PAD.encode(json)
    }

    /// Decode a token produced by [`Cursor::encode`].
    pub fn decode(token: &str) -> Result<Self, CoreError> {
        let bytes = URL_SAFE_NO_PAD
            .decode(token)
            .map_err(|_| CoreError::Validation("malformed cursor".into()))?;
        serde_json::from_slice(&bytes)
            .map_err(|_| CoreError::Validation("malformed cursor".into()))
    }
}

/// Validated input for a paginated list query.
#[derive(Debug, Clone, Copy)]
pub struct PageRequest {
    pub cursor: Option<Cursor>,
    pub limit: i64,
}

impl PageRequest {
    /// Build a request, rejecting limits outside `[1, 100]`.
    pub fn new(cursor: Option<Cursor>, limit: i64) -> Result<Self, CoreError> {
        if !(MIN_LIMIT..=MAX_LIMIT).contains(&limit) {
            return Err(CoreError::Validation(format!(
                "limit must be between {MIN_LIMIT} and {MAX_LIMIT}, got {limit}"
            )));
        }
        Ok(Self { cursor, limit })
    }

    /// How many rows to actually fetch: one extra row tells us whether
    /// a next page exists without a second count query.
    pub fn probe_limit(&self) -> i64 {
        self.limit + 1
    }
}

/// One page of results plus the cursor for the next page, if any.
#[derive(Debug, Serialize)]
pub struct Page<T> {
    pub items: Vec<T>,
    pub next_cursor: Option<String>,
}

impl<T> Page<T> {
    /// Clip a `limit + 1` probe down to a page.
    ///
    /// If the probe returned more than `limit` rows there is a next
    /// page: drop the extra row and point the cursor at the last row
    /// we keep. Exactly `limit` (or fewer) rows means the result set
    /// is exhausted and no trailing empty page is advertised.
    pub fn clip(mut rows: Vec<T>, limit: i64, key: impl Fn(&T) -> Cursor) -> Self {
        let has_more = rows.len() as i64 > limit;
        if has_more {
            rows.truncate(limit as usize);
        }
        let next_cursor = if has_more {
            rows.last().map(|last| key(last).encode())
        } else {
            None
        };
        Self {
            items: rows,
            next_cursor,
        }
    }

    pub fn map<U>(self, f: impl FnMut(T) -> U) -> Page<U> {
        Page {
            items: self.items.into_iter().map(f).collect(),
            next_cursor: self.next_cursor,
        }
    }
}
