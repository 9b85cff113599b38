//! Per-user rate limiting for the expensive mutation endpoints
//! (generation triggers, uploads).

use std::num::NonZeroU32;
use std::time::Duration;

use governor::clock::DefaultClock;
use governor::state::keyed::DefaultKeyedStateStore;
use governor::{Quota, RateLimiter};
use reelhouse_core::types::DbId;

use crate::error::{AppError, AppResult};

/// Keyed token bucket: a burst of 10, refilling one per second.
pub struct ApiRateLimiter {
    limiter: RateLimiter<DbId, DefaultKeyedStateStore<DbId>, DefaultClock>,
}

impl Default for ApiRateLimiter {
    fn default() -> Self {
        let quota = Quota::with_period(Duration::from_secs(1))
            .expect("non-zero period")
            .allow_burst(NonZeroU32::new(10).expect("non-zero burst"));
        Self {
            limiter: RateLimiter::keyed(quota),
        }
    }
}

impl ApiRateLimiter {
    /// Check the caller's budget; over-limit calls get 429.
    pub fn check(&self, user_id: DbId) -> AppResult<()> {
        self.limiter
            .check_key(&user_id)
            .map_err(|_| AppError::RateLimited)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;

    #[test]
    fn burst_exhausts_then_rejects() {
        let limiter = ApiRateLimiter::default();
        let user = uuid::Uuid::new_v4();
        for _ in 0..10 {
            limiter.check(user).unwrap();
        }
        assert_matches!(limiter.check(user), Err(AppError::RateLimited));
    }

    #[test]
    fn keys_are_independent() {
        let limiter = ApiRateLimiter::default();
        let a = uuid::Uuid::new_v4();
        let b = uuid::Uuid::new_v4();
        for _ in 0..10 {
            limiter.check(a).unwrap();
        }
        limiter.check(b).unwrap();
    }
}
