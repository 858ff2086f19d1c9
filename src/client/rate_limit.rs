//! Per-account request pacing for image attribute lookups
//!
//! The upstream API throttles each account independently, so every account
//! in a refresh cycle gets its own limiter shared by all of its regions.

use std::num::NonZeroU32;

use governor::clock::DefaultClock;
use governor::state::{InMemoryState, NotKeyed};
use governor::{Quota, RateLimiter};
use log::debug;

/// Token bucket pacing requests for one account.
pub struct RequestLimiter {
    limiter: RateLimiter<NotKeyed, InMemoryState, DefaultClock>,
    account_id: String,
}

impl RequestLimiter {
    /// Create a limiter allowing `rate` requests per second.
    pub fn new(account_id: &str, rate: f64) -> Self {
        Self {
            limiter: RateLimiter::direct(quota_for(rate)),
            account_id: account_id.to_string(),
        }
    }

    /// Wait until the next request may be sent.
    pub async fn until_ready(&self) {
        if self.limiter.check().is_err() {
            debug!("Waiting for request limiter owner_id={}", self.account_id);
            self.limiter.until_ready().await;
        }
    }
}

/// Quota for a per-second rate; sub-1 rates are expressed per minute.
fn quota_for(rate: f64) -> Quota {
    if rate >= 1.0 {
        Quota::per_second(NonZeroU32::new(rate as u32).unwrap_or(NonZeroU32::MIN))
    } else {
        let per_min = (rate * 60.0).round() as u32;
        Quota::per_minute(NonZeroU32::new(per_min).unwrap_or(NonZeroU32::MIN))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_quota_per_second() {
        let quota = quota_for(20.0);
        assert_eq!(quota.burst_size().get(), 20);
    }

    #[test]
    fn test_quota_sub_one_rate_uses_minutes() {
        let quota = quota_for(0.5);
        assert_eq!(quota.burst_size().get(), 30);
    }

    #[test]
    fn test_quota_never_zero() {
        let quota = quota_for(0.0);
        assert_eq!(quota.burst_size().get(), 1);
    }

    #[tokio::test]
    async fn test_until_ready_within_burst() {
        let limiter = RequestLimiter::new("111122223333", 5.0);
        for _ in 0..5 {
            limiter.until_ready().await;
        }
    }
}
