//! Token-bucket rate gate built on `governor`.

use std::time::Duration;

use async_trait::async_trait;
use governor::{DefaultDirectRateLimiter, Quota, RateLimiter};

use crate::domain::ports::RateGate;

/// Admits one request per `interval`, with no burst allowance.
pub struct GovernorRateGate {
    limiter: DefaultDirectRateLimiter,
}

impl GovernorRateGate {
    /// Build a gate replenishing one permit every `interval`.
    ///
    /// Returns `None` for a zero interval.
    pub fn new(interval: Duration) -> Option<Self> {
        let quota = Quota::with_period(interval)?;
        Some(Self {
            limiter: RateLimiter::direct(quota),
        })
    }
}

#[async_trait]
impl RateGate for GovernorRateGate {
    async fn acquire(&self) {
        self.limiter.until_ready().await;
    }
}
