//! Throughput gate shared by every call to a rate-limited API.

use async_trait::async_trait;

/// Capability that admits one outbound request at a time.
///
/// One gate is built at start-up and shared by reference with every call site
/// that talks to the throttled service.
#[async_trait]
pub trait RateGate: Send + Sync {
    /// Wait until the next request may be sent.
    async fn acquire(&self);
}

/// Gate that admits every request immediately.
#[derive(Debug, Clone, Copy, Default)]
pub struct UnthrottledRateGate;

#[async_trait]
impl RateGate for UnthrottledRateGate {
    async fn acquire(&self) {}
}
