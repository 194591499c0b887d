//! Wall-clock time effect

use async_trait::async_trait;

/// Physical time source for issuance and journal timestamps
#[async_trait]
pub trait PhysicalTimeEffects: Send + Sync {
    /// Milliseconds since the Unix epoch
    async fn now_ms(&self) -> u64;
}
