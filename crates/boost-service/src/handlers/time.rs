//! Wall-clock time handler
//!
//! Production only; the manual clock for tests lives in `boost-testkit`.

use async_trait::async_trait;
use boost_core::PhysicalTimeEffects;
use std::time::{Duration, SystemTime, UNIX_EPOCH};

/// System clock
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

#[async_trait]
impl PhysicalTimeEffects for SystemClock {
    async fn now_ms(&self) -> u64 {
        let elapsed = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .unwrap_or(Duration::ZERO);
        u64::try_from(elapsed.as_millis()).unwrap_or(u64::MAX)
    }
}
