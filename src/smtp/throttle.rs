use std::num::NonZeroU32;
use std::time::Duration;

use governor::{DefaultDirectRateLimiter, Quota, RateLimiter};
use tracing::debug;

use super::ProbeError;
use crate::context::CallContext;
use crate::error::ConfigError;

/// Process-wide cap on SMTP probes, shared by every call on one engine.
pub struct ProbeThrottle {
    limiter: DefaultDirectRateLimiter,
}

impl std::fmt::Debug for ProbeThrottle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ProbeThrottle").finish_non_exhaustive()
    }
}

impl ProbeThrottle {
    /// `probes` slots per `window`, all of them available as a burst.
    pub fn new(probes: u32, window: Duration) -> Result<Self, ConfigError> {
        let burst = NonZeroU32::new(probes).ok_or(ConfigError::Throttle)?;
        let quota = Quota::with_period(window / probes)
            .ok_or(ConfigError::Throttle)?
            .allow_burst(burst);
        Ok(Self {
            limiter: RateLimiter::direct(quota),
        })
    }

    /// Takes a slot, waiting at most until the context deadline.
    pub async fn acquire(&self, ctx: &CallContext) -> Result<(), ProbeError> {
        if self.limiter.check().is_ok() {
            return Ok(());
        }
        debug!("probe throttle saturated, waiting for a slot");
        match ctx.remaining() {
            None => {
                self.limiter.until_ready().await;
                Ok(())
            }
            Some(remaining) if remaining.is_zero() => Err(ProbeError::RateLimited),
            Some(remaining) => tokio::time::timeout(remaining, self.limiter.until_ready())
                .await
                .map_err(|_| ProbeError::RateLimited),
        }
    }
}
