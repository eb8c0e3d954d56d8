//! Delay between page requests
//!
//! The upstream CDN throttles aggressive clients, so the downloader pauses after
//! every page. The pause is cancellable and a zero delay skips the timer entirely,
//! which is what tests use.

use std::time::Duration;
use tokio_util::sync::CancellationToken;

/// Fixed delay applied after each page
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct PacingPolicy {
    delay: Duration,
}

impl PacingPolicy {
    /// Pause for `delay` after each page
    pub fn fixed(delay: Duration) -> Self {
        Self { delay }
    }

    /// No pause at all
    pub fn none() -> Self {
        Self {
            delay: Duration::ZERO,
        }
    }

    /// Configured delay
    pub fn delay(&self) -> Duration {
        self.delay
    }

    /// Sleep for the configured delay
    ///
    /// Returns `false` if `cancel` fired before the delay elapsed.
    pub async fn pause(&self, cancel: &CancellationToken) -> bool {
        if self.delay.is_zero() {
            return !cancel.is_cancelled();
        }
        tokio::select! {
            _ = cancel.cancelled() => false,
            _ = tokio::time::sleep(self.delay) => true,
        }
    }
}

impl Default for PacingPolicy {
    fn default() -> Self {
        Self::fixed(Duration::from_millis(500))
    }
}
