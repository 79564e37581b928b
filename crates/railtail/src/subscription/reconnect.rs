//! Backoff between failed connection attempts.
//!
//! Attempts are unbounded; only cancellation ends the retry loop.

use std::time::Duration;

use tokio_util::sync::CancellationToken;

/// Configuration for reconnection behavior.
#[derive(Debug, Clone, PartialEq)]
pub struct ReconnectConfig {
    /// Delay after the first failed attempt.
    pub initial_delay: Duration,
    /// Maximum delay between attempts.
    pub max_delay: Duration,
    /// Multiplier for exponential backoff.
    pub backoff_multiplier: f64,
}

impl Default for ReconnectConfig {
    fn default() -> Self {
        Self {
            initial_delay: Duration::from_millis(250),
            max_delay: Duration::from_secs(30),
            backoff_multiplier: 2.0,
        }
    }
}

impl ReconnectConfig {
    /// Calculate delay for the given attempt number.
    #[must_use]
    pub fn delay_for_attempt(&self, attempt: u32) -> Duration {
        let multiplier = self
            .backoff_multiplier
            .powi(attempt.saturating_sub(1).min(64) as i32);
        let delay_millis = self.initial_delay.as_millis() as f64 * multiplier;
        if !delay_millis.is_finite() || delay_millis >= self.max_delay.as_millis() as f64 {
            return self.max_delay;
        }
        Duration::from_millis(delay_millis as u64).min(self.max_delay)
    }

    /// Sleep for the backoff of `attempt`, waking early on cancellation.
    ///
    /// Returns `false` if cancelled.
    pub async fn wait(&self, attempt: u32, cancel: &CancellationToken) -> bool {
        let delay = self.delay_for_attempt(attempt);
        tokio::select! {
            () = cancel.cancelled() => false,
            () = tokio::time::sleep(delay) => true,
        }
    }
}
