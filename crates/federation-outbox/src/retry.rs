use std::time::Duration;

use rand::RngExt;

use crate::bus::BusError;
use crate::error::OutboxError;

/// Bounded retry with exponential backoff and jitter for bus publishes.
///
/// Each attempt is capped at `attempt_timeout`; a timed-out attempt counts as a
/// transient failure. Permanent errors ([`BusError::is_transient`] is false) are
/// returned immediately.
#[derive(Debug, Clone, PartialEq)]
pub struct RetryPolicy {
    pub max_attempts: u32,
    pub initial_backoff: Duration,
    pub max_backoff: Duration,
    pub multiplier: f64,
    /// Upper bound of the random extra delay, as a fraction of the backoff.
    pub jitter: f64,
    pub attempt_timeout: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            initial_backoff: Duration::from_millis(200),
            max_backoff: Duration::from_secs(5),
            multiplier: 2.0,
            jitter: 0.2,
            attempt_timeout: Duration::from_secs(3),
        }
    }
}

impl RetryPolicy {
    /// Delay after the `attempt`-th failure (1-based), before jitter.
    pub fn backoff_for(&self, attempt: u32) -> Duration {
        let exponent = attempt.saturating_sub(1).min(i32::MAX as u32) as i32;
        let secs = self.initial_backoff.as_secs_f64() * self.multiplier.powi(exponent);
        Duration::try_from_secs_f64(secs)
            .unwrap_or(self.max_backoff)
            .min(self.max_backoff)
    }

    fn jittered(&self, base: Duration) -> Duration {
        if self.jitter <= 0.0 {
            return base;
        }
        let spread = rand::rng().random_range(0.0..=self.jitter);
        Duration::try_from_secs_f64(base.as_secs_f64() * (1.0 + spread)).unwrap_or(base)
    }

    /// Run `op` until it succeeds, fails permanently or runs out of attempts.
    ///
    /// `op` receives the 1-based attempt number.
    pub async fn run<T, F, Fut>(&self, mut op: F) -> Result<T, OutboxError>
    where
        F: FnMut(u32) -> Fut,
        Fut: Future<Output = Result<T, BusError>>,
    {
        let max_attempts = self.max_attempts.max(1);
        let mut attempt = 1;
        loop {
            let result = match tokio::time::timeout(self.attempt_timeout, op(attempt)).await {
                Ok(result) => result,
                Err(_) => Err(BusError::Timeout),
            };
            match result {
                Ok(value) => return Ok(value),
                Err(e) if !e.is_transient() => return Err(OutboxError::PublishRejected(e)),
                Err(e) if attempt >= max_attempts => {
                    return Err(OutboxError::PublishExhausted {
                        attempts: attempt,
                        source: e,
                    });
                }
                Err(e) => {
                    let delay = self.jittered(self.backoff_for(attempt));
                    tracing::warn!(
                        attempt,
                        error = %e,
                        delay_ms = delay.as_millis() as u64,
                        "publish attempt failed, backing off"
                    );
                    tokio::time::sleep(delay).await;
                    attempt += 1;
                }
            }
        }
    }
}
