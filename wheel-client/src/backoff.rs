//! Reconnect backoff policy

use std::time::{Duration, SystemTime, UNIX_EPOCH};

/// Cap on the doubling exponent so the multiplier cannot overflow
const MAX_EXPONENT: u32 = 16;

/// Exponential reconnect backoff with jitter
///
/// Delays grow as `base * 2^attempt`, capped at `max`, with up to half
/// the delay subtracted as jitter so a fleet of clients does not
/// reconnect in lockstep. There is no retry limit; the caller keeps
/// asking for delays until a connection succeeds, then calls
/// [`reset`](ReconnectBackoff::reset).
#[derive(Debug, Clone)]
pub struct ReconnectBackoff {
    base: Duration,
    max: Duration,
    attempt: u32,
}

impl ReconnectBackoff {
    /// Policy with the given first delay and cap
    pub fn new(base: Duration, max: Duration) -> Self {
        Self {
            base,
            max,
            attempt: 0,
        }
    }

    /// Delay to wait before the next connection attempt
    pub fn next_delay(&mut self) -> Duration {
        let multiplier = 2_u32.pow(self.attempt.min(MAX_EXPONENT));
        let delay = self.base.saturating_mul(multiplier).min(self.max);
        self.attempt = self.attempt.saturating_add(1);
        jittered(delay)
    }

    /// Forget accumulated failures after a successful open
    pub fn reset(&mut self) {
        self.attempt = 0;
    }

    /// Number of consecutive failed attempts so far
    pub fn attempt(&self) -> u32 {
        self.attempt
    }
}

impl Default for ReconnectBackoff {
    /// 500 ms first retry, capped at 30 s
    fn default() -> Self {
        Self::new(Duration::from_millis(500), Duration::from_secs(30))
    }
}

/// Scale a delay into `[delay/2, delay]` using the clock's subsecond
/// nanoseconds as the randomness source
fn jittered(delay: Duration) -> Duration {
    let nanos = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.subsec_nanos())
        .unwrap_or(0);
    let fraction = 0.5 + 0.5 * (f64::from(nanos) / 1e9);
    delay.mul_f64(fraction)
}
