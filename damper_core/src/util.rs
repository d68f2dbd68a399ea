//! Common timing helpers for damper_core.

use std::time::{Duration, Instant};

/// True when a periodic task whose last tick was `last` should fire at `now`.
/// A task that has never ticked is always due.
#[inline]
pub fn tick_due(last: Option<Instant>, now: Instant, period: Duration) -> bool {
    match last {
        None => true,
        Some(t) => now.saturating_duration_since(t) >= period,
    }
}

/// Period in milliseconds as a `Duration`, floored at 1 ms.
#[inline]
pub fn period_ms(ms: u64) -> Duration {
    Duration::from_millis(ms.max(1))
}

/// Idle back-off in microseconds as a `Duration`, floored at 1 µs.
#[inline]
pub fn idle_us(us: u64) -> Duration {
    Duration::from_micros(us.max(1))
}
