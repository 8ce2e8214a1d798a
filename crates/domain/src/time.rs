//! Monotonic time helpers.
//!
//! Every time-dependent decision in the core (retry gates, sampling cadence,
//! economy timer) takes an explicit [`Instant`] so that callers, tests
//! included, control the clock.

use std::time::Duration;

/// Monotonic instant used for reading timestamps, retry gates and timers.
pub type Instant = std::time::Instant;

/// Return the current monotonic instant.
#[must_use]
pub fn now() -> Instant {
    Instant::now()
}

/// Whether `deadline` has been reached at `now`.
///
/// `None` means "no deadline scheduled", which is always due.
#[must_use]
pub fn is_due(deadline: Option<Instant>, now: Instant) -> bool {
    deadline.is_none_or(|at| now >= at)
}

/// Instant `delay` after `now`, clamped to the latest representable instant
/// instead of overflowing.
#[must_use]
pub fn deadline_after(now: Instant, delay: Duration) -> Instant {
    let mut delay = delay;
    loop {
        if let Some(deadline) = now.checked_add(delay) {
            return deadline;
        }
        delay /= 2;
    }
}

/// Time elapsed between `since` and `now`, saturating at zero when `now`
/// precedes `since`.
#[must_use]
pub fn elapsed_between(since: Instant, now: Instant) -> Duration {
    now.saturating_duration_since(since)
}
