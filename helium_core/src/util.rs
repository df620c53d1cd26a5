//! Tick and lock helpers shared by the worker loops.

use std::sync::{Mutex, MutexGuard, PoisonError};
use std::time::Duration;

/// Upper bound on how long any loop waits between stop checks.
pub const MAX_TICK: Duration = Duration::from_millis(100);
/// Lower bound so a zero period never turns a loop into a busy spin.
pub const MIN_TICK: Duration = Duration::from_millis(1);

/// Check tick for a loop with the given refresh period: a tenth of the period,
/// clamped to [`MIN_TICK`, `MAX_TICK`].
#[inline]
pub fn tick_for(period: Duration) -> Duration {
    (period / 10).clamp(MIN_TICK, MAX_TICK)
}

/// Seconds from config to a `Duration`. Negative and NaN values map to zero;
/// values too large for a `Duration` saturate to `Duration::MAX`.
#[inline]
pub fn duration_from_secs(secs: f64) -> Duration {
    match Duration::try_from_secs_f64(secs) {
        Ok(d) => d,
        Err(_) if secs > 0.0 => Duration::MAX,
        Err(_) => Duration::ZERO,
    }
}

/// Lock a mutex, recovering the data if a worker panicked while holding it.
#[inline]
pub fn lock<T>(m: &Mutex<T>) -> MutexGuard<'_, T> {
    m.lock().unwrap_or_else(PoisonError::into_inner)
}
