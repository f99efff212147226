//! Clock abstraction for determinism.

use chrono::{DateTime, TimeDelta, Utc};

/// Abstraction over wall-clock time for deterministic behavior.
pub trait Clock: Send + Sync {
    /// Returns the current time.
    fn now(&self) -> DateTime<Utc>;
}

/// Milliseconds elapsed from `earlier` to `later`, with sub-millisecond
/// precision. Never negative.
#[must_use]
#[allow(clippy::cast_precision_loss)]
pub fn millis_between(earlier: DateTime<Utc>, later: DateTime<Utc>) -> f64 {
    let delta = later.signed_duration_since(earlier);
    match delta.num_microseconds() {
        Some(micros) if micros > 0 => micros as f64 / 1000.0,
        Some(_) => 0.0,
        None => delta.num_milliseconds().max(0) as f64,
    }
}

/// Returns `at` shifted forward by `ms` milliseconds, saturating at the
/// largest representable instant.
#[must_use]
pub fn after_millis(at: DateTime<Utc>, ms: u64) -> DateTime<Utc> {
    let delta = i64::try_from(ms)
        .ok()
        .and_then(TimeDelta::try_milliseconds)
        .unwrap_or(TimeDelta::MAX);
    at.checked_add_signed(delta)
        .unwrap_or(DateTime::<Utc>::MAX_UTC)
}
