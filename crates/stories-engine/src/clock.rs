//! Wall clock that follows the Tokio timer.

use chrono::{DateTime, TimeDelta, Utc};
use stories_core::clock::Clock;
use tokio::time::Instant;

/// A clock anchored to the wall time at creation and advanced by Tokio's
/// monotonic instant.
///
/// Elapsed time never goes backwards when the system clock is adjusted, and
/// under a paused Tokio runtime it advances exactly as far as the runtime's
/// virtual time.
#[derive(Debug, Clone, Copy)]
pub struct TokioClock {
    anchor: DateTime<Utc>,
    started: Instant,
}

impl TokioClock {
    /// Anchors a new clock at the current wall time.
    #[must_use]
    pub fn new() -> Self {
        Self {
            anchor: Utc::now(),
            started: Instant::now(),
        }
    }
}

impl Default for TokioClock {
    fn default() -> Self {
        Self::new()
    }
}

impl Clock for TokioClock {
    fn now(&self) -> DateTime<Utc> {
        let elapsed = TimeDelta::from_std(self.started.elapsed()).unwrap_or(TimeDelta::MAX);
        self.anchor
            .checked_add_signed(elapsed)
            .unwrap_or(DateTime::<Utc>::MAX_UTC)
    }
}
