//! Pausable playback timer.
//!
//! Elapsed time is `(now - run_started_at) + accumulated_ms`, so pausing and
//! resuming keep the exact sub-frame position instead of counting ticks. The
//! timer is driven by its owner calling [`PlaybackTimer::tick`] once per
//! display frame while [`PlaybackTimer::needs_frame`] is true.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use stories_core::clock::{Clock, millis_between};
use tracing::trace;

/// Outcome of one frame update.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum TimerTick {
    /// No run is active (paused, completed, or never started).
    Idle,
    /// Progress after this frame, in `[0, 1)`.
    Progress(f64),
    /// The run reached its duration on this frame. Fired once per run.
    Completed,
}

/// A pausable elapsed-time clock that emits normalized progress.
pub struct PlaybackTimer {
    clock: Arc<dyn Clock>,
    duration_ms: u64,
    accumulated_ms: f64,
    run_started_at: Option<DateTime<Utc>>,
    paused: bool,
    progress: f64,
    started: bool,
    completed: bool,
    looping: bool,
    loop_id: u64,
}

impl std::fmt::Debug for PlaybackTimer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PlaybackTimer")
            .field("duration_ms", &self.duration_ms)
            .field("accumulated_ms", &self.accumulated_ms)
            .field("run_started_at", &self.run_started_at)
            .field("paused", &self.paused)
            .field("progress", &self.progress)
            .field("completed", &self.completed)
            .field("loop_id", &self.loop_id)
            .finish_non_exhaustive()
    }
}

impl PlaybackTimer {
    /// Creates an idle timer for items of `duration_ms`.
    #[must_use]
    pub fn new(clock: Arc<dyn Clock>, duration_ms: u64) -> Self {
        Self {
            clock,
            duration_ms: duration_ms.max(1),
            accumulated_ms: 0.0,
            run_started_at: None,
            paused: false,
            progress: 0.0,
            started: false,
            completed: false,
            looping: false,
            loop_id: 0,
        }
    }

    /// Begins the first run. No-op if a run is already in progress.
    pub fn start(&mut self) {
        if !self.started {
            self.reset();
        }
    }

    /// Folds the running segment into the accumulated time and stops the
    /// update loop. No-op if already paused.
    pub fn pause(&mut self) {
        if self.paused {
            return;
        }
        let now = self.clock.now();
        if let Some(started_at) = self.run_started_at.take() {
            self.accumulated_ms += millis_between(started_at, now);
        }
        self.publish(self.accumulated_ms);
        self.paused = true;
        self.looping = false;
        trace!(elapsed_ms = self.accumulated_ms, "timer paused");
    }

    /// Re-stamps the run start and restarts the update loop. No-op if not
    /// paused.
    pub fn resume(&mut self) {
        if !self.paused {
            return;
        }
        self.paused = false;
        if self.started && !self.completed {
            self.run_started_at = Some(self.clock.now());
            self.restart_loop();
        }
        trace!(elapsed_ms = self.accumulated_ms, "timer resumed");
    }

    /// Zeroes elapsed time, clears the paused flag and restarts the loop from
    /// progress 0. Any previous loop is cancelled.
    pub fn reset(&mut self) {
        self.accumulated_ms = 0.0;
        self.run_started_at = Some(self.clock.now());
        self.paused = false;
        self.progress = 0.0;
        self.started = true;
        self.completed = false;
        self.restart_loop();
    }

    /// Replaces the duration without touching elapsed time. Published
    /// progress never moves backwards because of this call.
    pub fn set_duration(&mut self, ms: u64) {
        self.duration_ms = ms.max(1);
    }

    /// Returns the timer to its idle state and cancels the loop.
    pub fn stop(&mut self) {
        self.accumulated_ms = 0.0;
        self.run_started_at = None;
        self.paused = false;
        self.progress = 0.0;
        self.started = false;
        self.completed = false;
        self.looping = false;
        self.loop_id += 1;
    }

    /// Recomputes progress for the current frame.
    pub fn tick(&mut self) -> TimerTick {
        if !self.looping {
            return TimerTick::Idle;
        }
        let elapsed = self.elapsed_ms();
        if self.raw_fraction(elapsed) >= 1.0 {
            self.run_started_at = None;
            self.accumulated_ms = elapsed;
            self.progress = 1.0;
            self.completed = true;
            self.looping = false;
            trace!(elapsed_ms = elapsed, duration_ms = self.duration_ms, "timer completed");
            return TimerTick::Completed;
        }
        self.publish(elapsed);
        TimerTick::Progress(self.progress)
    }

    /// Elapsed milliseconds in the current run.
    #[must_use]
    pub fn elapsed_ms(&self) -> f64 {
        let running = self
            .run_started_at
            .map_or(0.0, |started_at| millis_between(started_at, self.clock.now()));
        self.accumulated_ms + running
    }

    /// Progress published by the most recent update, in `[0, 1]`.
    #[must_use]
    pub fn progress(&self) -> f64 {
        self.progress
    }

    /// Whether the timer is paused.
    #[must_use]
    pub fn is_paused(&self) -> bool {
        self.paused
    }

    /// Whether the current run has fired its completion.
    #[must_use]
    pub fn is_completed(&self) -> bool {
        self.completed
    }

    /// Current duration denominator in milliseconds.
    #[must_use]
    pub fn duration_ms(&self) -> u64 {
        self.duration_ms
    }

    /// Whether the owner should keep scheduling frames.
    #[must_use]
    pub fn needs_frame(&self) -> bool {
        self.looping
    }

    fn restart_loop(&mut self) {
        self.loop_id += 1;
        self.looping = true;
    }

    #[allow(clippy::cast_precision_loss)]
    fn raw_fraction(&self, elapsed_ms: f64) -> f64 {
        elapsed_ms / self.duration_ms as f64
    }

    fn publish(&mut self, elapsed_ms: f64) {
        let fraction = self.raw_fraction(elapsed_ms).clamp(0.0, 1.0);
        if fraction > self.progress {
            self.progress = fraction;
        }
    }
}
