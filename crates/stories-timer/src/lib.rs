//! Stories — playback timer.
//!
//! A pausable elapsed-time clock that publishes normalized progress for the
//! active story item and signals completion once per run.

pub mod timer;

pub use timer::{PlaybackTimer, TimerTick};
