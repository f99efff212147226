//! Pause multiplexer.
//!
//! Every reason to hold playback is tracked separately; the timer runs only
//! when none is held. Page visibility therefore cannot resume something the
//! user paused, and releasing a touch cannot resume a hidden page.

use std::collections::BTreeSet;

use serde::Serialize;
use stories_core::command::PauseSource;

/// The set of currently held pause sources.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct PauseState {
    held: BTreeSet<PauseSource>,
}

impl PauseState {
    /// Holds playback for `source`. Returns whether the overall state changed.
    pub fn hold(&mut self, source: PauseSource) -> bool {
        let was_paused = self.is_paused();
        self.held.insert(source);
        was_paused != self.is_paused()
    }

    /// Releases `source`. Returns whether the overall state changed.
    pub fn release(&mut self, source: PauseSource) -> bool {
        let was_paused = self.is_paused();
        self.held.remove(&source);
        was_paused != self.is_paused()
    }

    /// Whether `source` is currently held.
    #[must_use]
    pub fn is_held(&self, source: PauseSource) -> bool {
        self.held.contains(&source)
    }

    /// Whether any source is held.
    #[must_use]
    pub fn is_paused(&self) -> bool {
        !self.held.is_empty()
    }

    /// Drops every source tied to an open session. Page visibility survives.
    pub fn clear_session_sources(&mut self) {
        self.held.retain(|source| *source == PauseSource::Hidden);
    }
}
