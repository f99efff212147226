//! Events reported by the navigation state machine.
//!
//! The machine never calls out; the composition root turns these into
//! observer notifications, preload batches and component lifecycle calls.

use serde::Serialize;
use stories_core::model::PlaybackPosition;
use uuid::Uuid;

use super::phase::ViewerPhase;

/// Something observable that happened inside the state machine.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum NavigationEvent {
    /// A session began at the resolved position.
    Opened {
        /// The new session.
        session_id: Uuid,
        /// Where the session opened.
        position: PlaybackPosition,
    },
    /// The lifecycle phase changed.
    PhaseChanged {
        /// The new phase.
        phase: ViewerPhase,
    },
    /// A position settled and is now playing.
    PositionChanged {
        /// The settled position.
        position: PlaybackPosition,
    },
    /// The item at `position` became active.
    ItemActivated {
        /// The activated item's position.
        position: PlaybackPosition,
    },
    /// The item at `position` stopped being active.
    ItemDeactivated {
        /// The deactivated item's position.
        position: PlaybackPosition,
    },
    /// These positions should be preloaded.
    PreloadRequested {
        /// Positions in priority order.
        positions: Vec<PlaybackPosition>,
    },
    /// The overall pause state flipped.
    PauseChanged {
        /// Whether playback is now held.
        paused: bool,
    },
    /// The active item failed to load and will be skipped.
    LoadFailed {
        /// The failed item's position.
        position: PlaybackPosition,
    },
    /// The session ended. Emitted once per session.
    Closed {
        /// The ended session.
        session_id: Uuid,
    },
}

impl NavigationEvent {
    /// The type name for this event (for logging).
    #[must_use]
    pub fn event_type(&self) -> &'static str {
        match self {
            Self::Opened { .. } => "navigation.opened",
            Self::PhaseChanged { .. } => "navigation.phase_changed",
            Self::PositionChanged { .. } => "navigation.position_changed",
            Self::ItemActivated { .. } => "navigation.item_activated",
            Self::ItemDeactivated { .. } => "navigation.item_deactivated",
            Self::PreloadRequested { .. } => "navigation.preload_requested",
            Self::PauseChanged { .. } => "navigation.pause_changed",
            Self::LoadFailed { .. } => "navigation.load_failed",
            Self::Closed { .. } => "navigation.closed",
        }
    }
}
