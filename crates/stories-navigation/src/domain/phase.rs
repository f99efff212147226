//! Viewer lifecycle phases.

use serde::Serialize;
use stories_core::command::Direction;
use stories_core::model::PlaybackPosition;

/// Where the viewer is in its open/transition lifecycle.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(tag = "phase", rename_all = "snake_case")]
pub enum ViewerPhase {
    /// Not showing.
    #[default]
    Closed,
    /// Just opened; the first item is loading and input is ignored.
    OpenLoading,
    /// Showing the active item with the timer running or paused.
    Playing,
    /// Leaving the current user; loading indicator is up.
    UserLoading {
        /// Direction of travel.
        direction: Direction,
        /// Position that will settle when the transition ends.
        target: PlaybackPosition,
    },
    /// Sliding towards the target user.
    UserTransitioning {
        /// Direction of travel.
        direction: Direction,
        /// Position that will settle when the transition ends.
        target: PlaybackPosition,
    },
}

impl ViewerPhase {
    /// Whether position-changing input is accepted.
    #[must_use]
    pub fn accepts_navigation(self) -> bool {
        matches!(self, Self::Playing)
    }

    /// Whether a loading indicator should be shown.
    #[must_use]
    pub fn is_loading(self) -> bool {
        matches!(self, Self::OpenLoading | Self::UserLoading { .. })
    }

    /// The presentational transition this phase maps to.
    #[must_use]
    pub fn transition(self) -> TransitionState {
        match self {
            Self::Closed | Self::OpenLoading | Self::Playing => TransitionState::Idle,
            Self::UserLoading { .. } => TransitionState::UserLoading,
            Self::UserTransitioning {
                direction: Direction::Forward,
                ..
            } => TransitionState::SlidingLeft,
            Self::UserTransitioning {
                direction: Direction::Backward,
                ..
            } => TransitionState::SlidingRight,
        }
    }
}

/// Cross-user transition state as the presentation layer sees it.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum TransitionState {
    /// No transition.
    #[default]
    Idle,
    /// Loading indicator before the slide.
    UserLoading,
    /// Content slides left, towards the next user.
    SlidingLeft,
    /// Content slides right, towards the previous user.
    SlidingRight,
}
