//! Navigation command vocabulary.
//!
//! Keyboard keys, classified gestures and embedded-content controls are all
//! translated into these commands before they reach the state machine.

use serde::{Deserialize, Serialize};

/// Direction of a cross-user move.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Direction {
    /// Towards higher user indices.
    Forward,
    /// Towards lower user indices.
    Backward,
}

/// Independent reasons playback may be held.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PauseSource {
    /// Explicit pause from the keyboard or an embedded component.
    Manual,
    /// A pointer or touch contact is held on the surface.
    Contact,
    /// The pointer hovers over the surface.
    Hover,
    /// The page is hidden.
    Hidden,
    /// The active video is buffering.
    Buffering,
}

/// A request to the navigation state machine.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NavigationCommand {
    /// Next story, crossing into the next user when needed.
    Advance,
    /// Previous story, crossing into the previous user when needed.
    Retreat,
    /// Jump to the adjacent user's first story.
    SwitchUser(Direction),
    /// Hold playback for the given reason.
    Pause(PauseSource),
    /// Release the hold for the given reason.
    Resume(PauseSource),
    /// Flip the manual pause.
    TogglePause,
    /// Close the viewer.
    Close,
}

impl NavigationCommand {
    /// The type name for this command (for logging).
    #[must_use]
    pub fn command_type(&self) -> &'static str {
        match self {
            Self::Advance => "navigation.advance",
            Self::Retreat => "navigation.retreat",
            Self::SwitchUser(_) => "navigation.switch_user",
            Self::Pause(_) => "navigation.pause",
            Self::Resume(_) => "navigation.resume",
            Self::TogglePause => "navigation.toggle_pause",
            Self::Close => "navigation.close",
        }
    }
}
