//! Keyboard surface.

use serde::{Deserialize, Serialize};
use stories_core::command::NavigationCommand;

/// Keys the viewer reacts to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Key {
    /// Previous story.
    ArrowLeft,
    /// Next story.
    ArrowRight,
    /// Toggle pause.
    Space,
    /// Close the viewer.
    Escape,
}

impl Key {
    /// Parses a DOM-style key name. Unknown keys yield `None`.
    #[must_use]
    pub fn from_name(name: &str) -> Option<Self> {
        match name {
            "ArrowLeft" => Some(Self::ArrowLeft),
            "ArrowRight" => Some(Self::ArrowRight),
            " " | "Space" | "Spacebar" => Some(Self::Space),
            "Escape" | "Esc" => Some(Self::Escape),
            _ => None,
        }
    }

    /// The command bound to this key.
    #[must_use]
    pub fn command(self) -> NavigationCommand {
        match self {
            Self::ArrowLeft => NavigationCommand::Retreat,
            Self::ArrowRight => NavigationCommand::Advance,
            Self::Space => NavigationCommand::TogglePause,
            Self::Escape => NavigationCommand::Close,
        }
    }
}
