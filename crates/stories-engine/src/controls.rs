//! Playback controls handed to component content.
//!
//! A component receives a [`Controls`] bound to the position it was
//! activated at. Requests are queued on a channel and applied by the engine
//! on its next frame; requests from a component that is no longer active are
//! dropped there.

use serde::Serialize;
use stories_core::model::{PlaybackControls, PlaybackPosition};
use tokio::sync::mpsc;
use tracing::debug;

/// What a component asked for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "action", rename_all = "snake_case")]
pub enum ControlAction {
    /// Hold playback.
    Pause,
    /// Release the hold.
    Resume,
    /// Next story.
    Next,
    /// Previous story.
    Prev,
    /// Replace the active story's duration.
    SetDuration {
        /// New duration in milliseconds.
        ms: u64,
    },
}

/// A control action tagged with the position of the issuing component.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ControlRequest {
    /// Where the issuing component was activated.
    pub position: PlaybackPosition,
    /// The requested action.
    pub action: ControlAction,
}

/// The capability object given to one activated component.
#[derive(Debug, Clone)]
pub struct Controls {
    position: PlaybackPosition,
    requests: mpsc::UnboundedSender<ControlRequest>,
}

impl Controls {
    /// Binds a capability to `position`.
    #[must_use]
    pub fn new(
        position: PlaybackPosition,
        requests: mpsc::UnboundedSender<ControlRequest>,
    ) -> Self {
        Self { position, requests }
    }

    fn send(&self, action: ControlAction) {
        let request = ControlRequest {
            position: self.position,
            action,
        };
        if self.requests.send(request).is_err() {
            debug!(position = %self.position, ?action, "engine gone, control request dropped");
        }
    }
}

impl PlaybackControls for Controls {
    fn pause(&self) {
        self.send(ControlAction::Pause);
    }

    fn resume(&self) {
        self.send(ControlAction::Resume);
    }

    fn next(&self) {
        self.send(ControlAction::Next);
    }

    fn prev(&self) {
        self.send(ControlAction::Prev);
    }

    fn set_duration(&self, ms: u64) {
        self.send(ControlAction::SetDuration { ms });
    }
}
