//! Callbacks from the engine to its host.

use stories_core::model::PlaybackPosition;
use stories_gesture::SwipeDirection;

/// Receives the engine's outward notifications.
pub trait EngineObserver: Send + Sync {
    /// A position settled and is now playing. Used for route sync.
    fn on_position_change(&self, position: PlaybackPosition, story_id: &str);

    /// The viewer closed. Called once per session.
    fn on_close(&self);

    /// Horizontal drag feedback for presentation only.
    fn on_drag_progress(&self, _progress: f64, _direction: SwipeDirection) {}
}

/// Ignores every notification.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopObserver;

impl EngineObserver for NoopObserver {
    fn on_position_change(&self, _position: PlaybackPosition, _story_id: &str) {}

    fn on_close(&self) {}
}
