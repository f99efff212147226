//! Raw pointer input.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Lifecycle phase of a pointer or touch contact.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PointerPhase {
    /// Contact started.
    Down,
    /// Contact moved.
    Move,
    /// Contact lifted.
    Up,
    /// The platform took the contact away.
    Cancel,
}

/// What the contact started on.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PointerTarget {
    /// The story surface itself.
    #[default]
    Surface,
    /// An interactive control inside embedded content (button, input, ...).
    Control,
}

/// One raw pointer sample in surface-independent client coordinates.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PointerEvent {
    /// Contact phase.
    pub phase: PointerPhase,
    /// Client x coordinate in pixels.
    pub x: f64,
    /// Client y coordinate in pixels.
    pub y: f64,
    /// When the sample was taken.
    pub at: DateTime<Utc>,
    /// What the contact started on.
    #[serde(default)]
    pub target: PointerTarget,
}

impl PointerEvent {
    /// A contact start on the story surface.
    #[must_use]
    pub fn down(x: f64, y: f64, at: DateTime<Utc>) -> Self {
        Self::new(PointerPhase::Down, x, y, at)
    }

    /// A contact move.
    #[must_use]
    pub fn moved(x: f64, y: f64, at: DateTime<Utc>) -> Self {
        Self::new(PointerPhase::Move, x, y, at)
    }

    /// A contact release.
    #[must_use]
    pub fn up(x: f64, y: f64, at: DateTime<Utc>) -> Self {
        Self::new(PointerPhase::Up, x, y, at)
    }

    /// A contact cancellation.
    #[must_use]
    pub fn cancel(x: f64, y: f64, at: DateTime<Utc>) -> Self {
        Self::new(PointerPhase::Cancel, x, y, at)
    }

    /// Marks the sample as originating on an interactive control.
    #[must_use]
    pub fn on_control(mut self) -> Self {
        self.target = PointerTarget::Control;
        self
    }

    fn new(phase: PointerPhase, x: f64, y: f64, at: DateTime<Utc>) -> Self {
        Self {
            phase,
            x,
            y,
            at,
            target: PointerTarget::Surface,
        }
    }
}

/// Bounding box of the interactive story surface.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SurfaceBounds {
    /// Left edge in client pixels.
    pub left: f64,
    /// Top edge in client pixels.
    pub top: f64,
    /// Width in pixels; also the viewport width used for drag progress.
    pub width: f64,
    /// Height in pixels.
    pub height: f64,
}

impl SurfaceBounds {
    /// Creates bounds anchored at the origin.
    #[must_use]
    pub fn sized(width: f64, height: f64) -> Self {
        Self {
            left: 0.0,
            top: 0.0,
            width,
            height,
        }
    }

    /// Horizontal midpoint used to split taps into left and right halves.
    #[must_use]
    pub fn midpoint_x(&self) -> f64 {
        self.left + self.width / 2.0
    }
}

impl Default for SurfaceBounds {
    fn default() -> Self {
        Self::sized(390.0, 844.0)
    }
}
