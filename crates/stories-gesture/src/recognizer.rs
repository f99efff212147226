//! Gesture state machine: `idle -> tracking -> {tap | swipe | dismiss |
//! long press} -> idle`.
//!
//! Every `ContactStarted` is paired with exactly one `ContactReleased`, so
//! callers can hold playback for the duration of a contact without tracking
//! the classification themselves.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use stories_core::clock::{after_millis, millis_between};
use stories_core::config::GestureConfig;
use tracing::trace;

use crate::pointer::{PointerEvent, PointerPhase, PointerTarget, SurfaceBounds};

/// Which half of the surface a tap landed on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TapSide {
    /// Left half: previous story.
    Left,
    /// Right half: next story.
    Right,
}

/// Horizontal direction the finger travelled.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SwipeDirection {
    /// Finger moved left.
    Left,
    /// Finger moved right.
    Right,
}

/// Classified output of the recognizer.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum GestureEvent {
    /// A contact began on the surface.
    ContactStarted,
    /// Horizontal drag feedback: travel over viewport width, in `[0, 1]`.
    DragProgress {
        /// Normalized travel.
        progress: f64,
        /// Direction of travel.
        direction: SwipeDirection,
    },
    /// A short, still contact.
    Tap {
        /// The half of the surface that was tapped.
        side: TapSide,
    },
    /// A completed horizontal swipe.
    Swipe {
        /// Direction of travel.
        direction: SwipeDirection,
    },
    /// A downward swipe asking to close the viewer.
    Dismiss,
    /// The contact has been held still past the long-press delay.
    LongPressStarted,
    /// A long-pressed contact was lifted.
    LongPressReleased,
    /// The contact ended, however it was classified.
    ContactReleased {
        /// Whether the contact moved beyond the jitter threshold.
        dragged: bool,
    },
}

#[derive(Debug, Clone, Copy)]
struct Sample {
    x: f64,
    y: f64,
    at: DateTime<Utc>,
}

impl From<&PointerEvent> for Sample {
    fn from(event: &PointerEvent) -> Self {
        Self {
            x: event.x,
            y: event.y,
            at: event.at,
        }
    }
}

#[derive(Debug)]
struct Contact {
    origin: Sample,
    last: Sample,
    previous: Option<Sample>,
    long_press_due: Option<DateTime<Utc>>,
    long_pressed: bool,
    dragged: bool,
    dragging_horizontally: bool,
}

/// Classifies a single active pointer or touch contact.
#[derive(Debug)]
pub struct GestureRecognizer {
    config: GestureConfig,
    surface: SurfaceBounds,
    contact: Option<Contact>,
}

impl GestureRecognizer {
    /// Creates an idle recognizer.
    #[must_use]
    pub fn new(config: GestureConfig, surface: SurfaceBounds) -> Self {
        Self {
            config,
            surface,
            contact: None,
        }
    }

    /// Updates the surface bounding box (after layout or resize).
    pub fn set_surface(&mut self, surface: SurfaceBounds) {
        self.surface = surface;
    }

    /// Current surface bounding box.
    #[must_use]
    pub fn surface(&self) -> SurfaceBounds {
        self.surface
    }

    /// Whether a contact is being tracked.
    #[must_use]
    pub fn is_tracking(&self) -> bool {
        self.contact.is_some()
    }

    /// When the armed long-press timer expires, if one is armed.
    #[must_use]
    pub fn next_deadline(&self) -> Option<DateTime<Utc>> {
        self.contact.as_ref().and_then(|c| c.long_press_due)
    }

    /// Fires the long press if its timer has expired by `now`.
    pub fn poll(&mut self, now: DateTime<Utc>) -> Option<GestureEvent> {
        let contact = self.contact.as_mut()?;
        match contact.long_press_due {
            Some(due) if due <= now => {
                contact.long_press_due = None;
                contact.long_pressed = true;
                trace!("long press started");
                Some(GestureEvent::LongPressStarted)
            }
            _ => None,
        }
    }

    /// Feeds one raw sample and returns the events it produces, in order.
    pub fn handle(&mut self, event: &PointerEvent) -> Vec<GestureEvent> {
        let mut events = Vec::new();
        if event.phase != PointerPhase::Down {
            events.extend(self.poll(event.at));
        }
        match event.phase {
            PointerPhase::Down => self.on_down(event, &mut events),
            PointerPhase::Move => self.on_move(event, &mut events),
            PointerPhase::Up => self.on_up(event, &mut events),
            PointerPhase::Cancel => {
                if let Some(contact) = self.contact.take() {
                    events.push(GestureEvent::ContactReleased {
                        dragged: contact.dragged,
                    });
                }
            }
        }
        events
    }

    fn on_down(&mut self, event: &PointerEvent, events: &mut Vec<GestureEvent>) {
        // Embedded controls keep their own interaction; a second finger is
        // not a new gesture.
        if event.target == PointerTarget::Control || self.contact.is_some() {
            return;
        }
        let origin = Sample::from(event);
        self.contact = Some(Contact {
            origin,
            last: origin,
            previous: None,
            long_press_due: Some(after_millis(event.at, self.config.long_press_ms)),
            long_pressed: false,
            dragged: false,
            dragging_horizontally: false,
        });
        events.push(GestureEvent::ContactStarted);
    }

    fn on_move(&mut self, event: &PointerEvent, events: &mut Vec<GestureEvent>) {
        let jitter = self.config.jitter_px;
        let dismiss_distance = self.config.dismiss_distance_px;
        let width = self.surface.width;
        let Some(contact) = self.contact.as_mut() else {
            return;
        };
        contact.previous = Some(contact.last);
        contact.last = Sample::from(event);
        if contact.long_pressed {
            return;
        }

        let dx = event.x - contact.origin.x;
        let dy = event.y - contact.origin.y;
        if !contact.dragged && (dx.abs() > jitter || dy.abs() > jitter) {
            contact.dragged = true;
            contact.long_press_due = None;
        }
        if !contact.dragged {
            return;
        }

        if !contact.dragging_horizontally && dy.abs() > dx.abs() && dy > dismiss_distance {
            trace!(dy, "dismiss gesture");
            self.contact = None;
            events.push(GestureEvent::Dismiss);
            events.push(GestureEvent::ContactReleased { dragged: true });
            return;
        }

        if contact.dragging_horizontally || dx.abs() >= dy.abs() {
            contact.dragging_horizontally = true;
            let progress = if width > 0.0 {
                (dx.abs() / width).clamp(0.0, 1.0)
            } else {
                0.0
            };
            events.push(GestureEvent::DragProgress {
                progress,
                direction: direction_of(dx),
            });
        }
    }

    fn on_up(&mut self, event: &PointerEvent, events: &mut Vec<GestureEvent>) {
        let Some(contact) = self.contact.take() else {
            return;
        };
        if contact.long_pressed {
            events.push(GestureEvent::LongPressReleased);
            events.push(GestureEvent::ContactReleased { dragged: false });
            return;
        }

        let release = Sample::from(event);
        let dx = release.x - contact.origin.x;
        let dy = release.y - contact.origin.y;
        let held_ms = millis_between(contact.origin.at, release.at);
        let jitter = self.config.jitter_px;
        let within_jitter = dx.abs() <= jitter && dy.abs() <= jitter;

        #[allow(clippy::cast_precision_loss)]
        let tap_window = self.config.tap_max_ms as f64;
        if within_jitter && held_ms < tap_window {
            let side = if release.x < self.surface.midpoint_x() {
                TapSide::Left
            } else {
                TapSide::Right
            };
            events.push(GestureEvent::Tap { side });
        } else if dx.abs() > jitter && dx.abs() >= dy.abs() {
            let velocity = release_velocity(&contact, release);
            if dx.abs() > self.config.swipe_distance_px
                || velocity.abs() > self.config.swipe_velocity_px_per_ms
            {
                events.push(GestureEvent::Swipe {
                    direction: direction_of(dx),
                });
            } else {
                trace!(dx, velocity, "horizontal drag discarded");
            }
        } else if dy.abs() > dx.abs() && dy > self.config.dismiss_distance_px {
            events.push(GestureEvent::Dismiss);
        } else {
            trace!(dx, dy, held_ms, "gesture discarded");
        }
        events.push(GestureEvent::ContactReleased {
            dragged: contact.dragged || !within_jitter,
        });
    }
}

fn direction_of(dx: f64) -> SwipeDirection {
    if dx < 0.0 {
        SwipeDirection::Left
    } else {
        SwipeDirection::Right
    }
}

/// Horizontal velocity in px/ms between the release and the most recent
/// earlier sample.
fn release_velocity(contact: &Contact, release: Sample) -> f64 {
    [Some(contact.last), contact.previous, Some(contact.origin)]
        .into_iter()
        .flatten()
        .find(|sample| sample.at < release.at)
        .map_or(0.0, |sample| {
            (release.x - sample.x) / millis_between(sample.at, release.at)
        })
}
