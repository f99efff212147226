//! Stories — gesture recognition.
//!
//! Turns a single active pointer or touch contact into tap, swipe, dismiss
//! and long-press events, plus continuous drag feedback. The recognizer is
//! pure: it never reads a clock, every input carries its own timestamp, and
//! long-press expiry is observed through [`GestureRecognizer::poll`].

pub mod pointer;
pub mod recognizer;

pub use pointer::{PointerEvent, PointerPhase, PointerTarget, SurfaceBounds};
pub use recognizer::{GestureEvent, GestureRecognizer, SwipeDirection, TapSide};
