//! Stories — playback engine.
//!
//! Wires the gesture recognizer, the navigation state machine and the
//! preload cache together behind one surface that a presentation layer (or
//! the headless demo) drives with pointer samples, keys and display frames.

pub mod clock;
pub mod controls;
pub mod dataset;
pub mod engine;
pub mod fetcher;
pub mod keyboard;
pub mod observer;
pub mod routing;

pub use engine::PlaybackEngine;
pub use observer::{EngineObserver, NoopObserver};
