//! Shared test mocks and utilities for the story playback engine.

mod clock;
mod fetcher;
mod fixtures;

pub use clock::ManualClock;
pub use fetcher::{FailingFetcher, RecordingFetcher};
pub use fixtures::{component_item, image_item, text_item, user, users_fixture, video_item};
