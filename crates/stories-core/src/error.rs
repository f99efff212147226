//! Error types shared by the playback crates.

use thiserror::Error;

/// Top-level error type for the story playback engine.
///
/// None of these cross the public open/navigate boundary; callers absorb them
/// into state transitions. The type is `Clone` so a single failed fetch can
/// be handed to every waiter of a deduplicated request.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum StoryError {
    /// An image or video asset failed to load or decode.
    #[error("failed to load asset {url}: {reason}")]
    AssetLoad {
        /// The asset URL.
        url: String,
        /// What went wrong.
        reason: String,
    },

    /// A requested position lies outside the dataset.
    #[error("position ({user_index}, {story_index}) is out of bounds")]
    PositionOutOfBounds {
        /// The requested user index.
        user_index: usize,
        /// The requested story index.
        story_index: usize,
    },

    /// No user in the dataset has a story to show.
    #[error("dataset contains no playable stories")]
    NoPlayableStories,

    /// A story identifier did not match any story.
    #[error("story not found: {0}")]
    StoryNotFound(String),

    /// An invalid configuration value.
    #[error("configuration error: {0}")]
    Config(String),

    /// A dataset could not be read or parsed.
    #[error("dataset error: {0}")]
    Dataset(String),
}

impl StoryError {
    /// Convenience constructor for asset failures.
    pub fn asset_load(url: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::AssetLoad {
            url: url.into(),
            reason: reason.into(),
        }
    }
}
