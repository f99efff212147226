//! Story data model.
//!
//! Users and their story items are supplied wholesale when the engine is
//! mounted and are never mutated by it. Insertion order is playback order.

use std::fmt;
use std::sync::Arc;

use serde::{Deserialize, Serialize};

/// A user owning an ordered sequence of story items.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct User {
    /// User identifier.
    pub id: String,
    /// Display handle.
    #[serde(alias = "username")]
    pub handle: String,
    /// Avatar image reference.
    #[serde(alias = "avatarUrl")]
    pub avatar_url: String,
    /// Stories in playback order.
    #[serde(default)]
    pub stories: Vec<StoryItem>,
    /// Whether the user has stories the viewer has not seen.
    #[serde(default, alias = "hasUnreadStories")]
    pub has_unread: bool,
}

impl User {
    /// A user with no stories cannot be navigated to.
    #[must_use]
    pub fn is_navigable(&self) -> bool {
        !self.stories.is_empty()
    }
}

/// One timed unit of content belonging to a user.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StoryItem {
    /// Story identifier, unique across the dataset.
    pub id: String,
    /// Explicit duration in milliseconds.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub duration_ms: Option<u64>,
    /// Optional caption.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub caption: Option<String>,
    /// Optional alt text.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub alt: Option<String>,
    /// Variant-specific content.
    #[serde(flatten)]
    pub content: StoryContent,
}

/// Variant payload of a story item.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum StoryContent {
    /// A still image.
    Image {
        /// Image URL.
        src: String,
    },
    /// A video whose duration is discovered from its metadata unless given.
    Video {
        /// Video URL.
        src: String,
    },
    /// Styled text.
    Text {
        /// Body text.
        body: String,
        /// Background color.
        #[serde(default, skip_serializing_if = "Option::is_none")]
        background_color: Option<String>,
        /// Text color.
        #[serde(default, skip_serializing_if = "Option::is_none")]
        text_color: Option<String>,
    },
    /// Consumer-supplied interactive content driven through playback controls.
    Component {
        /// Key identifying the component to the presentation layer.
        key: String,
        /// The mounted component, if one was attached in code.
        #[serde(skip)]
        component: Option<Arc<dyn StoryComponent>>,
    },
}

/// The kind of network asset a story item references.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AssetKind {
    /// Loaded once decoded.
    Image,
    /// Loaded once enough is buffered to play through.
    Video,
}

/// An asset URL plus the kind of load it needs.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct AssetRequest {
    /// Asset URL, also the cache key.
    pub url: String,
    /// How the asset is considered loaded.
    pub kind: AssetKind,
}

impl StoryItem {
    /// The network asset this item needs, if any. Text and component items
    /// need none.
    #[must_use]
    pub fn asset(&self) -> Option<AssetRequest> {
        match &self.content {
            StoryContent::Image { src } => Some(AssetRequest {
                url: src.clone(),
                kind: AssetKind::Image,
            }),
            StoryContent::Video { src } => Some(AssetRequest {
                url: src.clone(),
                kind: AssetKind::Video,
            }),
            StoryContent::Text { .. } | StoryContent::Component { .. } => None,
        }
    }

    /// Explicit duration if present and non-zero, otherwise `default_ms`.
    ///
    /// For a video without an explicit duration this is only provisional;
    /// the true length arrives later through duration discovery.
    #[must_use]
    pub fn resolved_duration_ms(&self, default_ms: u64) -> u64 {
        self.duration_ms.filter(|ms| *ms > 0).unwrap_or(default_ms)
    }

    /// Whether the item's duration must be discovered from media metadata.
    #[must_use]
    pub fn discovers_duration(&self) -> bool {
        self.duration_ms.is_none() && matches!(self.content, StoryContent::Video { .. })
    }

    /// The attached component, for component items.
    #[must_use]
    pub fn component(&self) -> Option<&Arc<dyn StoryComponent>> {
        match &self.content {
            StoryContent::Component { component, .. } => component.as_ref(),
            _ => None,
        }
    }
}

/// Playback capability handed to embedded component content.
pub trait PlaybackControls: Send + Sync {
    /// Pause playback.
    fn pause(&self);
    /// Resume playback.
    fn resume(&self);
    /// Advance to the next story.
    fn next(&self);
    /// Go back to the previous story.
    fn prev(&self);
    /// Replace the active story's duration.
    fn set_duration(&self, ms: u64);
}

/// Consumer-supplied interactive story content.
///
/// The engine knows nothing about what a component does; it only hands it
/// the controls when its item becomes active.
pub trait StoryComponent: fmt::Debug + Send + Sync {
    /// Called when the owning item becomes the active story.
    fn activate(&self, controls: Arc<dyn PlaybackControls>);

    /// Called when the owning item stops being the active story.
    fn deactivate(&self) {}
}

/// The (user, story) pair that identifies what is showing.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct PlaybackPosition {
    /// Index into the user list.
    pub user_index: usize,
    /// Index into that user's stories.
    pub story_index: usize,
}

impl PlaybackPosition {
    /// Creates a position.
    #[must_use]
    pub const fn new(user_index: usize, story_index: usize) -> Self {
        Self {
            user_index,
            story_index,
        }
    }

    /// The item at this position, if it is in bounds.
    #[must_use]
    pub fn item_in(self, users: &[User]) -> Option<&StoryItem> {
        users
            .get(self.user_index)
            .and_then(|user| user.stories.get(self.story_index))
    }

    /// Whether this position addresses an existing item.
    #[must_use]
    pub fn is_within(self, users: &[User]) -> bool {
        self.item_in(users).is_some()
    }
}

impl fmt::Display for PlaybackPosition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}, {})", self.user_index, self.story_index)
    }
}
