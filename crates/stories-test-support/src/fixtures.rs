//! Dataset builders for tests.

use std::sync::Arc;

use stories_core::model::{StoryComponent, StoryContent, StoryItem, User};

/// An image item whose URL is derived from its id.
#[must_use]
pub fn image_item(id: &str) -> StoryItem {
    StoryItem {
        id: id.to_owned(),
        duration_ms: None,
        caption: None,
        alt: None,
        content: StoryContent::Image {
            src: format!("https://cdn.test/{id}.jpg"),
        },
    }
}

/// A video item without an explicit duration.
#[must_use]
pub fn video_item(id: &str) -> StoryItem {
    StoryItem {
        content: StoryContent::Video {
            src: format!("https://cdn.test/{id}.mp4"),
        },
        ..image_item(id)
    }
}

/// A text item with an explicit duration.
#[must_use]
pub fn text_item(id: &str, duration_ms: u64) -> StoryItem {
    StoryItem {
        duration_ms: Some(duration_ms),
        content: StoryContent::Text {
            body: format!("text {id}"),
            background_color: None,
            text_color: None,
        },
        ..image_item(id)
    }
}

/// A component item with the given component mounted.
#[must_use]
pub fn component_item(id: &str, component: Arc<dyn StoryComponent>) -> StoryItem {
    StoryItem {
        content: StoryContent::Component {
            key: id.to_owned(),
            component: Some(component),
        },
        ..image_item(id)
    }
}

/// A user with the given stories.
#[must_use]
pub fn user(id: &str, stories: Vec<StoryItem>) -> User {
    User {
        id: id.to_owned(),
        handle: format!("@{id}"),
        avatar_url: format!("https://cdn.test/{id}.png"),
        stories,
        has_unread: true,
    }
}

/// `users` users with `stories_per_user` image stories each. Story ids are
/// `u{user}-s{story}`.
#[must_use]
pub fn users_fixture(users: usize, stories_per_user: usize) -> Vec<User> {
    (0..users)
        .map(|u| {
            let stories = (0..stories_per_user)
                .map(|s| image_item(&format!("u{u}-s{s}")))
                .collect();
            user(&format!("u{u}"), stories)
        })
        .collect()
}
