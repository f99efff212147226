//! Story identifier resolution for URL synchronization.
//!
//! The presentation layer mirrors the active story into a route. These
//! helpers map between that identifier and a playback position.

use stories_core::error::StoryError;
use stories_core::model::{PlaybackPosition, User};

/// The position of the story with `story_id`, if any.
#[must_use]
pub fn find_story_indices(users: &[User], story_id: &str) -> Option<PlaybackPosition> {
    users.iter().enumerate().find_map(|(user_index, user)| {
        user.stories
            .iter()
            .position(|story| story.id == story_id)
            .map(|story_index| PlaybackPosition::new(user_index, story_index))
    })
}

/// Like [`find_story_indices`], for callers that propagate errors.
///
/// # Errors
///
/// Returns `StoryError::StoryNotFound` if no story has `story_id`.
pub fn resolve_story(users: &[User], story_id: &str) -> Result<PlaybackPosition, StoryError> {
    find_story_indices(users, story_id)
        .ok_or_else(|| StoryError::StoryNotFound(story_id.to_owned()))
}

/// The identifier of the story at `(user_index, story_index)`.
///
/// # Errors
///
/// Returns `StoryError::PositionOutOfBounds` if the position is not inside
/// the dataset.
pub fn story_id_at(
    users: &[User],
    user_index: usize,
    story_index: usize,
) -> Result<&str, StoryError> {
    PlaybackPosition::new(user_index, story_index)
        .item_in(users)
        .map(|item| item.id.as_str())
        .ok_or(StoryError::PositionOutOfBounds {
            user_index,
            story_index,
        })
}

#[cfg(test)]
mod tests {
    use stories_test_support::users_fixture;

    use super::*;

    #[test]
    fn test_find_story_indices_locates_story() {
        let users = users_fixture(3, 2);

        assert_eq!(
            find_story_indices(&users, "u2-s1"),
            Some(PlaybackPosition::new(2, 1))
        );
        assert_eq!(find_story_indices(&users, "missing"), None);
    }

    #[test]
    fn test_resolve_story_reports_unknown_id() {
        let users = users_fixture(1, 1);

        let result = resolve_story(&users, "nope");

        assert_eq!(result, Err(StoryError::StoryNotFound("nope".to_owned())));
    }

    #[test]
    fn test_story_id_at_round_trips_with_find() {
        let users = users_fixture(2, 3);

        let id = story_id_at(&users, 1, 2).unwrap();

        assert_eq!(id, "u1-s2");
        assert_eq!(find_story_indices(&users, id), Some(PlaybackPosition::new(1, 2)));
        assert_eq!(
            story_id_at(&users, 4, 0),
            Err(StoryError::PositionOutOfBounds {
                user_index: 4,
                story_index: 0
            })
        );
    }
}
