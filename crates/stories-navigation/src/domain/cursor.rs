//! Position arithmetic over the user/story grid.
//!
//! Users without stories are never a valid position; every function here
//! skips them.

use stories_core::model::{PlaybackPosition, User};

/// The nearest navigable user after `user_index`.
#[must_use]
pub fn next_navigable_user(users: &[User], user_index: usize) -> Option<usize> {
    users
        .iter()
        .enumerate()
        .skip(user_index.saturating_add(1))
        .find(|(_, user)| user.is_navigable())
        .map(|(index, _)| index)
}

/// The nearest navigable user before `user_index`.
#[must_use]
pub fn previous_navigable_user(users: &[User], user_index: usize) -> Option<usize> {
    users
        .iter()
        .enumerate()
        .take(user_index.min(users.len()))
        .rev()
        .find(|(_, user)| user.is_navigable())
        .map(|(index, _)| index)
}

/// Resolves an open request to a playable position.
///
/// An out-of-range story index falls back to the user's first story. A user
/// without stories falls forward to the next navigable user, then backward.
/// Returns `None` when no user has any stories.
#[must_use]
pub fn resolve_open_position(
    users: &[User],
    user_index: usize,
    story_index: Option<usize>,
) -> Option<PlaybackPosition> {
    if let Some(user) = users.get(user_index).filter(|user| user.is_navigable()) {
        let story_index = story_index
            .filter(|index| *index < user.stories.len())
            .unwrap_or(0);
        return Some(PlaybackPosition::new(user_index, story_index));
    }
    let fallback = next_navigable_user(users, user_index)
        .or_else(|| previous_navigable_user(users, user_index))?;
    Some(PlaybackPosition::new(fallback, 0))
}

/// Positions worth preloading around `position`.
///
/// The `neighbors` nearest stories of the current user, alternating after
/// then before, followed by the first story of the next and previous
/// navigable users.
#[must_use]
pub fn lookahead_positions(
    users: &[User],
    position: PlaybackPosition,
    neighbors: usize,
) -> Vec<PlaybackPosition> {
    let Some(user) = users.get(position.user_index) else {
        return Vec::new();
    };
    let story_count = user.stories.len();
    let mut positions = Vec::with_capacity(neighbors + 2);

    let mut distance = 1;
    while positions.len() < neighbors && distance < story_count {
        let after = position.story_index + distance;
        if after < story_count {
            positions.push(PlaybackPosition::new(position.user_index, after));
        }
        if positions.len() < neighbors
            && let Some(before) = position.story_index.checked_sub(distance)
        {
            positions.push(PlaybackPosition::new(position.user_index, before));
        }
        distance += 1;
    }

    if let Some(next) = next_navigable_user(users, position.user_index) {
        positions.push(PlaybackPosition::new(next, 0));
    }
    if let Some(previous) = previous_navigable_user(users, position.user_index) {
        positions.push(PlaybackPosition::new(previous, 0));
    }
    positions
}
