//! Integration tests for pointer input.

mod common;

use std::sync::Arc;

use stories_core::clock::Clock;
use stories_core::model::PlaybackPosition;
use stories_gesture::{PointerEvent, SwipeDirection};
use stories_test_support::{RecordingFetcher, users_fixture};

#[tokio::test(start_paused = true)]
async fn test_taps_navigate_by_surface_half() {
    // Arrange
    let (mut engine, observer, clock) =
        common::build_engine(users_fixture(1, 3), Arc::new(RecordingFetcher::new()));
    engine.open(0, None);
    common::elapse(&mut engine, 1_500).await;

    // Act
    common::tap(&mut engine, &clock, 900.0);
    common::tap(&mut engine, &clock, 100.0);

    // Assert
    assert_eq!(
        observer.positions(),
        vec![
            PlaybackPosition::new(0, 0),
            PlaybackPosition::new(0, 1),
            PlaybackPosition::new(0, 0),
        ]
    );
    assert!(!engine.render_state().is_paused);
}

#[tokio::test(start_paused = true)]
async fn test_swipe_left_switches_to_next_user() {
    // Arrange
    let (mut engine, observer, clock) =
        common::build_engine(users_fixture(2, 3), Arc::new(RecordingFetcher::new()));
    engine.open(0, Some(1));
    common::elapse(&mut engine, 1_500).await;

    // Act
    common::swipe(&mut engine, &clock, -80.0);
    common::elapse(&mut engine, 1_000).await;
    common::elapse(&mut engine, 150).await;

    // Assert
    assert_eq!(
        observer.positions(),
        vec![PlaybackPosition::new(0, 1), PlaybackPosition::new(1, 0)]
    );
    let drags = observer.drags();
    assert!(!drags.is_empty());
    assert!(drags.iter().all(|(_, direction)| *direction == SwipeDirection::Left));
}

#[tokio::test(start_paused = true)]
async fn test_downward_drag_dismisses_once() {
    // Arrange
    let (mut engine, observer, clock) =
        common::build_engine(users_fixture(1, 3), Arc::new(RecordingFetcher::new()));
    engine.open(0, None);
    common::elapse(&mut engine, 1_500).await;
    let at = clock.now();

    // Act
    engine.handle_pointer(&PointerEvent::down(500.0, 300.0, at));
    engine.handle_pointer(&PointerEvent::moved(502.0, 360.0, at));
    engine.handle_pointer(&PointerEvent::up(502.0, 400.0, at));
    engine.close();

    // Assert
    assert_eq!(observer.closes(), 1);
    assert!(!engine.is_open());
}

#[tokio::test(start_paused = true)]
async fn test_long_press_holds_playback_until_release() {
    // Arrange
    let (mut engine, observer, clock) =
        common::build_engine(users_fixture(1, 2), Arc::new(RecordingFetcher::new()));
    engine.open(0, None);
    common::elapse(&mut engine, 1_500).await;

    // Act
    engine.handle_pointer(&PointerEvent::down(500.0, 400.0, clock.now()));
    common::elapse(&mut engine, 600).await;
    common::elapse(&mut engine, 10_000).await;
    let held = engine.render_state();
    engine.handle_pointer(&PointerEvent::up(500.0, 400.0, clock.now()));

    // Assert
    assert!(held.is_paused);
    assert!(held.progress < 0.01);
    assert_eq!(observer.positions(), vec![PlaybackPosition::new(0, 0)]);
    assert!(!engine.render_state().is_paused);
}

#[tokio::test(start_paused = true)]
async fn test_hover_pause_is_independent_of_contact() {
    // Arrange
    let (mut engine, _observer, clock) =
        common::build_engine(users_fixture(1, 3), Arc::new(RecordingFetcher::new()));
    engine.open(0, None);
    common::elapse(&mut engine, 1_500).await;

    // Act
    engine.pointer_enter();
    common::tap(&mut engine, &clock, 900.0);
    let after_tap = engine.render_state();
    engine.pointer_leave();

    // Assert
    assert!(after_tap.is_paused);
    assert!(!engine.render_state().is_paused);
}
