//! Integration tests for component content and its playback controls.

mod common;

use std::sync::Arc;
use std::time::Duration;

use common::CapturingComponent;
use stories_core::model::PlaybackPosition;
use stories_test_support::{RecordingFetcher, component_item, image_item, user};

fn dataset(component: &Arc<CapturingComponent>) -> Vec<stories_core::model::User> {
    vec![user(
        "a",
        vec![
            component_item("poll", component.clone()),
            image_item("after"),
            image_item("last"),
        ],
    )]
}

#[tokio::test(start_paused = true)]
async fn test_component_controls_advance_playback() {
    // Arrange
    let component = Arc::new(CapturingComponent::default());
    let (mut engine, observer, _clock) =
        common::build_engine(dataset(&component), Arc::new(RecordingFetcher::new()));
    engine.open(0, None);
    common::elapse(&mut engine, 1_500).await;

    // Act
    let controls = component.controls();
    controls.next();
    engine.tick();

    // Assert
    assert_eq!(
        observer.positions(),
        vec![PlaybackPosition::new(0, 0), PlaybackPosition::new(0, 1)]
    );
    assert!(component.was_deactivated());
}

#[tokio::test(start_paused = true)]
async fn test_controls_of_inactive_component_are_ignored() {
    // Arrange
    let component = Arc::new(CapturingComponent::default());
    let (mut engine, observer, _clock) =
        common::build_engine(dataset(&component), Arc::new(RecordingFetcher::new()));
    engine.open(0, None);
    common::elapse(&mut engine, 1_500).await;
    let controls = component.controls();
    controls.next();
    engine.tick();

    // Act
    controls.next();
    controls.pause();
    engine.tick();

    // Assert
    assert_eq!(observer.positions().len(), 2);
    assert!(!engine.render_state().is_paused);
}

#[tokio::test(start_paused = true)]
async fn test_component_pause_and_duration_control_the_timer() {
    // Arrange
    let component = Arc::new(CapturingComponent::default());
    let (mut engine, observer, _clock) =
        common::build_engine(dataset(&component), Arc::new(RecordingFetcher::new()));
    engine.open(0, None);
    common::elapse(&mut engine, 1_500).await;
    let controls = component.controls();

    // Act
    controls.set_duration(20_000);
    controls.pause();
    engine.tick();
    common::elapse(&mut engine, 30_000).await;
    let while_paused = observer.positions().len();
    controls.resume();
    engine.tick();
    common::elapse(&mut engine, 10_000).await;

    // Assert
    assert_eq!(while_paused, 1);
    assert_eq!(observer.positions().len(), 1);
    let progress = engine.render_state().progress;
    assert!((progress - 0.5).abs() < 0.01, "progress was {progress}");
}

#[tokio::test(start_paused = true)]
async fn test_run_idles_while_paused_until_component_resumes() {
    // Arrange
    let component = Arc::new(CapturingComponent::default());
    let (mut engine, observer, _clock) =
        common::build_engine(dataset(&component), Arc::new(RecordingFetcher::new()));
    engine.open(0, None);
    common::elapse(&mut engine, 1_500).await;
    let controls = component.controls();
    controls.pause();
    engine.tick();
    let while_paused = (engine.needs_frame(), engine.next_deadline());
    let started = tokio::time::Instant::now();
    tokio::spawn(async move {
        tokio::time::sleep(Duration::from_secs(60)).await;
        controls.resume();
    });

    // Act
    engine.run().await;

    // Assert
    assert_eq!(while_paused, (false, None));
    assert!(started.elapsed() >= Duration::from_secs(60));
    assert_eq!(observer.positions().len(), 3);
    assert_eq!(observer.closes(), 1);
}
