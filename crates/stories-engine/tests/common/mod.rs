//! Shared test helpers for engine integration tests.
#![allow(dead_code)]

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use stories_core::clock::{Clock, after_millis};
use stories_core::config::EngineConfig;
use stories_core::fetcher::AssetFetcher;
use stories_core::model::{PlaybackControls, PlaybackPosition, StoryComponent, User};
use stories_engine::clock::TokioClock;
use stories_engine::{EngineObserver, PlaybackEngine};
use stories_gesture::{PointerEvent, SurfaceBounds, SwipeDirection};

/// Surface used by every pointer test: taps left of x=500 go back.
pub const SURFACE: SurfaceBounds = SurfaceBounds {
    left: 0.0,
    top: 0.0,
    width: 1000.0,
    height: 800.0,
};

/// Records every observer callback.
#[derive(Debug, Default)]
pub struct RecordingObserver {
    positions: Mutex<Vec<(PlaybackPosition, String)>>,
    closes: Mutex<usize>,
    drags: Mutex<Vec<(f64, SwipeDirection)>>,
}

impl RecordingObserver {
    pub fn positions(&self) -> Vec<PlaybackPosition> {
        self.positions
            .lock()
            .unwrap()
            .iter()
            .map(|(position, _)| *position)
            .collect()
    }

    pub fn story_ids(&self) -> Vec<String> {
        self.positions
            .lock()
            .unwrap()
            .iter()
            .map(|(_, id)| id.clone())
            .collect()
    }

    pub fn closes(&self) -> usize {
        *self.closes.lock().unwrap()
    }

    pub fn drags(&self) -> Vec<(f64, SwipeDirection)> {
        self.drags.lock().unwrap().clone()
    }
}

impl EngineObserver for RecordingObserver {
    fn on_position_change(&self, position: PlaybackPosition, story_id: &str) {
        self.positions
            .lock()
            .unwrap()
            .push((position, story_id.to_owned()));
    }

    fn on_close(&self) {
        *self.closes.lock().unwrap() += 1;
    }

    fn on_drag_progress(&self, progress: f64, direction: SwipeDirection) {
        self.drags.lock().unwrap().push((progress, direction));
    }
}

/// A component that keeps the controls it was handed.
#[derive(Default)]
pub struct CapturingComponent {
    controls: Mutex<Option<Arc<dyn PlaybackControls>>>,
    deactivated: AtomicBool,
}

impl CapturingComponent {
    pub fn controls(&self) -> Arc<dyn PlaybackControls> {
        self.controls.lock().unwrap().clone().unwrap()
    }

    pub fn was_deactivated(&self) -> bool {
        self.deactivated.load(Ordering::SeqCst)
    }
}

impl std::fmt::Debug for CapturingComponent {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CapturingComponent")
            .field("deactivated", &self.was_deactivated())
            .finish_non_exhaustive()
    }
}

impl StoryComponent for CapturingComponent {
    fn activate(&self, controls: Arc<dyn PlaybackControls>) {
        *self.controls.lock().unwrap() = Some(controls);
    }

    fn deactivate(&self) {
        self.deactivated.store(true, Ordering::SeqCst);
    }
}

/// Engine with a Tokio-driven clock; run tests with a paused runtime.
pub fn build_engine(
    users: Vec<User>,
    fetcher: Arc<dyn AssetFetcher>,
) -> (PlaybackEngine, Arc<RecordingObserver>, Arc<TokioClock>) {
    let observer = Arc::new(RecordingObserver::default());
    let clock = Arc::new(TokioClock::new());
    let mut engine = PlaybackEngine::new(
        users,
        EngineConfig::default(),
        clock.clone(),
        fetcher,
        observer.clone(),
    );
    engine.set_surface(SURFACE);
    (engine, observer, clock)
}

/// Advances paused Tokio time by `ms`, letting background work run, then
/// ticks the engine once.
pub async fn elapse(engine: &mut PlaybackEngine, ms: u64) {
    tokio::time::advance(Duration::from_millis(ms)).await;
    settle_background().await;
    engine.tick();
}

/// Lets spawned preload tasks run to completion.
pub async fn settle_background() {
    for _ in 0..8 {
        tokio::task::yield_now().await;
    }
}

/// A quick, still contact at `x`.
pub fn tap(engine: &mut PlaybackEngine, clock: &TokioClock, x: f64) {
    let at = clock.now();
    engine.handle_pointer(&PointerEvent::down(x, 400.0, at));
    engine.handle_pointer(&PointerEvent::up(x, 400.0, after_millis(at, 100)));
}

/// A horizontal drag from the surface centre by `dx` pixels.
pub fn swipe(engine: &mut PlaybackEngine, clock: &TokioClock, dx: f64) {
    let at = clock.now();
    engine.handle_pointer(&PointerEvent::down(500.0, 400.0, at));
    engine.handle_pointer(&PointerEvent::moved(500.0 + dx / 2.0, 402.0, after_millis(at, 50)));
    engine.handle_pointer(&PointerEvent::moved(500.0 + dx, 404.0, after_millis(at, 100)));
    engine.handle_pointer(&PointerEvent::up(500.0 + dx, 404.0, after_millis(at, 400)));
}
