//! The playback engine composition root.
//!
//! Owns one navigation state machine, one gesture recognizer and one shared
//! preload cache. Inputs are translated into navigation commands; the events
//! the state machine reports are turned into observer callbacks, component
//! activation and background preload batches.

use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use stories_core::clock::{Clock, millis_between};
use stories_core::command::{Direction, NavigationCommand, PauseSource};
use stories_core::config::EngineConfig;
use stories_core::fetcher::AssetFetcher;
use stories_core::model::{PlaybackControls, PlaybackPosition, StoryComponent, StoryItem, User};
use stories_gesture::{
    GestureEvent, GestureRecognizer, PointerEvent, SurfaceBounds, SwipeDirection, TapSide,
};
use stories_navigation::{NavigationEvent, NavigationStateMachine, RenderState, ViewportHost};
use stories_preload::PreloadCache;
use tokio::sync::mpsc;
use tokio::time::MissedTickBehavior;
use tracing::{debug, info, instrument, warn};

use crate::controls::{ControlAction, ControlRequest, Controls};
use crate::keyboard::Key;
use crate::observer::EngineObserver;
use crate::routing::find_story_indices;

/// The command a classified gesture stands for, if any.
///
/// Drag feedback and long-press notifications carry no command: the contact
/// hold already pauses playback for as long as the pointer is down.
#[must_use]
pub fn command_for_gesture(event: GestureEvent) -> Option<NavigationCommand> {
    match event {
        GestureEvent::ContactStarted => Some(NavigationCommand::Pause(PauseSource::Contact)),
        GestureEvent::ContactReleased { .. } => {
            Some(NavigationCommand::Resume(PauseSource::Contact))
        }
        GestureEvent::Tap {
            side: TapSide::Left,
        } => Some(NavigationCommand::Retreat),
        GestureEvent::Tap {
            side: TapSide::Right,
        } => Some(NavigationCommand::Advance),
        GestureEvent::Swipe {
            direction: SwipeDirection::Left,
        } => Some(NavigationCommand::SwitchUser(Direction::Forward)),
        GestureEvent::Swipe {
            direction: SwipeDirection::Right,
        } => Some(NavigationCommand::SwitchUser(Direction::Backward)),
        GestureEvent::Dismiss => Some(NavigationCommand::Close),
        GestureEvent::DragProgress { .. }
        | GestureEvent::LongPressStarted
        | GestureEvent::LongPressReleased => None,
    }
}

/// Headless story playback engine.
pub struct PlaybackEngine {
    navigation: NavigationStateMachine,
    gestures: GestureRecognizer,
    preload: Arc<PreloadCache>,
    observer: Arc<dyn EngineObserver>,
    clock: Arc<dyn Clock>,
    control_tx: mpsc::UnboundedSender<ControlRequest>,
    control_rx: mpsc::UnboundedReceiver<ControlRequest>,
    active_component: Option<(PlaybackPosition, Arc<dyn StoryComponent>)>,
}

impl std::fmt::Debug for PlaybackEngine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PlaybackEngine")
            .field("navigation", &self.navigation)
            .field("gestures", &self.gestures)
            .field("preload", &self.preload)
            .finish_non_exhaustive()
    }
}

impl PlaybackEngine {
    /// Creates a closed engine over `users`.
    #[must_use]
    pub fn new(
        users: Vec<User>,
        config: EngineConfig,
        clock: Arc<dyn Clock>,
        fetcher: Arc<dyn AssetFetcher>,
        observer: Arc<dyn EngineObserver>,
    ) -> Self {
        let (control_tx, control_rx) = mpsc::unbounded_channel();
        let gestures = GestureRecognizer::new(config.gestures.clone(), SurfaceBounds::default());
        let preload = Arc::new(PreloadCache::new(fetcher, config.preload.concurrency));
        Self {
            navigation: NavigationStateMachine::new(users, config, Arc::clone(&clock)),
            gestures,
            preload,
            observer,
            clock,
            control_tx,
            control_rx,
            active_component: None,
        }
    }

    /// Locks `viewport` scrolling while the viewer is open.
    #[must_use]
    pub fn with_viewport(mut self, viewport: Arc<dyn ViewportHost>) -> Self {
        self.navigation = self.navigation.with_viewport(viewport);
        self
    }

    /// Sets the interactive surface used for tap sides and drag feedback.
    pub fn set_surface(&mut self, surface: SurfaceBounds) {
        self.gestures.set_surface(surface);
    }

    /// The navigation state machine.
    #[must_use]
    pub fn navigation(&self) -> &NavigationStateMachine {
        &self.navigation
    }

    /// The shared preload cache.
    #[must_use]
    pub fn preload_cache(&self) -> &Arc<PreloadCache> {
        &self.preload
    }

    /// Whether the viewer is open.
    #[must_use]
    pub fn is_open(&self) -> bool {
        self.navigation.is_open()
    }

    /// A snapshot for the presentation layer.
    #[must_use]
    pub fn render_state(&self) -> RenderState {
        self.navigation.render_state()
    }

    /// Opens the viewer. Never fails: an unplayable request leaves the
    /// viewer closed.
    #[instrument(skip(self))]
    pub fn open(&mut self, user_index: usize, story_index: Option<usize>) {
        let events = self.navigation.open(user_index, story_index);
        self.apply(events);
    }

    /// Opens the viewer at the story with `story_id`. Returns whether the
    /// viewer is open afterwards.
    pub fn open_story_id(&mut self, story_id: &str) -> bool {
        match find_story_indices(self.navigation.users(), story_id) {
            Some(position) => {
                self.open(position.user_index, Some(position.story_index));
                self.is_open()
            }
            None => {
                warn!(story_id, "unknown story id, viewer stays closed");
                false
            }
        }
    }

    /// An avatar in the strip was activated.
    pub fn on_avatar_activated(&mut self, user_index: usize) {
        info!(user_index, "avatar activated");
        self.open(user_index, Some(0));
    }

    /// Closes the viewer. Idempotent.
    pub fn close(&mut self) {
        let events = self.navigation.close();
        self.apply(events);
    }

    /// Applies a navigation command.
    pub fn dispatch(&mut self, command: NavigationCommand) {
        let events = self.navigation.dispatch(command);
        self.apply(events);
    }

    /// Handles a key press. Keys are only bound while the viewer is open;
    /// returns whether the key was consumed.
    pub fn handle_key(&mut self, key: Key) -> bool {
        if !self.is_open() {
            return false;
        }
        self.dispatch(key.command());
        true
    }

    /// Feeds one raw pointer sample.
    ///
    /// The recognizer sees every sample so a contact that outlives the
    /// viewer is still tracked to its end.
    pub fn handle_pointer(&mut self, event: &PointerEvent) {
        for gesture in self.gestures.handle(event) {
            self.apply_gesture(gesture);
        }
    }

    /// The pointer entered the surface.
    pub fn pointer_enter(&mut self) {
        self.dispatch(NavigationCommand::Pause(PauseSource::Hover));
    }

    /// The pointer left the surface.
    pub fn pointer_leave(&mut self) {
        self.dispatch(NavigationCommand::Resume(PauseSource::Hover));
    }

    /// Page visibility changed.
    pub fn set_page_visible(&mut self, visible: bool) {
        let events = self.navigation.set_page_visible(visible);
        self.apply(events);
    }

    /// A renderer discovered the duration of its media.
    pub fn report_duration(&mut self, position: PlaybackPosition, duration_ms: u64) {
        self.navigation.report_duration(position, duration_ms);
    }

    /// A renderer failed to load its asset.
    pub fn report_load_error(&mut self, position: PlaybackPosition) {
        let events = self.navigation.report_load_error(position);
        self.apply(events);
    }

    /// A video renderer started or stopped buffering.
    pub fn set_buffering(&mut self, position: PlaybackPosition, buffering: bool) {
        let events = self.navigation.set_buffering(position, buffering);
        self.apply(events);
    }

    /// Whether the next display frame has timer work to do.
    #[must_use]
    pub fn needs_frame(&self) -> bool {
        self.navigation.needs_frame()
    }

    /// The earliest pending phase or long-press deadline.
    #[must_use]
    pub fn next_deadline(&self) -> Option<DateTime<Utc>> {
        match (self.navigation.next_deadline(), self.gestures.next_deadline()) {
            (Some(phase), Some(press)) => Some(phase.min(press)),
            (phase, press) => phase.or(press),
        }
    }

    /// Closes the viewer and drops every cached asset.
    pub fn shutdown(&mut self) {
        self.close();
        self.preload.clear();
        info!("engine shut down");
    }

    /// Runs one display frame: queued component requests, long-press
    /// expiry, due phase deadlines and the timer.
    pub fn tick(&mut self) {
        self.drain_control_requests();
        if let Some(gesture) = self.gestures.poll(self.clock.now()) {
            self.apply_gesture(gesture);
        }
        let events = self.navigation.poll();
        self.apply(events);
    }

    /// Drives the engine until the viewer closes.
    ///
    /// Ticks once per configured frame interval while the timer runs.
    /// Otherwise sleeps until the next deadline or the next component
    /// control request, whichever comes first.
    #[instrument(skip(self), fields(session_id = ?self.navigation.session_id()))]
    pub async fn run(&mut self) {
        let frame_ms = self.navigation.config().timing.frame_interval_ms.max(1);
        let mut frames = tokio::time::interval(Duration::from_millis(frame_ms));
        frames.set_missed_tick_behavior(MissedTickBehavior::Skip);
        while self.is_open() {
            if self.needs_frame() {
                frames.tick().await;
                self.tick();
                continue;
            }
            let wait = self
                .next_deadline()
                .map(|due| millis_between(self.clock.now(), due));
            debug!(?wait, "no frame needed, idling");
            let request = tokio::select! {
                () = idle(wait) => None,
                request = self.control_rx.recv() => request,
            };
            if let Some(request) = request {
                self.apply_control_request(request);
            }
            self.tick();
            frames.reset();
        }
        debug!("frame loop stopped");
    }

    fn apply_gesture(&mut self, gesture: GestureEvent) {
        match gesture {
            GestureEvent::DragProgress {
                progress,
                direction,
            } if self.is_open() => self.observer.on_drag_progress(progress, direction),
            GestureEvent::LongPressStarted | GestureEvent::LongPressReleased => {
                debug!(?gesture, "long press");
            }
            _ => {
                if let Some(command) = command_for_gesture(gesture) {
                    self.dispatch(command);
                }
            }
        }
    }

    fn apply(&mut self, events: Vec<NavigationEvent>) {
        for event in events {
            debug!(event = event.event_type(), "navigation event");
            match event {
                NavigationEvent::PositionChanged { position } => {
                    if let Some(item) = position.item_in(self.navigation.users()) {
                        self.observer.on_position_change(position, &item.id);
                    }
                }
                NavigationEvent::ItemActivated { position } => self.activate_component(position),
                NavigationEvent::ItemDeactivated { position } => {
                    self.deactivate_component(Some(position));
                }
                NavigationEvent::PreloadRequested { positions } => self.spawn_preload(&positions),
                NavigationEvent::Closed { .. } => {
                    self.deactivate_component(None);
                    self.observer.on_close();
                }
                NavigationEvent::Opened { .. }
                | NavigationEvent::PhaseChanged { .. }
                | NavigationEvent::PauseChanged { .. }
                | NavigationEvent::LoadFailed { .. } => {}
            }
        }
    }

    fn activate_component(&mut self, position: PlaybackPosition) {
        let Some(component) = position
            .item_in(self.navigation.users())
            .and_then(StoryItem::component)
            .cloned()
        else {
            return;
        };
        let controls: Arc<dyn PlaybackControls> =
            Arc::new(Controls::new(position, self.control_tx.clone()));
        component.activate(controls);
        debug!(%position, "component activated");
        self.active_component = Some((position, component));
    }

    /// Deactivates the active component, if it sits at `position` (or
    /// anywhere, for `None`).
    fn deactivate_component(&mut self, position: Option<PlaybackPosition>) {
        let matches = self
            .active_component
            .as_ref()
            .is_some_and(|(active, _)| position.is_none_or(|position| position == *active));
        if !matches {
            return;
        }
        if let Some((active, component)) = self.active_component.take() {
            component.deactivate();
            debug!(position = %active, "component deactivated");
        }
    }

    fn drain_control_requests(&mut self) {
        while let Ok(request) = self.control_rx.try_recv() {
            self.apply_control_request(request);
        }
    }

    fn apply_control_request(&mut self, request: ControlRequest) {
        let active = self.active_component.as_ref().map(|(position, _)| *position);
        if active != Some(request.position) {
            debug!(
                position = %request.position,
                action = ?request.action,
                "stale control request dropped"
            );
            return;
        }
        match request.action {
            ControlAction::Pause => {
                self.dispatch(NavigationCommand::Pause(PauseSource::Manual));
            }
            ControlAction::Resume => {
                self.dispatch(NavigationCommand::Resume(PauseSource::Manual));
            }
            ControlAction::Next => self.dispatch(NavigationCommand::Advance),
            ControlAction::Prev => self.dispatch(NavigationCommand::Retreat),
            ControlAction::SetDuration { ms } => {
                self.navigation.report_duration(request.position, ms);
            }
        }
    }

    fn spawn_preload(&self, positions: &[PlaybackPosition]) {
        let items: Vec<StoryItem> = positions
            .iter()
            .filter_map(|position| position.item_in(self.navigation.users()))
            .filter(|item| {
                item.asset()
                    .is_some_and(|asset| !self.preload.is_preloaded(&asset.url))
            })
            .cloned()
            .collect();
        if items.is_empty() {
            return;
        }
        let Ok(runtime) = tokio::runtime::Handle::try_current() else {
            debug!(items = items.len(), "no runtime, preload skipped");
            return;
        };
        let cache = Arc::clone(&self.preload);
        runtime.spawn(async move {
            let report = cache.preload_batch(&items).await;
            debug!(?report, "preload batch settled");
        });
    }
}

/// Sleeps `wait_ms`, or forever when nothing is scheduled.
async fn idle(wait_ms: Option<f64>) {
    match wait_ms {
        Some(ms) => tokio::time::sleep(Duration::from_secs_f64(ms / 1000.0)).await,
        None => std::future::pending().await,
    }
}
