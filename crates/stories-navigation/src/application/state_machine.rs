//! The navigation state machine.
//!
//! Every public operation returns the events it produced; nothing is thrown
//! across this boundary. Delayed phases (initial load, user loading, slide
//! settle, load-error skip) are stored as a single deadline on the session
//! and fired by [`NavigationStateMachine::poll`] once the clock passes it.

use std::collections::HashMap;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::Serialize;
use stories_core::clock::{Clock, after_millis};
use stories_core::command::{Direction, NavigationCommand, PauseSource};
use stories_core::config::EngineConfig;
use stories_core::model::{PlaybackPosition, StoryItem, User};
use stories_timer::{PlaybackTimer, TimerTick};
use tracing::{debug, info, instrument, warn};
use uuid::Uuid;

use crate::domain::cursor::{
    lookahead_positions, next_navigable_user, previous_navigable_user, resolve_open_position,
};
use crate::domain::environment::{NoopViewport, ScrollLock, ViewportHost};
use crate::domain::events::NavigationEvent;
use crate::domain::pause::PauseState;
use crate::domain::phase::{TransitionState, ViewerPhase};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ScheduledAction {
    FinishOpenLoading,
    BeginSlide,
    Settle,
    SkipFailedItem,
}

#[derive(Debug, Clone, Copy)]
struct Scheduled {
    due: DateTime<Utc>,
    action: ScheduledAction,
}

#[derive(Debug)]
struct Session {
    id: Uuid,
    position: PlaybackPosition,
    phase: ViewerPhase,
    scheduled: Option<Scheduled>,
    /// Durations discovered from media metadata during this session.
    discovered: HashMap<PlaybackPosition, u64>,
    /// A load error reported for the position about to settle.
    pending_failure: Option<PlaybackPosition>,
    _scroll: ScrollLock,
}

impl Session {
    /// The position that is showing, or will be once the current phase ends.
    fn settling_position(&self) -> PlaybackPosition {
        match self.phase {
            ViewerPhase::UserLoading { target, .. }
            | ViewerPhase::UserTransitioning { target, .. } => target,
            _ => self.position,
        }
    }
}

/// Everything the presentation layer needs for one frame.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RenderState {
    /// The open session, if any.
    pub session_id: Option<Uuid>,
    /// Lifecycle phase.
    pub phase: ViewerPhase,
    /// Current position while open.
    pub position: Option<PlaybackPosition>,
    /// Cross-user transition for animation.
    pub transition: TransitionState,
    /// Whether a loading indicator is up.
    pub is_loading: bool,
    /// Whether any pause source is held.
    pub is_paused: bool,
    /// Progress of the active item in `[0, 1]`.
    pub progress: f64,
    /// One fill value per story of the current user.
    pub progress_bars: Vec<f64>,
    /// Live-region summary of what is showing.
    pub announcement: Option<String>,
}

/// Owns the position, the timer, the pause multiplexer and the open session.
pub struct NavigationStateMachine {
    users: Arc<[User]>,
    config: EngineConfig,
    clock: Arc<dyn Clock>,
    viewport: Arc<dyn ViewportHost>,
    timer: PlaybackTimer,
    pause: PauseState,
    session: Option<Session>,
}

impl std::fmt::Debug for NavigationStateMachine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("NavigationStateMachine")
            .field("users", &self.users.len())
            .field("timer", &self.timer)
            .field("pause", &self.pause)
            .field("session", &self.session)
            .finish_non_exhaustive()
    }
}

impl NavigationStateMachine {
    /// Creates a closed machine over `users`.
    #[must_use]
    pub fn new(users: impl Into<Arc<[User]>>, config: EngineConfig, clock: Arc<dyn Clock>) -> Self {
        let timer = PlaybackTimer::new(Arc::clone(&clock), config.timing.default_duration_ms);
        Self {
            users: users.into(),
            config,
            clock,
            viewport: Arc::new(NoopViewport),
            timer,
            pause: PauseState::default(),
            session: None,
        }
    }

    /// Locks `viewport` scrolling for the lifetime of each session.
    #[must_use]
    pub fn with_viewport(mut self, viewport: Arc<dyn ViewportHost>) -> Self {
        self.viewport = viewport;
        self
    }

    /// The dataset.
    #[must_use]
    pub fn users(&self) -> &[User] {
        &self.users
    }

    /// The active configuration.
    #[must_use]
    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// The current lifecycle phase.
    #[must_use]
    pub fn phase(&self) -> ViewerPhase {
        self.session
            .as_ref()
            .map_or(ViewerPhase::Closed, |session| session.phase)
    }

    /// Whether a session is open.
    #[must_use]
    pub fn is_open(&self) -> bool {
        self.session.is_some()
    }

    /// The current position while open.
    #[must_use]
    pub fn position(&self) -> Option<PlaybackPosition> {
        self.session.as_ref().map(|session| session.position)
    }

    /// The open session's identifier.
    #[must_use]
    pub fn session_id(&self) -> Option<Uuid> {
        self.session.as_ref().map(|session| session.id)
    }

    /// The item at the current position.
    #[must_use]
    pub fn current_item(&self) -> Option<&StoryItem> {
        self.position()?.item_in(&self.users)
    }

    /// Whether any pause source is held.
    #[must_use]
    pub fn is_paused(&self) -> bool {
        self.pause.is_paused()
    }

    /// The pause multiplexer.
    #[must_use]
    pub fn pause_state(&self) -> &PauseState {
        &self.pause
    }

    /// The playback timer.
    #[must_use]
    pub fn timer(&self) -> &PlaybackTimer {
        &self.timer
    }

    /// Whether the active item's timer is running and wants display frames.
    #[must_use]
    pub fn needs_frame(&self) -> bool {
        self.phase() == ViewerPhase::Playing && self.timer.needs_frame()
    }

    /// When the pending phase deadline or failed-item skip falls due.
    #[must_use]
    pub fn next_deadline(&self) -> Option<DateTime<Utc>> {
        self.session.as_ref()?.scheduled.map(|scheduled| scheduled.due)
    }

    /// Opens the viewer at `(user_index, story_index)`.
    ///
    /// Reopening while open discards the previous session without a close
    /// notification. Opening on a user without stories moves to the nearest
    /// playable user; if there is none the viewer stays closed.
    #[instrument(skip(self), fields(users = self.users.len()))]
    pub fn open(&mut self, user_index: usize, story_index: Option<usize>) -> Vec<NavigationEvent> {
        let mut events = Vec::new();
        if let Some(previous) = self.session.take() {
            debug!(session_id = %previous.id, "discarding previous session");
            if previous.phase == ViewerPhase::Playing {
                events.push(NavigationEvent::ItemDeactivated {
                    position: previous.position,
                });
            }
        }
        self.timer.stop();
        self.pause.clear_session_sources();

        let Some(position) = resolve_open_position(&self.users, user_index, story_index) else {
            warn!(user_index, "no user has playable stories, viewer stays closed");
            return events;
        };
        if position.user_index != user_index {
            warn!(
                user_index,
                fallback_user_index = position.user_index,
                "requested user has no stories, opening nearest playable user"
            );
        }

        let now = self.clock.now();
        let session_id = Uuid::new_v4();
        self.session = Some(Session {
            id: session_id,
            position,
            phase: ViewerPhase::OpenLoading,
            scheduled: Some(Scheduled {
                due: after_millis(now, self.config.timing.initial_load_ms),
                action: ScheduledAction::FinishOpenLoading,
            }),
            discovered: HashMap::new(),
            pending_failure: None,
            _scroll: ScrollLock::acquire(Arc::clone(&self.viewport)),
        });
        info!(
            %session_id,
            user_index = position.user_index,
            story_index = position.story_index,
            "viewer opened"
        );

        events.push(NavigationEvent::Opened {
            session_id,
            position,
        });
        events.push(NavigationEvent::PhaseChanged {
            phase: ViewerPhase::OpenLoading,
        });
        events.push(NavigationEvent::PreloadRequested {
            positions: vec![position],
        });
        self.run_due_actions(&mut events);
        events
    }

    /// Applies a command.
    pub fn dispatch(&mut self, command: NavigationCommand) -> Vec<NavigationEvent> {
        debug!(command = command.command_type(), "dispatching command");
        match command {
            NavigationCommand::Advance => self.advance(),
            NavigationCommand::Retreat => self.retreat(),
            NavigationCommand::SwitchUser(direction) => self.switch_user(direction),
            NavigationCommand::Pause(source) => self.pause(source),
            NavigationCommand::Resume(source) => self.resume(source),
            NavigationCommand::TogglePause => self.toggle_pause(),
            NavigationCommand::Close => self.close(),
        }
    }

    /// Moves to the next story, crossing into the next playable user after
    /// the last one, and closing after the very last story.
    pub fn advance(&mut self) -> Vec<NavigationEvent> {
        let mut events = self.advance_step();
        self.run_due_actions(&mut events);
        events
    }

    /// Moves to the previous story, crossing into the previous playable
    /// user's last story before the first one. No-op at the very first story.
    pub fn retreat(&mut self) -> Vec<NavigationEvent> {
        let Some(position) = self.playing_position() else {
            return Vec::new();
        };
        let mut events = if let Some(story_index) = position.story_index.checked_sub(1) {
            self.settle_at(PlaybackPosition::new(position.user_index, story_index))
        } else if let Some(previous) = previous_navigable_user(&self.users, position.user_index) {
            let last = self.story_count(previous).saturating_sub(1);
            self.begin_user_transition(Direction::Backward, PlaybackPosition::new(previous, last))
        } else {
            debug!("already at the first story");
            Vec::new()
        };
        self.run_due_actions(&mut events);
        events
    }

    /// Jumps to the first story of the adjacent playable user. Switching
    /// forward past the last user closes the viewer; switching backward
    /// before the first is a no-op.
    pub fn switch_user(&mut self, direction: Direction) -> Vec<NavigationEvent> {
        let Some(position) = self.playing_position() else {
            return Vec::new();
        };
        let target = match direction {
            Direction::Forward => next_navigable_user(&self.users, position.user_index),
            Direction::Backward => previous_navigable_user(&self.users, position.user_index),
        };
        let mut events = match (target, direction) {
            (Some(user_index), _) => {
                self.begin_user_transition(direction, PlaybackPosition::new(user_index, 0))
            }
            (None, Direction::Forward) => {
                info!("switched past the last user");
                self.close()
            }
            (None, Direction::Backward) => {
                debug!("already at the first user");
                Vec::new()
            }
        };
        self.run_due_actions(&mut events);
        events
    }

    /// Closes the viewer. Idempotent: only the first call of a session
    /// reports `Closed`.
    pub fn close(&mut self) -> Vec<NavigationEvent> {
        let Some(session) = self.session.take() else {
            debug!("viewer already closed");
            return Vec::new();
        };
        let mut events = Vec::new();
        if session.phase == ViewerPhase::Playing {
            events.push(NavigationEvent::ItemDeactivated {
                position: session.position,
            });
        }
        self.timer.stop();
        self.pause.clear_session_sources();
        info!(
            session_id = %session.id,
            user_index = session.position.user_index,
            story_index = session.position.story_index,
            "viewer closed"
        );
        let session_id = session.id;
        drop(session);

        events.push(NavigationEvent::PhaseChanged {
            phase: ViewerPhase::Closed,
        });
        events.push(NavigationEvent::Closed { session_id });
        events
    }

    /// Holds playback for `source`. Only page visibility is tracked while
    /// closed.
    pub fn pause(&mut self, source: PauseSource) -> Vec<NavigationEvent> {
        if self.session.is_none() && source != PauseSource::Hidden {
            return Vec::new();
        }
        let changed = self.pause.hold(source);
        self.sync_timer();
        self.pause_events(changed)
    }

    /// Releases the hold for `source`. Playback resumes only when no other
    /// source is held.
    pub fn resume(&mut self, source: PauseSource) -> Vec<NavigationEvent> {
        if self.session.is_none() && source != PauseSource::Hidden {
            return Vec::new();
        }
        let changed = self.pause.release(source);
        self.sync_timer();
        self.pause_events(changed)
    }

    /// Flips the manual pause.
    pub fn toggle_pause(&mut self) -> Vec<NavigationEvent> {
        if self.pause.is_held(PauseSource::Manual) {
            self.resume(PauseSource::Manual)
        } else {
            self.pause(PauseSource::Manual)
        }
    }

    /// Page visibility changed.
    pub fn set_page_visible(&mut self, visible: bool) -> Vec<NavigationEvent> {
        if visible {
            self.resume(PauseSource::Hidden)
        } else {
            self.pause(PauseSource::Hidden)
        }
    }

    /// The renderer at `position` started or stopped buffering. Ignored for
    /// anything but the active item.
    pub fn set_buffering(
        &mut self,
        position: PlaybackPosition,
        buffering: bool,
    ) -> Vec<NavigationEvent> {
        if self.playing_position() != Some(position) {
            debug!(%position, buffering, "buffering report for inactive item ignored");
            return Vec::new();
        }
        if buffering {
            self.pause(PauseSource::Buffering)
        } else {
            self.resume(PauseSource::Buffering)
        }
    }

    /// Media metadata revealed the true duration of the item at `position`.
    ///
    /// Applied to the running timer without a reset when the item is
    /// active, and remembered for the rest of the session.
    pub fn report_duration(&mut self, position: PlaybackPosition, duration_ms: u64) {
        if duration_ms == 0 || !position.is_within(&self.users) {
            return;
        }
        let Some(session) = self.session.as_mut() else {
            return;
        };
        session.discovered.insert(position, duration_ms);
        if session.phase == ViewerPhase::Playing && session.position == position {
            debug!(%position, duration_ms, "duration discovered");
            self.timer.set_duration(duration_ms);
        }
    }

    /// The item at `position` failed to load.
    ///
    /// For the active item a skip is scheduled; for the item about to settle
    /// the skip is scheduled once it does. Reports for anything else are
    /// stale and ignored.
    pub fn report_load_error(&mut self, position: PlaybackPosition) -> Vec<NavigationEvent> {
        let skip_ms = self.config.timing.load_error_skip_ms;
        let now = self.clock.now();
        let Some(session) = self.session.as_mut() else {
            return Vec::new();
        };
        if session.settling_position() != position {
            debug!(%position, "stale load error ignored");
            return Vec::new();
        }
        warn!(session_id = %session.id, %position, "active item failed to load, skipping");
        if session.phase == ViewerPhase::Playing {
            session.scheduled = Some(Scheduled {
                due: after_millis(now, skip_ms),
                action: ScheduledAction::SkipFailedItem,
            });
        } else {
            session.pending_failure = Some(position);
        }
        vec![NavigationEvent::LoadFailed { position }]
    }

    /// Runs due phase deadlines and one timer frame. Call once per display
    /// frame while open.
    pub fn poll(&mut self) -> Vec<NavigationEvent> {
        let mut events = Vec::new();
        self.run_due_actions(&mut events);
        if self.phase() == ViewerPhase::Playing && self.timer.tick() == TimerTick::Completed {
            debug!("active item completed");
            events.extend(self.advance());
        }
        events
    }

    /// A snapshot for the presentation layer.
    #[must_use]
    pub fn render_state(&self) -> RenderState {
        let is_paused = self.pause.is_paused();
        let Some(session) = self.session.as_ref() else {
            return RenderState {
                session_id: None,
                phase: ViewerPhase::Closed,
                position: None,
                transition: TransitionState::Idle,
                is_loading: false,
                is_paused,
                progress: 0.0,
                progress_bars: Vec::new(),
                announcement: None,
            };
        };
        let position = session.position;
        let progress = self.timer.progress();
        let user = self.users.get(position.user_index);
        let story_count = user.map_or(0, |user| user.stories.len());
        let progress_bars = (0..story_count)
            .map(|index| match index.cmp(&position.story_index) {
                std::cmp::Ordering::Less => 1.0,
                std::cmp::Ordering::Equal => progress,
                std::cmp::Ordering::Greater => 0.0,
            })
            .collect();
        let announcement = user.map(|user| {
            format!(
                "Viewing story {} of {} by {}",
                position.story_index + 1,
                story_count,
                user.handle
            )
        });

        RenderState {
            session_id: Some(session.id),
            phase: session.phase,
            position: Some(position),
            transition: session.phase.transition(),
            is_loading: session.phase.is_loading(),
            is_paused,
            progress,
            progress_bars,
            announcement,
        }
    }

    fn story_count(&self, user_index: usize) -> usize {
        self.users
            .get(user_index)
            .map_or(0, |user| user.stories.len())
    }

    fn playing_position(&self) -> Option<PlaybackPosition> {
        let session = self.session.as_ref()?;
        if session.phase.accepts_navigation() {
            Some(session.position)
        } else {
            debug!(phase = ?session.phase, "navigation ignored outside playback");
            None
        }
    }

    fn advance_step(&mut self) -> Vec<NavigationEvent> {
        let Some(position) = self.playing_position() else {
            return Vec::new();
        };
        if position.story_index + 1 < self.story_count(position.user_index) {
            self.settle_at(PlaybackPosition::new(
                position.user_index,
                position.story_index + 1,
            ))
        } else if let Some(next) = next_navigable_user(&self.users, position.user_index) {
            self.begin_user_transition(Direction::Forward, PlaybackPosition::new(next, 0))
        } else {
            info!("advanced past the last story");
            self.close()
        }
    }

    fn begin_user_transition(
        &mut self,
        direction: Direction,
        target: PlaybackPosition,
    ) -> Vec<NavigationEvent> {
        let due = after_millis(self.clock.now(), self.config.timing.user_loading_ms);
        let Some(session) = self.session.as_mut() else {
            return Vec::new();
        };
        info!(
            session_id = %session.id,
            from_user_index = session.position.user_index,
            to_user_index = target.user_index,
            ?direction,
            "switching user"
        );
        let previous = session.position;
        session.phase = ViewerPhase::UserLoading { direction, target };
        session.scheduled = Some(Scheduled {
            due,
            action: ScheduledAction::BeginSlide,
        });
        session.pending_failure = None;
        let phase = session.phase;
        self.timer.pause();

        vec![
            NavigationEvent::ItemDeactivated { position: previous },
            NavigationEvent::PhaseChanged { phase },
            NavigationEvent::PreloadRequested {
                positions: vec![target],
            },
        ]
    }

    /// Lands on `target` in the playing phase. The position change, the
    /// timer reseed and the reset happen together.
    fn settle_at(&mut self, target: PlaybackPosition) -> Vec<NavigationEvent> {
        let default_ms = self.config.timing.default_duration_ms;
        let skip_ms = self.config.timing.load_error_skip_ms;
        let now = self.clock.now();
        let Some(session) = self.session.as_mut() else {
            return Vec::new();
        };
        let mut events = Vec::new();
        if session.phase == ViewerPhase::Playing {
            events.push(NavigationEvent::ItemDeactivated {
                position: session.position,
            });
        } else {
            events.push(NavigationEvent::PhaseChanged {
                phase: ViewerPhase::Playing,
            });
        }

        session.position = target;
        session.phase = ViewerPhase::Playing;
        session.scheduled = session
            .pending_failure
            .take()
            .filter(|failed| *failed == target)
            .map(|_| Scheduled {
                due: after_millis(now, skip_ms),
                action: ScheduledAction::SkipFailedItem,
            });
        let duration_ms = session.discovered.get(&target).copied().unwrap_or_else(|| {
            target
                .item_in(&self.users)
                .map_or(default_ms, |item| item.resolved_duration_ms(default_ms))
        });
        let provisional = !session.discovered.contains_key(&target)
            && target
                .item_in(&self.users)
                .is_some_and(StoryItem::discovers_duration);
        debug!(
            session_id = %session.id,
            user_index = target.user_index,
            story_index = target.story_index,
            duration_ms,
            provisional,
            "position settled"
        );

        let buffering_released = self.pause.release(PauseSource::Buffering);
        self.timer.set_duration(duration_ms);
        self.timer.reset();
        if self.pause.is_paused() {
            self.timer.pause();
        }
        if buffering_released {
            events.push(NavigationEvent::PauseChanged { paused: false });
        }

        events.push(NavigationEvent::PositionChanged { position: target });
        events.push(NavigationEvent::ItemActivated { position: target });
        events.push(NavigationEvent::PreloadRequested {
            positions: lookahead_positions(
                &self.users,
                target,
                self.config.preload.neighbor_stories,
            ),
        });
        events
    }

    fn run_due_actions(&mut self, events: &mut Vec<NavigationEvent>) {
        let now = self.clock.now();
        while let Some(action) = self.take_due_action(now) {
            match action {
                ScheduledAction::FinishOpenLoading => {
                    if let Some(position) = self.position() {
                        events.extend(self.settle_at(position));
                    }
                }
                ScheduledAction::BeginSlide => events.extend(self.begin_slide(now)),
                ScheduledAction::Settle => {
                    if let Some(ViewerPhase::UserTransitioning { target, .. }) =
                        self.session.as_ref().map(|session| session.phase)
                    {
                        events.extend(self.settle_at(target));
                    }
                }
                ScheduledAction::SkipFailedItem => events.extend(self.advance_step()),
            }
        }
    }

    fn take_due_action(&mut self, now: DateTime<Utc>) -> Option<ScheduledAction> {
        let session = self.session.as_mut()?;
        let scheduled = session.scheduled.filter(|scheduled| scheduled.due <= now)?;
        session.scheduled = None;
        Some(scheduled.action)
    }

    fn begin_slide(&mut self, now: DateTime<Utc>) -> Vec<NavigationEvent> {
        let settle_ms = self.config.timing.transition_settle_ms;
        let Some(session) = self.session.as_mut() else {
            return Vec::new();
        };
        let ViewerPhase::UserLoading { direction, target } = session.phase else {
            return Vec::new();
        };
        session.phase = ViewerPhase::UserTransitioning { direction, target };
        session.scheduled = Some(Scheduled {
            due: after_millis(now, settle_ms),
            action: ScheduledAction::Settle,
        });
        vec![NavigationEvent::PhaseChanged {
            phase: session.phase,
        }]
    }

    fn sync_timer(&mut self) {
        if self.phase() != ViewerPhase::Playing {
            return;
        }
        if self.pause.is_paused() {
            self.timer.pause();
        } else {
            self.timer.resume();
        }
    }

    fn pause_events(&self, changed: bool) -> Vec<NavigationEvent> {
        if changed && self.session.is_some() {
            vec![NavigationEvent::PauseChanged {
                paused: self.pause.is_paused(),
            }]
        } else {
            Vec::new()
        }
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashSet;
    use std::sync::Mutex;

    use proptest::prelude::*;
    use stories_test_support::{ManualClock, image_item, text_item, user, users_fixture, video_item};

    use super::*;

    fn instant_config() -> EngineConfig {
        let mut config = EngineConfig::default();
        config.timing.initial_load_ms = 0;
        config.timing.user_loading_ms = 0;
        config.timing.transition_settle_ms = 0;
        config
    }

    fn machine(
        users: Vec<User>,
        config: EngineConfig,
    ) -> (NavigationStateMachine, Arc<ManualClock>) {
        let clock = Arc::new(ManualClock::at_epoch());
        let machine = NavigationStateMachine::new(users, config, clock.clone());
        (machine, clock)
    }

    fn position(user_index: usize, story_index: usize) -> PlaybackPosition {
        PlaybackPosition::new(user_index, story_index)
    }

    fn settled(events: &[NavigationEvent]) -> Vec<PlaybackPosition> {
        events
            .iter()
            .filter_map(|event| match event {
                NavigationEvent::PositionChanged { position } => Some(*position),
                _ => None,
            })
            .collect()
    }

    fn closed_count(events: &[NavigationEvent]) -> usize {
        events
            .iter()
            .filter(|event| matches!(event, NavigationEvent::Closed { .. }))
            .count()
    }

    #[test]
    fn test_open_waits_for_initial_load_then_preloads_neighbors() {
        // Arrange
        let (mut machine, clock) = machine(users_fixture(5, 3), EngineConfig::default());

        // Act
        let opened = machine.open(2, Some(1));
        clock.advance_ms(1_499);
        let early = machine.poll();
        clock.advance_ms(1);
        let loaded = machine.poll();

        // Assert
        assert_eq!(machine.phase(), ViewerPhase::Playing);
        assert!(settled(&opened).is_empty());
        assert!(settled(&early).is_empty());
        assert_eq!(settled(&loaded), vec![position(2, 1)]);
        let preloaded: HashSet<_> = loaded
            .iter()
            .find_map(|event| match event {
                NavigationEvent::PreloadRequested { positions } => Some(positions.clone()),
                _ => None,
            })
            .unwrap()
            .into_iter()
            .collect();
        let expected: HashSet<_> = [position(2, 0), position(2, 2), position(1, 0), position(3, 0)]
            .into_iter()
            .collect();
        assert_eq!(preloaded, expected);
    }

    #[test]
    fn test_navigation_is_ignored_during_initial_load() {
        let (mut machine, _clock) = machine(users_fixture(2, 3), EngineConfig::default());
        machine.open(0, None);

        let events = machine.advance();

        assert!(events.is_empty());
        assert_eq!(machine.position(), Some(position(0, 0)));
        assert_eq!(machine.phase(), ViewerPhase::OpenLoading);
    }

    #[test]
    fn test_item_completion_advances_within_user() {
        // Arrange
        let (mut machine, clock) = machine(users_fixture(1, 3), instant_config());
        machine.open(0, None);

        // Act
        clock.advance_ms(2_500);
        let halfway = machine.poll();
        let halfway_bars = machine.render_state().progress_bars;
        clock.advance_ms(2_500);
        let completed = machine.poll();

        // Assert
        assert!(settled(&halfway).is_empty());
        assert!((halfway_bars[0] - 0.5).abs() < 0.01);
        assert_eq!(settled(&completed), vec![position(0, 1)]);
        assert!(machine.timer().progress() < f64::EPSILON);
    }

    #[test]
    fn test_frames_are_only_requested_while_the_timer_runs() {
        // Arrange
        let (mut machine, clock) = machine(users_fixture(1, 2), EngineConfig::default());
        let opened_at = clock.now();

        // Act
        machine.open(0, None);
        let loading = (machine.needs_frame(), machine.next_deadline());
        clock.advance_ms(1_500);
        machine.poll();
        let playing = (machine.needs_frame(), machine.next_deadline());
        machine.pause(PauseSource::Manual);
        let paused = (machine.needs_frame(), machine.next_deadline());
        machine.close();

        // Assert
        assert_eq!(loading, (false, Some(after_millis(opened_at, 1_500))));
        assert_eq!(playing, (true, None));
        assert_eq!(paused, (false, None));
        assert!(!machine.needs_frame());
    }

    #[test]
    fn test_advance_across_users_runs_loading_slide_and_settle() {
        // Arrange
        let (mut machine, clock) = machine(users_fixture(2, 2), EngineConfig::default());
        machine.open(0, Some(1));
        clock.advance_ms(1_500);
        machine.poll();

        // Act
        let started = machine.advance();
        let loading = machine.render_state();
        clock.advance_ms(1_000);
        let sliding = machine.poll();
        let slide_state = machine.render_state();
        clock.advance_ms(150);
        let landed = machine.poll();

        // Assert
        assert!(settled(&started).is_empty());
        assert_eq!(loading.transition, TransitionState::UserLoading);
        assert!(loading.is_loading);
        assert!(settled(&sliding).is_empty());
        assert_eq!(slide_state.transition, TransitionState::SlidingLeft);
        assert_eq!(settled(&landed), vec![position(1, 0)]);
        assert_eq!(machine.render_state().transition, TransitionState::Idle);
    }

    #[test]
    fn test_retreat_across_users_lands_on_last_story() {
        let (mut machine, _clock) = machine(users_fixture(2, 3), instant_config());
        machine.open(1, Some(0));

        let events = machine.retreat();

        assert_eq!(settled(&events), vec![position(0, 2)]);
        assert_eq!(machine.render_state().transition, TransitionState::Idle);
    }

    #[test]
    fn test_retreat_at_first_story_is_noop() {
        let (mut machine, _clock) = machine(users_fixture(2, 3), instant_config());
        machine.open(0, Some(0));

        let events = machine.retreat();

        assert!(events.is_empty());
        assert_eq!(machine.position(), Some(position(0, 0)));
    }

    #[test]
    fn test_switch_user_lands_on_first_story() {
        let (mut machine, _clock) = machine(users_fixture(3, 3), instant_config());
        machine.open(1, Some(2));

        let forward = machine.switch_user(Direction::Forward);
        let backward = machine.switch_user(Direction::Backward);

        assert_eq!(settled(&forward), vec![position(2, 0)]);
        assert_eq!(settled(&backward), vec![position(1, 0)]);
    }

    #[test]
    fn test_advancing_past_last_story_closes_exactly_once() {
        // Arrange
        let (mut machine, _clock) = machine(users_fixture(1, 1), instant_config());
        machine.open(0, None);

        // Act
        let first = machine.advance();
        let second = machine.advance();
        let explicit = machine.close();

        // Assert
        assert_eq!(closed_count(&first), 1);
        assert_eq!(closed_count(&second), 0);
        assert_eq!(closed_count(&explicit), 0);
        assert!(!machine.is_open());
    }

    #[test]
    fn test_empty_users_are_skipped() {
        // Arrange
        let users = vec![
            user("a", vec![image_item("a-1")]),
            user("empty", Vec::new()),
            user("b", vec![image_item("b-1")]),
        ];
        let (mut machine, _clock) = machine(users, instant_config());

        // Act
        let opened = machine.open(1, None);
        let back = machine.retreat();

        // Assert
        assert_eq!(settled(&opened), vec![position(2, 0)]);
        assert_eq!(settled(&back), vec![position(0, 0)]);
    }

    #[test]
    fn test_open_with_no_playable_users_stays_closed() {
        let (mut machine, _clock) = machine(vec![user("empty", Vec::new())], instant_config());

        let events = machine.open(0, None);

        assert!(events.is_empty());
        assert!(!machine.is_open());
    }

    #[test]
    fn test_open_with_huge_user_index_lands_on_last_user() {
        let (mut machine, _clock) = machine(users_fixture(2, 2), instant_config());

        machine.open(usize::MAX, None);

        assert!(machine.is_open());
        assert_eq!(machine.position(), Some(position(1, 0)));
    }

    #[test]
    fn test_hidden_page_keeps_manual_pause() {
        // Arrange
        let (mut machine, clock) = machine(users_fixture(1, 2), instant_config());
        machine.open(0, None);
        machine.toggle_pause();
        machine.set_page_visible(false);

        // Act
        machine.set_page_visible(true);
        clock.advance_ms(10_000);
        let events = machine.poll();

        // Assert
        assert!(machine.is_paused());
        assert!(settled(&events).is_empty());
        assert!(machine.timer().progress() < f64::EPSILON);
    }

    #[test]
    fn test_held_contact_keeps_new_item_paused_after_reset() {
        // Arrange
        let (mut machine, clock) = machine(users_fixture(1, 3), instant_config());
        machine.open(0, None);
        machine.pause(PauseSource::Contact);

        // Act
        machine.advance();
        clock.advance_ms(6_000);
        let events = machine.poll();

        // Assert
        assert_eq!(machine.position(), Some(position(0, 1)));
        assert!(machine.timer().is_paused());
        assert!(settled(&events).is_empty());
    }

    #[test]
    fn test_pause_preserves_elapsed_time() {
        let (mut machine, clock) = machine(users_fixture(1, 2), instant_config());
        machine.open(0, None);
        clock.advance_ms(2_000);
        machine.pause(PauseSource::Manual);

        clock.advance_ms(30_000);
        machine.resume(PauseSource::Manual);
        clock.advance_ms(500);
        machine.poll();

        assert!((machine.timer().progress() - 0.5).abs() < 0.01);
    }

    #[test]
    fn test_load_error_skips_active_item_after_delay() {
        // Arrange
        let (mut machine, clock) = machine(users_fixture(1, 3), instant_config());
        machine.open(0, None);

        // Act
        let reported = machine.report_load_error(position(0, 0));
        clock.advance_ms(499);
        let early = machine.poll();
        clock.advance_ms(1);
        let skipped = machine.poll();

        // Assert
        assert_eq!(
            reported,
            vec![NavigationEvent::LoadFailed {
                position: position(0, 0)
            }]
        );
        assert!(settled(&early).is_empty());
        assert_eq!(settled(&skipped), vec![position(0, 1)]);
    }

    #[test]
    fn test_stale_load_error_is_ignored_and_position_change_cancels_skip() {
        // Arrange
        let (mut machine, clock) = machine(users_fixture(1, 3), instant_config());
        machine.open(0, None);
        machine.report_load_error(position(0, 0));

        // Act
        machine.advance();
        let stale = machine.report_load_error(position(0, 0));
        clock.advance_ms(600);
        let events = machine.poll();

        // Assert
        assert!(stale.is_empty());
        assert!(settled(&events).is_empty());
        assert_eq!(machine.position(), Some(position(0, 1)));
    }

    #[test]
    fn test_load_error_during_initial_load_skips_once_settled() {
        let (mut machine, clock) = machine(users_fixture(1, 2), EngineConfig::default());
        machine.open(0, None);
        machine.report_load_error(position(0, 0));

        clock.advance_ms(1_500);
        machine.poll();
        clock.advance_ms(500);
        let events = machine.poll();

        assert_eq!(settled(&events), vec![position(0, 1)]);
    }

    #[test]
    fn test_discovered_duration_applies_without_reset() {
        // Arrange
        let users = vec![user("a", vec![video_item("clip"), text_item("after", 1_000)])];
        let (mut machine, clock) = machine(users, instant_config());
        machine.open(0, None);
        clock.advance_ms(1_000);
        machine.poll();

        // Act
        machine.report_duration(position(0, 0), 10_000);
        clock.advance_ms(4_500);
        let events = machine.poll();

        // Assert
        assert!(settled(&events).is_empty());
        assert!((machine.timer().progress() - 0.55).abs() < 0.01);
    }

    #[test]
    fn test_buffering_is_an_independent_pause_source() {
        let (mut machine, _clock) = machine(users_fixture(1, 2), instant_config());
        machine.open(0, None);
        machine.pause(PauseSource::Hover);

        machine.set_buffering(position(0, 0), true);
        let ended = machine.set_buffering(position(0, 0), false);

        assert!(ended.is_empty());
        assert!(machine.is_paused());
        assert!(machine.pause_state().is_held(PauseSource::Hover));
    }

    #[test]
    fn test_render_state_reports_bars_and_announcement() {
        // Arrange
        let (mut machine, clock) = machine(users_fixture(2, 4), instant_config());
        machine.open(1, Some(2));
        clock.advance_ms(2_500);
        machine.poll();

        // Act
        let state = machine.render_state();

        // Assert
        assert_eq!(state.progress_bars.len(), 4);
        assert!((state.progress_bars[0] - 1.0).abs() < f64::EPSILON);
        assert!((state.progress_bars[2] - 0.5).abs() < 0.01);
        assert!(state.progress_bars[3].abs() < f64::EPSILON);
        assert_eq!(
            state.announcement.as_deref(),
            Some("Viewing story 3 of 4 by @u1")
        );
        assert_eq!(state.session_id, machine.session_id());
    }

    #[derive(Default)]
    struct RecordingViewport {
        restored: Mutex<Vec<f64>>,
    }

    impl ViewportHost for RecordingViewport {
        fn lock_scroll(&self) -> f64 {
            240.0
        }

        fn restore_scroll(&self, anchor: f64) {
            self.restored.lock().unwrap().push(anchor);
        }
    }

    #[test]
    fn test_close_restores_scroll_anchor() {
        let viewport = Arc::new(RecordingViewport::default());
        let (machine, _clock) = machine(users_fixture(1, 1), instant_config());
        let mut machine = machine.with_viewport(viewport.clone());
        machine.open(0, None);

        machine.close();
        machine.close();

        assert_eq!(*viewport.restored.lock().unwrap(), vec![240.0]);
    }

    #[derive(Debug, Clone)]
    enum Step {
        Command(NavigationCommand),
        Open(usize, Option<usize>),
        Elapse(i64),
        LoadError(usize, usize),
    }

    fn step_strategy() -> impl Strategy<Value = Step> {
        prop_oneof![
            Just(Step::Command(NavigationCommand::Advance)),
            Just(Step::Command(NavigationCommand::Retreat)),
            Just(Step::Command(NavigationCommand::SwitchUser(Direction::Forward))),
            Just(Step::Command(NavigationCommand::SwitchUser(Direction::Backward))),
            Just(Step::Command(NavigationCommand::TogglePause)),
            Just(Step::Command(NavigationCommand::Close)),
            (0usize..6, proptest::option::of(0usize..5)).prop_map(|(u, s)| Step::Open(u, s)),
            (0i64..3_000).prop_map(Step::Elapse),
            (0usize..6, 0usize..5).prop_map(|(u, s)| Step::LoadError(u, s)),
        ]
    }

    fn dataset_strategy() -> impl Strategy<Value = Vec<User>> {
        proptest::collection::vec(0usize..4, 1..6).prop_map(|sizes| {
            sizes
                .into_iter()
                .enumerate()
                .map(|(u, count)| {
                    let stories = (0..count)
                        .map(|s| image_item(&format!("u{u}-s{s}")))
                        .collect();
                    user(&format!("u{u}"), stories)
                })
                .collect()
        })
    }

    proptest! {
        #[test]
        fn prop_position_stays_in_bounds_and_close_fires_once_per_session(
            users in dataset_strategy(),
            steps in proptest::collection::vec(step_strategy(), 1..60),
        ) {
            let (mut machine, clock) = machine(users.clone(), EngineConfig::default());
            let mut opened = 0usize;
            let mut closed = 0usize;

            for step in steps {
                let events = match step {
                    Step::Command(command) => machine.dispatch(command),
                    Step::Open(u, s) => machine.open(u, s),
                    Step::Elapse(ms) => {
                        clock.advance_ms(ms);
                        machine.poll()
                    }
                    Step::LoadError(u, s) => machine.report_load_error(position(u, s)),
                };
                opened += events
                    .iter()
                    .filter(|event| matches!(event, NavigationEvent::Opened { .. }))
                    .count();
                closed += closed_count(&events);

                if let Some(current) = machine.position() {
                    prop_assert!(current.is_within(&users));
                    prop_assert!(users[current.user_index].is_navigable());
                }
                prop_assert!(closed <= opened);
            }
        }
    }
}
