//! Stories — navigation state machine.
//!
//! Owns the current (user, story) position, the cross-user transition
//! sequence (loading, slide, settle), the open/close lifecycle and the pause
//! multiplexer. The machine is driven by commands and by [`poll`] on every
//! display frame; it never sleeps or spawns, it only schedules deadlines
//! against its injected clock and reports what happened as events.
//!
//! [`poll`]: application::state_machine::NavigationStateMachine::poll

pub mod application;
pub mod domain;

pub use application::state_machine::{NavigationStateMachine, RenderState};
pub use domain::environment::{NoopViewport, ScrollLock, ViewportHost};
pub use domain::events::NavigationEvent;
pub use domain::pause::PauseState;
pub use domain::phase::{TransitionState, ViewerPhase};
