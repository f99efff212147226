//! Application layer: the state machine that applies commands to a session.

pub mod state_machine;
