//! Domain types for navigation: phases, pause sources, cursor arithmetic,
//! events and the scroll-lock guard.

pub mod cursor;
pub mod environment;
pub mod events;
pub mod pause;
pub mod phase;
