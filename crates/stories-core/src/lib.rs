//! Stories Core — shared playback abstractions.
//!
//! This crate defines the data model, clock, configuration and command
//! vocabulary that the timer, preload, gesture and navigation crates depend
//! on, plus the asset fetcher seam. It contains no runtime or I/O code.

pub mod clock;
pub mod command;
pub mod config;
pub mod error;
pub mod fetcher;
pub mod model;
