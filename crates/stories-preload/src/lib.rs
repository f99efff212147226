//! Stories — asset preloading.
//!
//! Fetches image and video assets ahead of display. Identical URLs share one
//! underlying fetch, successful loads are cached for the lifetime of the
//! cache, and batches run at most `concurrency` fetches at a time.

pub mod cache;

pub use cache::{PreloadCache, PreloadReport};
