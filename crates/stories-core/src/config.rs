//! Engine configuration.
//!
//! Every tunable constant lives here. Values deserialize from a partial
//! YAML/JSON block (missing fields take their defaults) or from `STORIES_*`
//! environment variables.

use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::StoryError;

/// Complete engine configuration.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Durations and simulated delays.
    pub timing: TimingConfig,
    /// Look-ahead preloading.
    pub preload: PreloadConfig,
    /// Gesture classification thresholds.
    pub gestures: GestureConfig,
}

/// Durations and simulated delays, all in milliseconds.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TimingConfig {
    /// Duration of items without an explicit one.
    pub default_duration_ms: u64,
    /// Simulated fetch before the first story is shown.
    pub initial_load_ms: u64,
    /// Simulated fetch before a cross-user slide begins.
    pub user_loading_ms: u64,
    /// Slide animation length before the new user settles.
    pub transition_settle_ms: u64,
    /// Delay before skipping an item that failed to load.
    pub load_error_skip_ms: u64,
    /// Progress update cadence.
    pub frame_interval_ms: u64,
}

impl Default for TimingConfig {
    fn default() -> Self {
        Self {
            default_duration_ms: 5_000,
            initial_load_ms: 1_500,
            user_loading_ms: 1_000,
            transition_settle_ms: 150,
            load_error_skip_ms: 500,
            frame_interval_ms: 16,
        }
    }
}

/// Look-ahead preloading limits.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PreloadConfig {
    /// Maximum simultaneous in-flight fetches per batch.
    pub concurrency: usize,
    /// Neighboring stories of the current user to preload.
    pub neighbor_stories: usize,
}

impl Default for PreloadConfig {
    fn default() -> Self {
        Self {
            concurrency: 3,
            neighbor_stories: 2,
        }
    }
}

/// Gesture classification thresholds.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GestureConfig {
    /// Hold time before a contact becomes a long press.
    pub long_press_ms: u64,
    /// Movement below this is jitter, not a drag.
    pub jitter_px: f64,
    /// Longest contact still classified as a tap.
    pub tap_max_ms: u64,
    /// Horizontal travel that completes a swipe.
    pub swipe_distance_px: f64,
    /// Release velocity that completes a swipe regardless of travel.
    pub swipe_velocity_px_per_ms: f64,
    /// Downward travel that dismisses the viewer.
    pub dismiss_distance_px: f64,
}

impl Default for GestureConfig {
    fn default() -> Self {
        Self {
            long_press_ms: 500,
            jitter_px: 10.0,
            tap_max_ms: 300,
            swipe_distance_px: 50.0,
            swipe_velocity_px_per_ms: 0.5,
            dismiss_distance_px: 50.0,
        }
    }
}

impl EngineConfig {
    /// Builds a configuration from `STORIES_*` environment variables.
    ///
    /// # Errors
    ///
    /// Returns `StoryError::Config` if a variable is set but does not parse
    /// or the result fails validation.
    pub fn from_env() -> Result<Self, StoryError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Builds a configuration from an arbitrary key lookup, starting from
    /// the defaults.
    ///
    /// # Errors
    ///
    /// Returns `StoryError::Config` if a value does not parse or the result
    /// fails validation.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, StoryError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = Self::default();
        let timing = &mut config.timing;
        override_from(&lookup, "STORIES_DEFAULT_DURATION_MS", &mut timing.default_duration_ms)?;
        override_from(&lookup, "STORIES_INITIAL_LOAD_MS", &mut timing.initial_load_ms)?;
        override_from(&lookup, "STORIES_USER_LOADING_MS", &mut timing.user_loading_ms)?;
        override_from(&lookup, "STORIES_TRANSITION_SETTLE_MS", &mut timing.transition_settle_ms)?;
        override_from(&lookup, "STORIES_LOAD_ERROR_SKIP_MS", &mut timing.load_error_skip_ms)?;
        override_from(&lookup, "STORIES_FRAME_INTERVAL_MS", &mut timing.frame_interval_ms)?;

        let preload = &mut config.preload;
        override_from(&lookup, "STORIES_PRELOAD_CONCURRENCY", &mut preload.concurrency)?;
        override_from(&lookup, "STORIES_PRELOAD_NEIGHBORS", &mut preload.neighbor_stories)?;

        let gestures = &mut config.gestures;
        override_from(&lookup, "STORIES_LONG_PRESS_MS", &mut gestures.long_press_ms)?;
        override_from(&lookup, "STORIES_JITTER_PX", &mut gestures.jitter_px)?;
        override_from(&lookup, "STORIES_TAP_MAX_MS", &mut gestures.tap_max_ms)?;
        override_from(&lookup, "STORIES_SWIPE_DISTANCE_PX", &mut gestures.swipe_distance_px)?;
        override_from(&lookup, "STORIES_SWIPE_VELOCITY", &mut gestures.swipe_velocity_px_per_ms)?;
        override_from(&lookup, "STORIES_DISMISS_DISTANCE_PX", &mut gestures.dismiss_distance_px)?;

        config.validate()?;
        Ok(config)
    }

    /// Rejects values that would stall or divide by zero.
    ///
    /// # Errors
    ///
    /// Returns `StoryError::Config` naming the first offending field.
    pub fn validate(&self) -> Result<(), StoryError> {
        if self.timing.default_duration_ms == 0 {
            return Err(StoryError::Config("default_duration_ms must be > 0".into()));
        }
        if self.timing.frame_interval_ms == 0 {
            return Err(StoryError::Config("frame_interval_ms must be > 0".into()));
        }
        if self.preload.concurrency == 0 {
            return Err(StoryError::Config("preload concurrency must be > 0".into()));
        }
        let thresholds = [
            ("jitter_px", self.gestures.jitter_px),
            ("swipe_distance_px", self.gestures.swipe_distance_px),
            ("swipe_velocity_px_per_ms", self.gestures.swipe_velocity_px_per_ms),
            ("dismiss_distance_px", self.gestures.dismiss_distance_px),
        ];
        for (name, value) in thresholds {
            if !(value.is_finite() && value > 0.0) {
                return Err(StoryError::Config(format!("{name} must be a positive number")));
            }
        }
        Ok(())
    }
}

fn override_from<F, T>(lookup: &F, key: &str, target: &mut T) -> Result<(), StoryError>
where
    F: Fn(&str) -> Option<String>,
    T: FromStr,
    T::Err: std::fmt::Display,
{
    if let Some(raw) = lookup(key) {
        *target = raw
            .trim()
            .parse()
            .map_err(|e| StoryError::Config(format!("{key} must be a valid number: {e}")))?;
    }
    Ok(())
}
