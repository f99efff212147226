//! Headless stories demo.
//!
//! Loads a dataset, opens the viewer and plays it through with a simulated
//! asset fetcher until the viewer closes.

use std::error::Error;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use stories_core::config::EngineConfig;
use stories_core::model::PlaybackPosition;
use stories_engine::clock::TokioClock;
use stories_engine::dataset::load_dataset;
use stories_engine::fetcher::SimulatedFetcher;
use stories_engine::routing::resolve_story;
use stories_engine::{EngineObserver, PlaybackEngine};
use tracing_subscriber::EnvFilter;

/// Logs every settled position, standing in for route sync.
struct LoggingObserver;

impl EngineObserver for LoggingObserver {
    fn on_position_change(&self, position: PlaybackPosition, story_id: &str) {
        tracing::info!(
            user_index = position.user_index,
            story_index = position.story_index,
            story_id,
            "now playing"
        );
    }

    fn on_close(&self) {
        tracing::info!("viewer closed");
    }
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn Error>> {
    // Initialize tracing subscriber.
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .json()
        .init();

    tracing::info!("Starting stories demo");

    // Read configuration from environment.
    let dataset = std::env::var("STORIES_DATASET")
        .map_err(|_| "STORIES_DATASET environment variable must be set")?;
    let config = EngineConfig::from_env()?;
    let fetch_latency_ms: u64 = std::env::var("STORIES_FETCH_LATENCY_MS")
        .unwrap_or_else(|_| "120".to_string())
        .parse()
        .map_err(|e| format!("STORIES_FETCH_LATENCY_MS must be a valid u64: {e}"))?;

    let users = load_dataset(&PathBuf::from(dataset)).await?;
    let start = match std::env::var("STORIES_START_STORY") {
        Ok(story_id) => resolve_story(&users, &story_id)?,
        Err(_) => PlaybackPosition::default(),
    };

    let mut engine = PlaybackEngine::new(
        users,
        config,
        Arc::new(TokioClock::new()),
        Arc::new(SimulatedFetcher::new(Duration::from_millis(fetch_latency_ms))),
        Arc::new(LoggingObserver),
    );
    engine.open(start.user_index, Some(start.story_index));
    engine.run().await;

    tracing::info!(
        cached_assets = engine.preload_cache().len(),
        "Stories demo finished"
    );
    engine.shutdown();
    Ok(())
}
