//! Test fetchers — mock `AssetFetcher` implementations for tests.

use std::collections::{HashMap, HashSet};
use std::sync::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use stories_core::error::StoryError;
use stories_core::fetcher::AssetFetcher;
use stories_core::model::AssetRequest;

/// A fetcher that records every fetch, optionally waits before resolving,
/// and fails for a configured set of URLs.
#[derive(Debug, Default)]
pub struct RecordingFetcher {
    latency: Option<Duration>,
    failing: HashSet<String>,
    calls: Mutex<Vec<String>>,
    active: AtomicUsize,
    peak_active: AtomicUsize,
}

impl RecordingFetcher {
    /// A fetcher that succeeds immediately for every URL.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Wait `latency` (on the Tokio clock) before resolving each fetch.
    #[must_use]
    pub fn with_latency(mut self, latency: Duration) -> Self {
        self.latency = Some(latency);
        self
    }

    /// Fail every fetch of `url`.
    #[must_use]
    pub fn failing_on(mut self, url: impl Into<String>) -> Self {
        self.failing.insert(url.into());
        self
    }

    /// Every URL fetched, in call order.
    ///
    /// # Panics
    ///
    /// Panics if the internal mutex is poisoned.
    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }

    /// How many times each URL was fetched.
    ///
    /// # Panics
    ///
    /// Panics if the internal mutex is poisoned.
    pub fn call_counts(&self) -> HashMap<String, usize> {
        let mut counts = HashMap::new();
        for url in self.calls.lock().unwrap().iter() {
            *counts.entry(url.clone()).or_insert(0) += 1;
        }
        counts
    }

    /// The largest number of fetches that were in flight at once.
    pub fn peak_concurrency(&self) -> usize {
        self.peak_active.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl AssetFetcher for RecordingFetcher {
    async fn fetch(&self, asset: &AssetRequest) -> Result<(), StoryError> {
        self.calls.lock().unwrap().push(asset.url.clone());
        let active = self.active.fetch_add(1, Ordering::SeqCst) + 1;
        self.peak_active.fetch_max(active, Ordering::SeqCst);

        if let Some(latency) = self.latency {
            tokio::time::sleep(latency).await;
        }

        self.active.fetch_sub(1, Ordering::SeqCst);
        if self.failing.contains(&asset.url) {
            return Err(StoryError::asset_load(&asset.url, "decode failed"));
        }
        Ok(())
    }
}

/// A fetcher that always fails. Useful for testing error-handling paths.
#[derive(Debug)]
pub struct FailingFetcher;

#[async_trait]
impl AssetFetcher for FailingFetcher {
    async fn fetch(&self, asset: &AssetRequest) -> Result<(), StoryError> {
        Err(StoryError::asset_load(&asset.url, "connection refused"))
    }
}
