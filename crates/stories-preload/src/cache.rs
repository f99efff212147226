//! Deduplicating preload cache.
//!
//! The resolved-URL set is the only long-lived shared mutable state in the
//! engine. A separate in-flight map hands every concurrent request for the
//! same URL a clone of one shared fetch. Fetches are spawned onto the
//! current Tokio runtime so a result is cached even when every requester
//! stopped waiting for it.

use std::collections::{HashMap, HashSet};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use futures::future::{BoxFuture, FutureExt, Shared, join_all};
use stories_core::error::StoryError;
use stories_core::fetcher::AssetFetcher;
use stories_core::model::{AssetRequest, StoryItem};
use tracing::{debug, instrument, warn};

type SharedFetch = Shared<BoxFuture<'static, Result<(), StoryError>>>;

#[derive(Default)]
struct CacheState {
    resolved: HashSet<String>,
    in_flight: HashMap<String, SharedFetch>,
    /// Bumped by `clear`; fetches started before a clear do not repopulate.
    epoch: u64,
}

/// Outcome counts of a batch preload.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PreloadReport {
    /// Items whose asset is now cached.
    pub loaded: usize,
    /// Items whose asset failed to load.
    pub failed: usize,
    /// Items without a network asset (text, component).
    pub skipped: usize,
}

/// Deduplicated, concurrency-bounded fetch-and-cache for story assets.
pub struct PreloadCache {
    fetcher: Arc<dyn AssetFetcher>,
    state: Arc<Mutex<CacheState>>,
    concurrency: usize,
}

impl std::fmt::Debug for PreloadCache {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let state = lock(&self.state);
        f.debug_struct("PreloadCache")
            .field("resolved", &state.resolved.len())
            .field("in_flight", &state.in_flight.len())
            .field("concurrency", &self.concurrency)
            .finish_non_exhaustive()
    }
}

impl PreloadCache {
    /// Creates an empty cache. `concurrency` is clamped to at least one.
    #[must_use]
    pub fn new(fetcher: Arc<dyn AssetFetcher>, concurrency: usize) -> Self {
        Self {
            fetcher,
            state: Arc::new(Mutex::new(CacheState::default())),
            concurrency: concurrency.max(1),
        }
    }

    /// Preloads the asset behind `item`. Text and component items resolve
    /// immediately.
    ///
    /// # Errors
    ///
    /// Returns `StoryError::AssetLoad` if the fetch fails. Callers are
    /// expected to absorb the error; see [`PreloadCache::preload_quietly`].
    pub async fn preload(&self, item: &StoryItem) -> Result<(), StoryError> {
        match item.asset() {
            Some(asset) => self.preload_asset(asset).await,
            None => Ok(()),
        }
    }

    /// Preloads `item`, logging and swallowing any failure.
    pub async fn preload_quietly(&self, item: &StoryItem) {
        if let Err(error) = self.preload(item).await {
            warn!(story_id = %item.id, %error, "preload failed");
        }
    }

    /// Preloads one asset, sharing any fetch already in flight for its URL.
    ///
    /// # Errors
    ///
    /// Returns `StoryError::AssetLoad` if the shared fetch fails.
    pub async fn preload_asset(&self, asset: AssetRequest) -> Result<(), StoryError> {
        let fetch = {
            let mut state = lock(&self.state);
            if state.resolved.contains(&asset.url) {
                return Ok(());
            }
            if let Some(existing) = state.in_flight.get(&asset.url) {
                debug!(url = %asset.url, "joining in-flight fetch");
                existing.clone()
            } else {
                let fetch = self.start_fetch(asset.clone(), state.epoch);
                state.in_flight.insert(asset.url.clone(), fetch.clone());
                fetch
            }
        };
        fetch.await
    }

    /// Preloads `items` in sequential chunks of `concurrency`, waiting for
    /// every fetch of a chunk to settle before starting the next.
    #[instrument(skip(self, items), fields(items = items.len()))]
    pub async fn preload_batch(&self, items: &[StoryItem]) -> PreloadReport {
        let mut report = PreloadReport::default();
        for chunk in items.chunks(self.concurrency) {
            let results = join_all(chunk.iter().map(|item| async move {
                (item, item.asset().is_some(), self.preload(item).await)
            }))
            .await;
            for (item, has_asset, result) in results {
                match result {
                    Ok(()) if has_asset => report.loaded += 1,
                    Ok(()) => report.skipped += 1,
                    Err(error) => {
                        warn!(story_id = %item.id, %error, "preload failed");
                        report.failed += 1;
                    }
                }
            }
        }
        debug!(?report, "batch preload settled");
        report
    }

    /// Whether `url` has been loaded successfully.
    #[must_use]
    pub fn is_preloaded(&self, url: &str) -> bool {
        lock(&self.state).resolved.contains(url)
    }

    /// Whether a fetch for `url` is currently running.
    #[must_use]
    pub fn is_in_flight(&self, url: &str) -> bool {
        lock(&self.state).in_flight.contains_key(url)
    }

    /// Number of cached assets.
    #[must_use]
    pub fn len(&self) -> usize {
        lock(&self.state).resolved.len()
    }

    /// Whether nothing is cached.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Forgets every cached and in-flight asset. Fetches still running finish
    /// but are not recorded.
    pub fn clear(&self) {
        let mut state = lock(&self.state);
        state.resolved.clear();
        state.in_flight.clear();
        state.epoch += 1;
    }

    fn start_fetch(&self, asset: AssetRequest, epoch: u64) -> SharedFetch {
        let fetcher = Arc::clone(&self.fetcher);
        let state = Arc::clone(&self.state);
        let fetch = async move {
            debug!(url = %asset.url, kind = ?asset.kind, "fetching asset");
            let result = fetcher.fetch(&asset).await;
            let mut state = lock(&state);
            if state.epoch == epoch {
                state.in_flight.remove(&asset.url);
                if result.is_ok() {
                    state.resolved.insert(asset.url.clone());
                }
            }
            result
        }
        .boxed()
        .shared();

        if let Ok(runtime) = tokio::runtime::Handle::try_current() {
            runtime.spawn(fetch.clone());
        }
        fetch
    }
}

fn lock(state: &Mutex<CacheState>) -> MutexGuard<'_, CacheState> {
    state.lock().unwrap_or_else(PoisonError::into_inner)
}
