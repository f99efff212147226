//! Simulated asset fetcher for headless runs.

use std::collections::HashSet;
use std::time::Duration;

use async_trait::async_trait;
use stories_core::error::StoryError;
use stories_core::fetcher::AssetFetcher;
use stories_core::model::{AssetKind, AssetRequest};
use tracing::debug;

/// Resolves every asset after a fixed delay without touching the network.
/// Videos take twice as long as images.
#[derive(Debug, Clone, Default)]
pub struct SimulatedFetcher {
    latency: Duration,
    unreachable: HashSet<String>,
}

impl SimulatedFetcher {
    /// A fetcher that resolves images after `latency`.
    #[must_use]
    pub fn new(latency: Duration) -> Self {
        Self {
            latency,
            unreachable: HashSet::new(),
        }
    }

    /// Treat `url` as unreachable.
    #[must_use]
    pub fn unreachable(mut self, url: impl Into<String>) -> Self {
        self.unreachable.insert(url.into());
        self
    }
}

#[async_trait]
impl AssetFetcher for SimulatedFetcher {
    async fn fetch(&self, asset: &AssetRequest) -> Result<(), StoryError> {
        let latency = match asset.kind {
            AssetKind::Image => self.latency,
            AssetKind::Video => self.latency * 2,
        };
        tokio::time::sleep(latency).await;
        if self.unreachable.contains(&asset.url) {
            return Err(StoryError::asset_load(&asset.url, "unreachable"));
        }
        debug!(url = %asset.url, latency_ms = latency.as_millis(), "simulated fetch complete");
        Ok(())
    }
}
