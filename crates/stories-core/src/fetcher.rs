//! Asset fetcher abstraction.

use async_trait::async_trait;

use crate::error::StoryError;
use crate::model::AssetRequest;

/// Fetches and decodes story assets.
///
/// An image counts as loaded once it decodes; a video once enough is
/// buffered to play through, not merely once its metadata is known.
#[async_trait]
pub trait AssetFetcher: Send + Sync {
    /// Load `asset`, resolving when it is ready to display.
    async fn fetch(&self, asset: &AssetRequest) -> Result<(), StoryError>;
}
