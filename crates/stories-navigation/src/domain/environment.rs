//! Host environment seam for the scroll lock.
//!
//! Opening the viewer locks the host's scrolling and records where it was;
//! the anchor must come back on every exit path, so the lock is an RAII
//! guard owned by the open session.

use std::sync::Arc;

use tracing::debug;

/// The page hosting the viewer.
pub trait ViewportHost: Send + Sync {
    /// Locks scrolling and returns the current scroll offset.
    fn lock_scroll(&self) -> f64;

    /// Unlocks scrolling and restores `anchor`.
    fn restore_scroll(&self, anchor: f64);
}

/// A host with nothing to lock.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopViewport;

impl ViewportHost for NoopViewport {
    fn lock_scroll(&self) -> f64 {
        0.0
    }

    fn restore_scroll(&self, _anchor: f64) {}
}

/// Holds the host's scroll lock until dropped.
pub struct ScrollLock {
    host: Arc<dyn ViewportHost>,
    anchor: f64,
}

impl std::fmt::Debug for ScrollLock {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ScrollLock")
            .field("anchor", &self.anchor)
            .finish_non_exhaustive()
    }
}

impl ScrollLock {
    /// Locks `host` and records its scroll offset.
    #[must_use]
    pub fn acquire(host: Arc<dyn ViewportHost>) -> Self {
        let anchor = host.lock_scroll();
        debug!(anchor, "scroll locked");
        Self { host, anchor }
    }

    /// The recorded scroll offset.
    #[must_use]
    pub fn anchor(&self) -> f64 {
        self.anchor
    }
}

impl Drop for ScrollLock {
    fn drop(&mut self) {
        self.host.restore_scroll(self.anchor);
        debug!(anchor = self.anchor, "scroll restored");
    }
}
