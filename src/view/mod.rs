//! Abstraction over the live rendered view (one browser tab).
//!
//! The traversal engine only ever talks to this trait; the real
//! implementation lives in [`cdp`] and the integration tests drive the
//! engine against a scripted in-memory view.

pub mod cdp;

use async_trait::async_trait;
use std::time::Duration;
use thiserror::Error;

/// Failure classification for view operations. The orchestrator matches on
/// these to decide between local retry, per-item downgrade, and aborting
/// the link.
#[derive(Debug, Error)]
pub enum ViewError {
    /// Wait/read race; retried locally within bounds.
    #[error("transient view error: {0}")]
    Transient(String),
    /// Structural anchor for the list is missing.
    #[error("container not found: {0}")]
    ContainerNotFound(String),
    /// Handle invalidated by a re-render. Never reused; the round
    /// re-acquires a fresh snapshot.
    #[error("element handle went stale")]
    ElementStale,
    /// Both the element scroll and the window fallback failed.
    #[error("cursor advance failed: {0}")]
    CursorAdvanceFailed(String),
    /// The view session itself is unusable; aborts the current link.
    #[error("view session unusable: {0}")]
    SessionFatal(String),
}

impl ViewError {
    pub fn is_fatal(&self) -> bool {
        matches!(self, ViewError::SessionFatal(_))
    }
}

/// Capability surface of a rendered view session.
///
/// Handles are valid only until the view re-renders; callers must treat
/// them as round-scoped and re-resolve via `find_anchor`/`find_all` rather
/// than caching them.
#[async_trait]
pub trait ViewSession: Send + Sync {
    type Handle: Send + Sync;

    async fn navigate(&self, url: &str) -> Result<(), ViewError>;

    /// Wait until the document is interactive/complete, bounded by `timeout`.
    async fn wait_ready(&self, timeout: Duration) -> Result<(), ViewError>;

    /// Locate a structural anchor, polling up to `timeout`. Yields
    /// `ContainerNotFound` when it never appears.
    async fn find_anchor(
        &self,
        selector: &str,
        timeout: Duration,
    ) -> Result<Self::Handle, ViewError>;

    /// Resolve all elements matching `selector` under `root`.
    async fn find_all(
        &self,
        root: &Self::Handle,
        selector: &str,
    ) -> Result<Vec<Self::Handle>, ViewError>;

    /// Resolve the first element matching `selector` under `root`, if any.
    /// Absence is an `Ok(None)`, not an error.
    async fn find_in(
        &self,
        root: &Self::Handle,
        selector: &str,
    ) -> Result<Option<Self::Handle>, ViewError>;

    async fn read_attribute(
        &self,
        handle: &Self::Handle,
        name: &str,
    ) -> Result<Option<String>, ViewError>;

    async fn read_text(&self, handle: &Self::Handle) -> Result<String, ViewError>;

    async fn click(&self, handle: &Self::Handle) -> Result<(), ViewError>;

    async fn scroll_into_view(&self, handle: &Self::Handle) -> Result<(), ViewError>;

    /// Scroll the element's own scroll container by `delta_px` (negative
    /// scrolls backward).
    async fn scroll_element_by(
        &self,
        handle: &Self::Handle,
        delta_px: i64,
    ) -> Result<(), ViewError>;

    /// Coarse whole-view fallback when element scrolling fails.
    async fn scroll_window_by(&self, delta_px: i64) -> Result<(), ViewError>;
}
