//! Chrome DevTools Protocol implementation of [`ViewSession`].
//!
//! One `CdpView` wraps one chromiumoxide [`Page`]. Element handles are CDP
//! remote-object references and go stale whenever the page re-renders,
//! which the engine already treats as a round-scoped capability.

use super::{ViewError, ViewSession};
use async_trait::async_trait;
use chromiumoxide::error::CdpError;
use chromiumoxide::{Element, Page};
use std::time::Duration;
use tokio::time::Instant;

const POLL_INTERVAL: Duration = Duration::from_millis(250);

pub struct CdpView {
    page: Page,
}

impl CdpView {
    pub fn new(page: Page) -> Self {
        Self { page }
    }

    /// The underlying page, for session-level operations (cookies).
    pub fn page(&self) -> &Page {
        &self.page
    }
}

/// Map a chromiumoxide error onto the engine's transient-vs-fatal
/// taxonomy. Transport failures mean the browser is gone; everything else
/// is a race with the renderer and retryable.
fn classify(err: CdpError) -> ViewError {
    match err {
        CdpError::Ws(e) => ViewError::SessionFatal(format!("websocket: {e}")),
        CdpError::Io(e) => ViewError::SessionFatal(format!("io: {e}")),
        CdpError::ChannelSendError(e) => ViewError::SessionFatal(format!("handler gone: {e}")),
        CdpError::NoResponse => ViewError::SessionFatal("no response from chrome".to_string()),
        CdpError::Timeout => ViewError::Transient("cdp call timed out".to_string()),
        CdpError::NotFound => ViewError::Transient("node not found".to_string()),
        other => {
            let msg = other.to_string();
            if msg.contains("node") || msg.contains("Node") || msg.contains("object id") {
                ViewError::ElementStale
            } else {
                ViewError::Transient(msg)
            }
        }
    }
}

#[async_trait]
impl ViewSession for CdpView {
    type Handle = Element;

    async fn navigate(&self, url: &str) -> Result<(), ViewError> {
        tracing::debug!(url, "navigating");
        self.page.goto(url).await.map_err(classify)?;
        Ok(())
    }

    async fn wait_ready(&self, timeout: Duration) -> Result<(), ViewError> {
        let deadline = Instant::now() + timeout;
        loop {
            match self.page.evaluate("document.readyState").await {
                Ok(result) => {
                    let state: Option<String> = result.into_value().ok();
                    if matches!(state.as_deref(), Some("interactive" | "complete")) {
                        return Ok(());
                    }
                }
                Err(e) => {
                    let e = classify(e);
                    if e.is_fatal() {
                        return Err(e);
                    }
                }
            }
            if Instant::now() >= deadline {
                return Err(ViewError::Transient(
                    "document never became interactive".to_string(),
                ));
            }
            tokio::time::sleep(POLL_INTERVAL).await;
        }
    }

    async fn find_anchor(
        &self,
        selector: &str,
        timeout: Duration,
    ) -> Result<Self::Handle, ViewError> {
        let deadline = Instant::now() + timeout;
        loop {
            match self.page.find_element(selector).await {
                Ok(element) => return Ok(element),
                Err(e) => {
                    let e = classify(e);
                    if e.is_fatal() {
                        return Err(e);
                    }
                }
            }
            if Instant::now() >= deadline {
                return Err(ViewError::ContainerNotFound(selector.to_string()));
            }
            tokio::time::sleep(POLL_INTERVAL).await;
        }
    }

    async fn find_all(
        &self,
        root: &Self::Handle,
        selector: &str,
    ) -> Result<Vec<Self::Handle>, ViewError> {
        match root.find_elements(selector).await {
            Ok(elements) => Ok(elements),
            // No matches is an empty snapshot, not an error.
            Err(CdpError::NotFound) => Ok(Vec::new()),
            Err(e) => Err(classify(e)),
        }
    }

    async fn find_in(
        &self,
        root: &Self::Handle,
        selector: &str,
    ) -> Result<Option<Self::Handle>, ViewError> {
        match root.find_element(selector).await {
            Ok(element) => Ok(Some(element)),
            Err(CdpError::NotFound) => Ok(None),
            Err(e) => Err(classify(e)),
        }
    }

    async fn read_attribute(
        &self,
        handle: &Self::Handle,
        name: &str,
    ) -> Result<Option<String>, ViewError> {
        handle.attribute(name).await.map_err(classify)
    }

    async fn read_text(&self, handle: &Self::Handle) -> Result<String, ViewError> {
        let text = handle.inner_text().await.map_err(classify)?;
        Ok(text.unwrap_or_default())
    }

    async fn click(&self, handle: &Self::Handle) -> Result<(), ViewError> {
        handle.click().await.map_err(classify)?;
        Ok(())
    }

    async fn scroll_into_view(&self, handle: &Self::Handle) -> Result<(), ViewError> {
        handle.scroll_into_view().await.map_err(classify)?;
        Ok(())
    }

    async fn scroll_element_by(
        &self,
        handle: &Self::Handle,
        delta_px: i64,
    ) -> Result<(), ViewError> {
        handle
            .call_js_fn(
                format!("function() {{ this.scrollTop += {delta_px}; }}"),
                false,
            )
            .await
            .map_err(classify)?;
        Ok(())
    }

    async fn scroll_window_by(&self, delta_px: i64) -> Result<(), ViewError> {
        self.page
            .evaluate(format!("window.scrollBy(0, {delta_px})"))
            .await
            .map_err(classify)?;
        Ok(())
    }
}
