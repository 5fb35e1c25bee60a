//! Scroll cursor over a virtualized feed.
//!
//! Advances visibility in bounded sub-steps and re-acquires the live item
//! collection after every advance. Handles from a previous snapshot are
//! never reused; each snapshot re-resolves the anchor and its items.

use crate::engine::pacing::Pacing;
use crate::view::{ViewError, ViewSession};
use std::time::Duration;

pub struct FeedCursor<'a, V: ViewSession> {
    view: &'a V,
    anchor_selector: &'a str,
    item_selector: &'a str,
    step_px: u32,
    anchor_wait: Duration,
}

impl<'a, V: ViewSession> FeedCursor<'a, V> {
    pub fn new(
        view: &'a V,
        anchor_selector: &'a str,
        item_selector: &'a str,
        step_px: u32,
        anchor_wait: Duration,
    ) -> Self {
        Self {
            view,
            anchor_selector,
            item_selector,
            step_px: step_px.max(1),
            anchor_wait,
        }
    }

    /// Scroll the feed forward by `target_delta` pixels in sub-steps, with
    /// a pacing pause after each step. Falls back to a coarse whole-view
    /// scroll when element scrolling fails; fails with
    /// `CursorAdvanceFailed` only when the fallback fails too.
    pub async fn advance(
        &self,
        pacing: &mut dyn Pacing,
        target_delta: u32,
    ) -> Result<(), ViewError> {
        self.scroll(pacing, target_delta as i64).await
    }

    /// Small reverse scroll, same step/pause discipline as `advance`.
    pub async fn retreat(&self, pacing: &mut dyn Pacing, delta: u32) -> Result<(), ViewError> {
        self.scroll(pacing, -(delta as i64)).await
    }

    async fn scroll(&self, pacing: &mut dyn Pacing, delta: i64) -> Result<(), ViewError> {
        if delta == 0 {
            return Ok(());
        }
        let direction = delta.signum();
        let total = delta.unsigned_abs();

        match self.view.find_anchor(self.anchor_selector, self.anchor_wait).await {
            Ok(anchor) => {
                let mut scrolled: u64 = 0;
                while scrolled < total {
                    let step = u64::from(self.step_px).min(total - scrolled);
                    if let Err(e) = self
                        .view
                        .scroll_element_by(&anchor, direction * step as i64)
                        .await
                    {
                        if e.is_fatal() {
                            return Err(e);
                        }
                        tracing::debug!(error = %e, "element scroll failed, window fallback");
                        return self.fallback(pacing, direction, total - scrolled).await;
                    }
                    scrolled += step;
                    tokio::time::sleep(pacing.scroll_pause()).await;
                }
                Ok(())
            }
            Err(e) if e.is_fatal() => Err(e),
            Err(e) => {
                tracing::debug!(error = %e, "anchor missing for scroll, window fallback");
                self.fallback(pacing, direction, total).await
            }
        }
    }

    async fn fallback(
        &self,
        pacing: &mut dyn Pacing,
        direction: i64,
        remaining: u64,
    ) -> Result<(), ViewError> {
        let mut scrolled: u64 = 0;
        while scrolled < remaining {
            let step = u64::from(self.step_px).min(remaining - scrolled);
            self.view
                .scroll_window_by(direction * step as i64)
                .await
                .map_err(|e| {
                    if e.is_fatal() {
                        e
                    } else {
                        ViewError::CursorAdvanceFailed(e.to_string())
                    }
                })?;
            scrolled += step;
            tokio::time::sleep(pacing.scroll_pause()).await;
        }
        Ok(())
    }

    /// Re-resolve the live item collection from the current view state.
    /// Zero items is a valid snapshot, not an error; a missing anchor is
    /// `ContainerNotFound` and the caller decides how often to retry.
    pub async fn snapshot(&self) -> Result<Vec<V::Handle>, ViewError> {
        let anchor = self
            .view
            .find_anchor(self.anchor_selector, self.anchor_wait)
            .await?;
        self.view.find_all(&anchor, self.item_selector).await
    }
}
