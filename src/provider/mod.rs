//! Per-provider adapters over the generic traversal engine.
//!
//! Each concrete feed provider supplies only the structural knowledge the
//! engine cannot share: where the comment list lives, what an item looks
//! like, how to derive an item's identity, and how to find and read its
//! like control. Dedup, stagnation, pacing, retry and termination are all
//! provider-independent.

pub mod instagram;
pub mod tiktok;

use crate::engine::key::KeyInput;
use crate::view::{ViewError, ViewSession};
use async_trait::async_trait;
use std::time::Duration;

/// Readable state of an item's action control.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ActionState {
    Engaged,
    NotEngaged,
    /// The control exists but its state could not be interpreted. Never
    /// acted on blindly.
    Indeterminate,
}

/// Selectors for classifying the page's login/challenge state.
#[derive(Debug, Clone, Copy)]
pub struct LoginProbe {
    pub login_button: &'static str,
    pub avatar: &'static str,
    pub challenge: &'static str,
}

#[async_trait]
pub trait ProviderAdapter<V: ViewSession>: Send + Sync {
    fn name(&self) -> &'static str;

    /// Origin the session cookies belong to.
    fn origin(&self) -> &'static str;

    /// Control that opens the comment feed on a post page.
    fn comments_control_selector(&self) -> &'static str;

    /// Structural anchor of the comment list.
    fn list_anchor_selector(&self) -> &'static str;

    /// One rendered comment entry, relative to the anchor.
    fn item_selector(&self) -> &'static str;

    fn login_probe(&self) -> LoginProbe;

    /// Bound on the visible-text prefix used for key derivation.
    fn key_prefix_chars(&self) -> usize {
        180
    }

    /// Extract the raw identity inputs from one rendered item.
    async fn key_input(&self, view: &V, item: &V::Handle) -> Result<KeyInput, ViewError>;

    /// Locate the item's like control. Absence is `Ok(None)`.
    async fn action_control(
        &self,
        view: &V,
        item: &V::Handle,
    ) -> Result<Option<V::Handle>, ViewError>;

    /// Read whether the control is already engaged.
    async fn action_state(&self, view: &V, control: &V::Handle)
        -> Result<ActionState, ViewError>;

    /// One attempt to open the comment feed for a link: navigate, wait for
    /// readiness, click the comments control, wait for the list anchor.
    /// The traversal loop owns the retry budget.
    async fn open_feed(&self, view: &V, url: &str) -> Result<(), ViewError> {
        view.navigate(url).await?;
        view.wait_ready(Duration::from_secs(10)).await?;

        // Some posts render the list without the control; require the
        // anchor, tolerate a missing or unclickable control.
        match view
            .find_anchor(self.comments_control_selector(), Duration::from_secs(8))
            .await
        {
            Ok(control) => {
                if let Err(e) = view.click(&control).await {
                    if e.is_fatal() {
                        return Err(e);
                    }
                    tracing::debug!(provider = self.name(), error = %e, "comments control click failed");
                }
            }
            Err(e) if e.is_fatal() => return Err(e),
            Err(e) => {
                tracing::debug!(provider = self.name(), error = %e, "comments control not found");
            }
        }

        view.find_anchor(self.list_anchor_selector(), Duration::from_secs(12))
            .await?;
        Ok(())
    }
}
