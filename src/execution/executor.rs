//! Idempotent engage action on a single item.
//!
//! The executor probes the item's action control, and only when the
//! control reads not-yet-engaged does it click and confirm the result with
//! a read-after-write check. An unconfirmed click gets exactly one
//! corrective retry per configured budget; after that the item is marked
//! failed and the traversal moves on. Re-processing an already-engaged
//! item is always a no-op, never a toggle-off.

use crate::engine::pacing::Pacing;
use crate::provider::{ActionState, ProviderAdapter};
use crate::view::{ViewError, ViewSession};

/// Terminal evaluation state of one item.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ItemState {
    /// Pace-skipped without being probed.
    Skipped,
    /// Control already read engaged; no mutation performed.
    AlreadyDone,
    /// Action performed and confirmed by re-reading the control.
    Confirmed,
    /// Control missing, unreadable, or the action never stuck.
    FailedFinal,
}

pub struct ActionExecutor<'a, V: ViewSession, A: ProviderAdapter<V>> {
    view: &'a V,
    adapter: &'a A,
    confirm_retries: u32,
}

impl<'a, V: ViewSession, A: ProviderAdapter<V>> ActionExecutor<'a, V, A> {
    pub fn new(view: &'a V, adapter: &'a A, confirm_retries: u32) -> Self {
        Self {
            view,
            adapter,
            confirm_retries,
        }
    }

    /// Probe-engage-confirm for one item. Item-level failures never escape:
    /// every non-fatal error downgrades the item to `FailedFinal` and the
    /// caller proceeds to the next item. Only a fatal session error is
    /// returned as `Err`.
    pub async fn engage(
        &self,
        pacing: &mut dyn Pacing,
        item: &V::Handle,
    ) -> Result<ItemState, ViewError> {
        let control = match self.adapter.action_control(self.view, item).await {
            Ok(Some(control)) => control,
            Ok(None) => {
                tracing::debug!("action control not located for item");
                return Ok(ItemState::FailedFinal);
            }
            Err(e) => return downgrade(e, "action control lookup failed"),
        };

        match self.adapter.action_state(self.view, &control).await {
            Ok(ActionState::Engaged) => return Ok(ItemState::AlreadyDone),
            Ok(ActionState::NotEngaged) => {}
            // Never click a control whose state cannot be read back: the
            // confirm step would be meaningless and a click could toggle
            // an engaged item off.
            Ok(ActionState::Indeterminate) => {
                tracing::debug!("action control state indeterminate, not clicking");
                return Ok(ItemState::FailedFinal);
            }
            Err(e) => return downgrade(e, "action state probe failed"),
        }

        for attempt in 0..=self.confirm_retries {
            if let Err(e) = self.view.scroll_into_view(item).await {
                return downgrade(e, "scroll into view failed");
            }
            tokio::time::sleep(pacing.action_pause()).await;

            if let Err(e) = self.view.click(&control).await {
                return downgrade(e, "click failed");
            }
            tokio::time::sleep(pacing.action_pause()).await;

            match self.adapter.action_state(self.view, &control).await {
                Ok(ActionState::Engaged) => {
                    if attempt > 0 {
                        tracing::debug!(attempt, "action confirmed on retry");
                    }
                    return Ok(ItemState::Confirmed);
                }
                Ok(_) => {
                    tracing::debug!(attempt, "action not confirmed after click");
                }
                Err(e) => return downgrade(e, "confirm read failed"),
            }
        }

        tracing::warn!(
            retries = self.confirm_retries,
            "action never confirmed, giving up on item"
        );
        Ok(ItemState::FailedFinal)
    }
}

fn downgrade(e: ViewError, what: &str) -> Result<ItemState, ViewError> {
    if e.is_fatal() {
        return Err(e);
    }
    tracing::debug!(error = %e, "{what}, item dropped");
    Ok(ItemState::FailedFinal)
}
