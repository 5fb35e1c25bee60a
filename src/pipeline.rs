//! Per-link traversal orchestration.
//!
//! One `TraversalLoop` drives rounds of advance -> snapshot -> evaluate
//! over a single feed until the stagnation tracker calls it exhausted, the
//! absolute round cap trips, the view becomes unavailable, or a stop is
//! requested. Every link yields an [`Outcome`], never a silent drop, and
//! nothing that goes wrong on one link escapes to the next.

use crate::config::{Config, TraversalConfig};
use crate::engine::cursor::FeedCursor;
use crate::engine::key::resolve_key;
use crate::engine::pacing::Pacing;
use crate::engine::stagnation::StagnationTracker;
use crate::execution::{ActionExecutor, ItemState};
use crate::provider::ProviderAdapter;
use crate::view::ViewSession;
use std::collections::HashSet;
use std::time::Duration;
use tokio::sync::watch;

/// Why a link's traversal stopped.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TerminationReason {
    /// Stagnation threshold reached: the feed stopped yielding new items.
    Exhausted,
    /// Absolute round cap reached before the feed stagnated.
    RoundCapReached,
    /// The comment feed never opened or its container went missing.
    ViewUnavailable,
    /// Fatal session error or an external stop request.
    Aborted,
}

/// Per-link result, reported upward regardless of how the link ended.
#[derive(Debug, Clone)]
pub struct Outcome {
    pub link: String,
    pub items_seen: u64,
    pub items_acted: u64,
    pub reason: TerminationReason,
}

/// Aggregate counters over a whole run.
#[derive(Debug, Default, Clone, Copy)]
pub struct RunSummary {
    pub links_processed: u32,
    pub links_skipped: u32,
    pub total_seen: u64,
    pub total_acted: u64,
}

impl RunSummary {
    pub fn record(&mut self, outcome: &Outcome) {
        match outcome.reason {
            TerminationReason::Exhausted | TerminationReason::RoundCapReached => {
                self.links_processed += 1;
            }
            TerminationReason::ViewUnavailable | TerminationReason::Aborted => {
                self.links_skipped += 1;
            }
        }
        self.total_seen += outcome.items_seen;
        self.total_acted += outcome.items_acted;
    }
}

/// Cross-round state for one link. Created fresh per link, never persisted.
struct TraversalSession {
    seen_keys: HashSet<String>,
    items_acted: u64,
    round_index: u32,
}

impl TraversalSession {
    fn new() -> Self {
        Self {
            seen_keys: HashSet::new(),
            items_acted: 0,
            round_index: 0,
        }
    }

    fn outcome(&self, link: &str, reason: TerminationReason) -> Outcome {
        Outcome {
            link: link.to_string(),
            items_seen: self.seen_keys.len() as u64,
            items_acted: self.items_acted,
            reason,
        }
    }
}

pub struct TraversalLoop<'a, V: ViewSession, A: ProviderAdapter<V>> {
    view: &'a V,
    adapter: &'a A,
    traversal: TraversalConfig,
    scroll_step_px: u32,
    pacing: Box<dyn Pacing>,
    stop: watch::Receiver<bool>,
}

impl<'a, V: ViewSession, A: ProviderAdapter<V>> TraversalLoop<'a, V, A> {
    pub fn new(
        view: &'a V,
        adapter: &'a A,
        config: &Config,
        pacing: Box<dyn Pacing>,
        stop: watch::Receiver<bool>,
    ) -> Self {
        Self {
            view,
            adapter,
            traversal: config.traversal.clone(),
            scroll_step_px: config.pacing.scroll_step_px,
            pacing,
            stop,
        }
    }

    fn stop_requested(&self) -> bool {
        *self.stop.borrow()
    }

    /// Randomized pause between links, drawn from the pacing strategy.
    pub async fn pause_between_links(&mut self) {
        tokio::time::sleep(self.pacing.between_links_pause()).await;
    }

    /// Process one link start to finish. Infallible by contract: every
    /// failure mode is folded into the returned `Outcome`.
    pub async fn run_link(&mut self, link: &str) -> Outcome {
        let mut session = TraversalSession::new();
        tracing::info!(link, provider = self.adapter.name(), "processing link");

        if let Err(reason) = self.open_feed(link).await {
            return session.outcome(link, reason);
        }

        let cursor = FeedCursor::new(
            self.view,
            self.adapter.list_anchor_selector(),
            self.adapter.item_selector(),
            self.scroll_step_px,
            Duration::from_secs(5),
        );
        let executor = ActionExecutor::new(
            self.view,
            self.adapter,
            self.traversal.action_confirm_retries,
        );
        let mut stagnation = StagnationTracker::new(self.traversal.stagnation_threshold);

        while session.round_index < self.traversal.max_rounds {
            if self.stop_requested() {
                tracing::info!(link, "stop requested, aborting link at round boundary");
                return session.outcome(link, TerminationReason::Aborted);
            }

            if let Some(pause) = self.pacing.long_pause() {
                tracing::debug!(secs = pause.as_secs_f64(), "taking a longer pause");
                tokio::time::sleep(pause).await;
            }

            // Advancing. A failed advance still proceeds to snapshot: the
            // view may have moved partially, and repeated no-progress
            // rounds terminate through stagnation anyway.
            let delta = self.pacing.scroll_delta();
            match cursor.advance(self.pacing.as_mut(), delta).await {
                Ok(()) => {}
                Err(e) if e.is_fatal() => {
                    tracing::error!(link, error = %e, "fatal view error during advance");
                    return session.outcome(link, TerminationReason::Aborted);
                }
                Err(e) => {
                    tracing::warn!(link, error = %e, "cursor advance failed this round");
                }
            }

            // Snapshotting, with a bounded per-round retry budget.
            let items = match self.snapshot_with_retries(&cursor).await {
                Ok(items) => items,
                Err(reason) => {
                    return session.outcome(link, reason);
                }
            };

            // Evaluating.
            let mut new_keys = 0usize;
            for item in &items {
                if self.stop_requested() {
                    tracing::info!(link, "stop requested, aborting link at item boundary");
                    return session.outcome(link, TerminationReason::Aborted);
                }

                let input = match self.adapter.key_input(self.view, item).await {
                    Ok(input) => input,
                    Err(e) if e.is_fatal() => {
                        tracing::error!(link, error = %e, "fatal view error reading item");
                        return session.outcome(link, TerminationReason::Aborted);
                    }
                    // Not marked seen: the item stays eligible for a later
                    // round once its handle re-resolves cleanly.
                    Err(e) => {
                        tracing::debug!(error = %e, "item unreadable this round");
                        continue;
                    }
                };
                let Some(key) = resolve_key(&input, self.adapter.key_prefix_chars()) else {
                    tracing::debug!("unkeyable item dropped");
                    continue;
                };
                if !session.seen_keys.insert(key) {
                    continue;
                }
                new_keys += 1;

                let state = if self.pacing.skip_item() {
                    tracing::debug!(seen = session.seen_keys.len(), "natural skip");
                    ItemState::Skipped
                } else {
                    match executor.engage(self.pacing.as_mut(), item).await {
                        Ok(state) => state,
                        Err(e) => {
                            tracing::error!(link, error = %e, "fatal view error during action");
                            return session.outcome(link, TerminationReason::Aborted);
                        }
                    }
                };
                if state == ItemState::Confirmed {
                    session.items_acted += 1;
                    tracing::debug!(
                        acted = session.items_acted,
                        seen = session.seen_keys.len(),
                        "item engaged"
                    );
                }
            }

            // RoundComplete.
            session.round_index += 1;
            if stagnation.record_round(new_keys) {
                tracing::info!(
                    link,
                    rounds = session.round_index,
                    stagnant = stagnation.stagnant_rounds(),
                    "feed exhausted"
                );
                return session.outcome(link, TerminationReason::Exhausted);
            }
            if new_keys == 0 {
                tracing::debug!(
                    stagnant = stagnation.stagnant_rounds(),
                    threshold = stagnation.threshold(),
                    "no new items this round"
                );
            }

            if self.pacing.retreat() {
                let delta = self.pacing.retreat_delta();
                if let Err(e) = cursor.retreat(self.pacing.as_mut(), delta).await {
                    if e.is_fatal() {
                        tracing::error!(link, error = %e, "fatal view error during retreat");
                        return session.outcome(link, TerminationReason::Aborted);
                    }
                    tracing::debug!(error = %e, "retreat scroll failed");
                }
            }

            if session.round_index % 10 == 0 {
                tracing::info!(
                    link,
                    round = session.round_index,
                    seen = session.seen_keys.len(),
                    acted = session.items_acted,
                    "traversal progress"
                );
            }
        }

        tracing::info!(
            link,
            rounds = session.round_index,
            "round cap reached before stagnation"
        );
        session.outcome(link, TerminationReason::RoundCapReached)
    }

    /// Navigate to the link and open its comment feed, with a bounded
    /// attempt budget and growing pauses between attempts.
    async fn open_feed(&mut self, link: &str) -> Result<(), TerminationReason> {
        let attempts = self.traversal.feed_open_attempts.max(1);
        for attempt in 1..=attempts {
            if self.stop_requested() {
                return Err(TerminationReason::Aborted);
            }
            match self.adapter.open_feed(self.view, link).await {
                Ok(()) => {
                    tracing::debug!(link, attempt, "comment feed opened");
                    return Ok(());
                }
                Err(e) if e.is_fatal() => {
                    tracing::error!(link, error = %e, "fatal view error opening feed");
                    return Err(TerminationReason::Aborted);
                }
                Err(e) => {
                    tracing::warn!(link, attempt, attempts, error = %e, "open feed failed");
                    tokio::time::sleep(self.pacing.feed_open_backoff(attempt)).await;
                }
            }
        }
        tracing::warn!(link, "comment feed never opened, skipping link");
        Err(TerminationReason::ViewUnavailable)
    }

    async fn snapshot_with_retries(
        &mut self,
        cursor: &FeedCursor<'_, V>,
    ) -> Result<Vec<V::Handle>, TerminationReason> {
        let attempts = self.traversal.round_retry_attempts.max(1);
        for attempt in 1..=attempts {
            match cursor.snapshot().await {
                Ok(items) => return Ok(items),
                Err(e) if e.is_fatal() => {
                    tracing::error!(error = %e, "fatal view error during snapshot");
                    return Err(TerminationReason::Aborted);
                }
                Err(e) => {
                    tracing::debug!(attempt, attempts, error = %e, "snapshot failed");
                    tokio::time::sleep(self.pacing.scroll_pause()).await;
                }
            }
        }
        tracing::warn!("item container unavailable after retries, giving up on link");
        Err(TerminationReason::ViewUnavailable)
    }
}
