//! Per-item error containment, confirm-retry, and idempotence.

mod common;

use common::{numbered_items, FakeItem, ScriptedView, TestAdapter};
use likebot::config::Config;
use likebot::engine::pacing::DisabledPacing;
use likebot::pipeline::{Outcome, TerminationReason, TraversalLoop};
use tokio::sync::watch;

fn test_config() -> Config {
    let mut config = Config::default();
    config.traversal.stagnation_threshold = 1;
    config.traversal.action_confirm_retries = 1;
    config
}

async fn run_once(view: &ScriptedView, config: &Config) -> Outcome {
    let (_tx, rx) = watch::channel(false);
    let mut traversal =
        TraversalLoop::new(view, &TestAdapter, config, Box::new(DisabledPacing::new()), rx);
    traversal.run_link("https://feed.test/v/0").await
}

#[tokio::test]
async fn test_probe_failure_contained_to_one_item() {
    // The middle item's state probe always fails; its neighbours must
    // still be evaluated and acted on.
    let items = vec![
        FakeItem::new("first"),
        FakeItem::new("second").probe_fails(10),
        FakeItem::new("third"),
    ];
    let view = ScriptedView::single_round(items);
    let outcome = run_once(&view, &test_config()).await;

    assert_eq!(outcome.reason, TerminationReason::Exhausted);
    assert_eq!(outcome.items_seen, 3);
    assert_eq!(outcome.items_acted, 2);
    assert_eq!(view.clicks(0), 1);
    assert_eq!(view.clicks(1), 0);
    assert_eq!(view.clicks(2), 1);
}

#[tokio::test]
async fn test_transient_probe_error_consumes_item_for_the_session() {
    // One failed probe downgrades the item permanently: its key is
    // already seen, so a later round does not retry it.
    let items = vec![FakeItem::new("flaky").probe_fails(1)];
    let view = ScriptedView::new(items, vec![vec![0], vec![0]]);
    let outcome = run_once(&view, &test_config()).await;

    assert_eq!(outcome.items_seen, 1);
    assert_eq!(outcome.items_acted, 0);
    assert_eq!(view.clicks(0), 0);
}

#[tokio::test]
async fn test_unconfirmed_click_retried_exactly_once() {
    let items = vec![
        // Sticks on the second click: confirmed on the retry.
        FakeItem::new("slow to stick").needs_clicks(2),
        // Never sticks: one initial click plus one retry, then dropped.
        FakeItem::new("never sticks").never_sticks(),
    ];
    let view = ScriptedView::single_round(items);
    let outcome = run_once(&view, &test_config()).await;

    assert_eq!(outcome.items_acted, 1);
    assert_eq!(view.clicks(0), 2);
    assert!(view.item_engaged(0));
    assert_eq!(view.clicks(1), 2);
    assert!(!view.item_engaged(1));
}

#[tokio::test]
async fn test_already_engaged_item_never_reclicked() {
    let items = vec![FakeItem::new("old favourite").engaged(), FakeItem::new("new")];
    let view = ScriptedView::new(items, vec![vec![0, 1], vec![0, 1]]);
    let outcome = run_once(&view, &test_config()).await;

    // AlreadyDone counts as seen but never as acted, and repeated
    // discovery never toggles it off.
    assert_eq!(outcome.items_seen, 2);
    assert_eq!(outcome.items_acted, 1);
    assert_eq!(view.clicks(0), 0);
    assert!(view.item_engaged(0));
}

#[tokio::test]
async fn test_acting_twice_across_links_stays_idempotent() {
    // The same feed processed as two independent links: the second pass
    // finds everything already engaged and mutates nothing.
    let view = ScriptedView::new(numbered_items(3), vec![(0..3).collect()]);
    let config = test_config();

    let (_tx, rx) = watch::channel(false);
    let mut traversal =
        TraversalLoop::new(&view, &TestAdapter, &config, Box::new(DisabledPacing::new()), rx);

    let first = traversal.run_link("https://feed.test/v/1").await;
    assert_eq!(first.items_acted, 3);

    let second = traversal.run_link("https://feed.test/v/1").await;
    assert_eq!(second.items_seen, 3);
    assert_eq!(second.items_acted, 0);
    assert_eq!(view.total_clicks(), 3);
}

#[tokio::test]
async fn test_missing_control_drops_item_only() {
    let items = vec![FakeItem::new("no button").no_control(), FakeItem::new("fine")];
    let view = ScriptedView::single_round(items);
    let outcome = run_once(&view, &test_config()).await;

    assert_eq!(outcome.items_seen, 2);
    assert_eq!(outcome.items_acted, 1);
    assert_eq!(view.clicks(1), 1);
}

#[tokio::test]
async fn test_indeterminate_state_is_never_clicked_blindly() {
    let items = vec![FakeItem::new("unreadable").indeterminate_state()];
    let view = ScriptedView::single_round(items);
    let outcome = run_once(&view, &test_config()).await;

    assert_eq!(outcome.items_seen, 1);
    assert_eq!(outcome.items_acted, 0);
    assert_eq!(view.clicks(0), 0);
}
