//! Scripted in-memory view for driving the traversal loop
//! deterministically, plus the matching test adapter.
//!
//! The view reveals items according to a per-snapshot script and hands out
//! epoch-stamped handles: any handle used after a newer snapshot reads as
//! stale, the same way a re-rendered DOM invalidates element references.

#![allow(dead_code)]

use async_trait::async_trait;
use likebot::engine::key::KeyInput;
use likebot::engine::pacing::Pacing;
use likebot::provider::{ActionState, LoginProbe, ProviderAdapter};
use likebot::view::{ViewError, ViewSession};
use std::sync::Mutex;
use std::time::Duration;

pub const ANCHOR: &str = "list";
pub const ITEM: &str = "item";
pub const CONTROL: &str = "like";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FakeHandle {
    Anchor { epoch: u64 },
    Item { index: usize, epoch: u64 },
    Control { index: usize, epoch: u64 },
}

#[derive(Debug, Clone)]
pub struct FakeItem {
    pub stable_id: Option<String>,
    pub text: String,
    pub engaged: bool,
    /// Clicks required before the control reads engaged; 0 never sticks.
    pub clicks_to_stick: u32,
    pub clicks: u32,
    pub has_control: bool,
    /// State probes that fail with a transient error before one succeeds.
    pub probe_errors: u32,
    pub indeterminate: bool,
}

impl FakeItem {
    pub fn new(text: &str) -> Self {
        Self {
            stable_id: None,
            text: text.to_string(),
            engaged: false,
            clicks_to_stick: 1,
            clicks: 0,
            has_control: true,
            probe_errors: 0,
            indeterminate: false,
        }
    }

    pub fn with_id(mut self, id: &str) -> Self {
        self.stable_id = Some(id.to_string());
        self
    }

    pub fn engaged(mut self) -> Self {
        self.engaged = true;
        self
    }

    pub fn needs_clicks(mut self, n: u32) -> Self {
        self.clicks_to_stick = n;
        self
    }

    pub fn never_sticks(mut self) -> Self {
        self.clicks_to_stick = 0;
        self
    }

    pub fn no_control(mut self) -> Self {
        self.has_control = false;
        self
    }

    pub fn probe_fails(mut self, n: u32) -> Self {
        self.probe_errors = n;
        self
    }

    pub fn indeterminate_state(mut self) -> Self {
        self.indeterminate = true;
        self
    }
}

struct State {
    items: Vec<FakeItem>,
    /// Item indices visible at the nth snapshot; the last entry repeats.
    script: Vec<Vec<usize>>,
    snapshots: usize,
    epoch: u64,
    anchor_missing: bool,
    fatal_on_click: bool,
    navigations: Vec<String>,
    anchor_misses: usize,
    element_scrolls: usize,
    window_scrolls: usize,
}

pub struct ScriptedView {
    state: Mutex<State>,
}

impl ScriptedView {
    pub fn new(items: Vec<FakeItem>, script: Vec<Vec<usize>>) -> Self {
        Self {
            state: Mutex::new(State {
                items,
                script,
                snapshots: 0,
                epoch: 0,
                anchor_missing: false,
                fatal_on_click: false,
                navigations: Vec::new(),
                anchor_misses: 0,
                element_scrolls: 0,
                window_scrolls: 0,
            }),
        }
    }

    /// Convenience: one script round revealing every item.
    pub fn single_round(items: Vec<FakeItem>) -> Self {
        let all: Vec<usize> = (0..items.len()).collect();
        Self::new(items, vec![all])
    }

    pub fn fail_anchor(&self) {
        self.state.lock().unwrap().anchor_missing = true;
    }

    pub fn fatal_on_click(&self) {
        self.state.lock().unwrap().fatal_on_click = true;
    }

    pub fn snapshots(&self) -> usize {
        self.state.lock().unwrap().snapshots
    }

    pub fn clicks(&self, index: usize) -> u32 {
        self.state.lock().unwrap().items[index].clicks
    }

    pub fn total_clicks(&self) -> u32 {
        self.state.lock().unwrap().items.iter().map(|i| i.clicks).sum()
    }

    pub fn item_engaged(&self, index: usize) -> bool {
        self.state.lock().unwrap().items[index].engaged
    }

    pub fn navigations(&self) -> Vec<String> {
        self.state.lock().unwrap().navigations.clone()
    }

    pub fn anchor_misses(&self) -> usize {
        self.state.lock().unwrap().anchor_misses
    }

    pub fn element_scrolls(&self) -> usize {
        self.state.lock().unwrap().element_scrolls
    }

    pub fn window_scrolls(&self) -> usize {
        self.state.lock().unwrap().window_scrolls
    }
}

fn check_epoch(current: u64, handle_epoch: u64) -> Result<(), ViewError> {
    if handle_epoch != current {
        return Err(ViewError::ElementStale);
    }
    Ok(())
}

#[async_trait]
impl ViewSession for ScriptedView {
    type Handle = FakeHandle;

    async fn navigate(&self, url: &str) -> Result<(), ViewError> {
        self.state.lock().unwrap().navigations.push(url.to_string());
        Ok(())
    }

    async fn wait_ready(&self, _timeout: Duration) -> Result<(), ViewError> {
        Ok(())
    }

    async fn find_anchor(
        &self,
        selector: &str,
        _timeout: Duration,
    ) -> Result<Self::Handle, ViewError> {
        let mut state = self.state.lock().unwrap();
        if selector != ANCHOR || state.anchor_missing {
            state.anchor_misses += 1;
            return Err(ViewError::ContainerNotFound(selector.to_string()));
        }
        Ok(FakeHandle::Anchor { epoch: state.epoch })
    }

    async fn find_all(
        &self,
        root: &Self::Handle,
        selector: &str,
    ) -> Result<Vec<Self::Handle>, ViewError> {
        assert!(matches!(root, FakeHandle::Anchor { .. }));
        assert_eq!(selector, ITEM);
        let mut state = self.state.lock().unwrap();
        // A snapshot is a re-render: older handles go stale.
        state.epoch += 1;
        let epoch = state.epoch;
        let round = state.snapshots.min(state.script.len().saturating_sub(1));
        state.snapshots += 1;
        let visible = state.script.get(round).cloned().unwrap_or_default();
        Ok(visible
            .into_iter()
            .map(|index| FakeHandle::Item { index, epoch })
            .collect())
    }

    async fn find_in(
        &self,
        root: &Self::Handle,
        selector: &str,
    ) -> Result<Option<Self::Handle>, ViewError> {
        let state = self.state.lock().unwrap();
        match *root {
            FakeHandle::Item { index, epoch } => {
                check_epoch(state.epoch, epoch)?;
                assert_eq!(selector, CONTROL);
                if state.items[index].has_control {
                    Ok(Some(FakeHandle::Control { index, epoch }))
                } else {
                    Ok(None)
                }
            }
            _ => Ok(None),
        }
    }

    async fn read_attribute(
        &self,
        handle: &Self::Handle,
        name: &str,
    ) -> Result<Option<String>, ViewError> {
        let mut state = self.state.lock().unwrap();
        match *handle {
            FakeHandle::Item { index, epoch } => {
                check_epoch(state.epoch, epoch)?;
                assert_eq!(name, "data-id");
                Ok(state.items[index].stable_id.clone())
            }
            FakeHandle::Control { index, epoch } => {
                check_epoch(state.epoch, epoch)?;
                assert_eq!(name, "engaged");
                let item = &mut state.items[index];
                if item.probe_errors > 0 {
                    item.probe_errors -= 1;
                    return Err(ViewError::Transient("probe race".to_string()));
                }
                if item.indeterminate {
                    return Ok(None);
                }
                Ok(Some(if item.engaged { "true" } else { "false" }.to_string()))
            }
            FakeHandle::Anchor { .. } => Ok(None),
        }
    }

    async fn read_text(&self, handle: &Self::Handle) -> Result<String, ViewError> {
        let state = self.state.lock().unwrap();
        match *handle {
            FakeHandle::Item { index, epoch } => {
                check_epoch(state.epoch, epoch)?;
                Ok(state.items[index].text.clone())
            }
            _ => Ok(String::new()),
        }
    }

    async fn click(&self, handle: &Self::Handle) -> Result<(), ViewError> {
        let mut state = self.state.lock().unwrap();
        if state.fatal_on_click {
            return Err(ViewError::SessionFatal("browser gone".to_string()));
        }
        match *handle {
            FakeHandle::Control { index, epoch } => {
                check_epoch(state.epoch, epoch)?;
                let item = &mut state.items[index];
                item.clicks += 1;
                if item.clicks_to_stick > 0 && item.clicks >= item.clicks_to_stick {
                    item.engaged = true;
                }
                Ok(())
            }
            _ => Err(ViewError::Transient("click on non-control".to_string())),
        }
    }

    async fn scroll_into_view(&self, handle: &Self::Handle) -> Result<(), ViewError> {
        let state = self.state.lock().unwrap();
        match *handle {
            FakeHandle::Item { epoch, .. } | FakeHandle::Control { epoch, .. } => {
                check_epoch(state.epoch, epoch)
            }
            FakeHandle::Anchor { .. } => Ok(()),
        }
    }

    async fn scroll_element_by(
        &self,
        _handle: &Self::Handle,
        _delta_px: i64,
    ) -> Result<(), ViewError> {
        self.state.lock().unwrap().element_scrolls += 1;
        Ok(())
    }

    async fn scroll_window_by(&self, _delta_px: i64) -> Result<(), ViewError> {
        self.state.lock().unwrap().window_scrolls += 1;
        Ok(())
    }
}

pub struct TestAdapter;

#[async_trait]
impl ProviderAdapter<ScriptedView> for TestAdapter {
    fn name(&self) -> &'static str {
        "scripted"
    }

    fn origin(&self) -> &'static str {
        "https://feed.test"
    }

    fn comments_control_selector(&self) -> &'static str {
        "open-comments"
    }

    fn list_anchor_selector(&self) -> &'static str {
        ANCHOR
    }

    fn item_selector(&self) -> &'static str {
        ITEM
    }

    fn login_probe(&self) -> LoginProbe {
        LoginProbe {
            login_button: "login",
            avatar: "avatar",
            challenge: "challenge",
        }
    }

    async fn key_input(
        &self,
        view: &ScriptedView,
        item: &FakeHandle,
    ) -> Result<KeyInput, ViewError> {
        let stable_id = view.read_attribute(item, "data-id").await?;
        let text = view.read_text(item).await?;
        Ok(KeyInput {
            stable_id,
            text,
            author: None,
        })
    }

    async fn action_control(
        &self,
        view: &ScriptedView,
        item: &FakeHandle,
    ) -> Result<Option<FakeHandle>, ViewError> {
        view.find_in(item, CONTROL).await
    }

    async fn action_state(
        &self,
        view: &ScriptedView,
        control: &FakeHandle,
    ) -> Result<ActionState, ViewError> {
        match view.read_attribute(control, "engaged").await?.as_deref() {
            Some("true") => Ok(ActionState::Engaged),
            Some("false") => Ok(ActionState::NotEngaged),
            _ => Ok(ActionState::Indeterminate),
        }
    }

    /// The scripted view has no comments panel to open; just navigate.
    async fn open_feed(&self, view: &ScriptedView, url: &str) -> Result<(), ViewError> {
        view.navigate(url).await
    }
}

/// Pacing that skips every eligible item, for exercising the skip policy.
pub struct AlwaysSkipPacing;

impl Pacing for AlwaysSkipPacing {
    fn scroll_delta(&mut self) -> u32 {
        600
    }

    fn scroll_pause(&mut self) -> Duration {
        Duration::ZERO
    }

    fn action_pause(&mut self) -> Duration {
        Duration::ZERO
    }

    fn long_pause(&mut self) -> Option<Duration> {
        None
    }

    fn skip_item(&mut self) -> bool {
        true
    }

    fn retreat(&mut self) -> bool {
        false
    }

    fn retreat_delta(&mut self) -> u32 {
        0
    }

    fn between_links_pause(&mut self) -> Duration {
        Duration::ZERO
    }

    fn feed_open_backoff(&mut self, _attempt: u32) -> Duration {
        Duration::ZERO
    }
}

/// Numbered unliked items, `item-0` .. `item-{n-1}`.
pub fn numbered_items(n: usize) -> Vec<FakeItem> {
    (0..n)
        .map(|i| FakeItem::new(&format!("comment number {i}")))
        .collect()
}
