//! TikTok comment-feed adapter.
//!
//! TikTok re-renders the comment DOM aggressively and rarely exposes a
//! stable comment id, so identity falls back to a long text prefix. The
//! like control carries its state in `aria-pressed`.

use super::{ActionState, LoginProbe, ProviderAdapter};
use crate::engine::key::KeyInput;
use crate::view::{ViewError, ViewSession};
use async_trait::async_trait;

const COMMENTS_CONTROL: &str = "div[class*='DivCommentListContainer'], \
     div[data-e2e*='comment-list'], \
     button span[data-e2e='comment-icon'], \
     button[aria-label*='comments'], \
     a[href*='#comments']";

const LIST_ANCHOR: &str = "div[class*='DivCommentListContainer'], \
     div[data-e2e*='comment-list'], \
     div[class*='DivCommentContainer']";

const ITEM: &str = "div[class*='DivCommentObjectWrapper']";

const LIKE_CONTROL: &str = "[role='button'][aria-label*='like'], \
     [aria-label*='like'][class*='like'], \
     div[data-e2e*='comment-like']";

pub struct TikTok;

#[async_trait]
impl<V: ViewSession> ProviderAdapter<V> for TikTok {
    fn name(&self) -> &'static str {
        "tiktok"
    }

    fn origin(&self) -> &'static str {
        "https://www.tiktok.com"
    }

    fn comments_control_selector(&self) -> &'static str {
        COMMENTS_CONTROL
    }

    fn list_anchor_selector(&self) -> &'static str {
        LIST_ANCHOR
    }

    fn item_selector(&self) -> &'static str {
        ITEM
    }

    fn login_probe(&self) -> LoginProbe {
        LoginProbe {
            login_button: "button[data-e2e='top-login-button']",
            avatar: "img[class*='ImgAvatar'], div[class*='DivAvatarContainer'] img",
            challenge: "iframe[src*='captcha'], div[id*='captcha'], \
                 div[class*='captcha'], div[role='dialog']",
        }
    }

    async fn key_input(&self, view: &V, item: &V::Handle) -> Result<KeyInput, ViewError> {
        let stable_id = match view.read_attribute(item, "data-id").await? {
            Some(id) => Some(id),
            None => view.read_attribute(item, "data-comment-id").await?,
        };
        let text = view.read_text(item).await?;
        Ok(KeyInput {
            stable_id,
            text,
            author: None,
        })
    }

    async fn action_control(
        &self,
        view: &V,
        item: &V::Handle,
    ) -> Result<Option<V::Handle>, ViewError> {
        view.find_in(item, LIKE_CONTROL).await
    }

    async fn action_state(
        &self,
        view: &V,
        control: &V::Handle,
    ) -> Result<ActionState, ViewError> {
        let pressed = view.read_attribute(control, "aria-pressed").await?;
        Ok(match pressed.as_deref().map(str::to_ascii_lowercase) {
            Some(v) if v == "true" => ActionState::Engaged,
            Some(_) => ActionState::NotEngaged,
            // Controls without the attribute render it once interacted
            // with; treat as not yet engaged.
            None => ActionState::NotEngaged,
        })
    }
}
