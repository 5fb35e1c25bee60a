//! Instagram reels comment-feed adapter.
//!
//! Instagram's obfuscated utility classes leave no stable comment id, so
//! identity is the author handle plus a text prefix. The like control is a
//! button whose inner svg carries `aria-label="Like"` or `"Unlike"`.
//! Comment blocks also contain author and timestamp spans; the timestamp
//! ("3w", "5d", "2h") must not be mistaken for comment text.

use super::{ActionState, LoginProbe, ProviderAdapter};
use crate::engine::key::KeyInput;
use crate::view::{ViewError, ViewSession};
use async_trait::async_trait;

const COMMENTS_CONTROL: &str = "svg[aria-label='Comment']";

const LIST_ANCHOR: &str = "div.x78zum5.xdt5ytf.x1iyjqo2.xh8yej3";

const ITEM: &str = "div.html-div.xdj266r.x14z9mp.xat24cr.x1lziwak.xexx8yu.xyri2b.x18d9i69\
    .x1c1uobl.x9f619.xjbqb8w.x78zum5.x15mokao.x1ga7v0g.x16uus16.xbiv7yw.x1uhb9sk\
    .x1plvlek.xryxfnj.x1iyjqo2.x2lwn1j.xeuugli.x1q0g3np.xqjyukv.x1qjc9v5.x1oa3qoh.x1nhvcw1";

const USERNAME: &str = "span._ap3a._aaco._aacw._aacx._aad7._aade";

const TEXT_SPANS: &str = "span[class*='x193iq5w'][class*='xeuugli'][class*='x1fj9vlw']";

const LIKE_BLOCK: &str = "span.xjkvuk6";
const LIKE_BUTTON: &str = "div[role='button']";

pub struct Instagram;

/// Pick the span holding the actual comment text: not the author handle
/// and not a relative timestamp like "3w" / "5d" / "2h".
pub(crate) fn pick_comment_text<I>(spans: I, username: &str) -> Option<String>
where
    I: IntoIterator<Item = String>,
{
    spans.into_iter().map(|s| s.trim().to_string()).find(|text| {
        !text.is_empty()
            && text != username
            && !looks_like_timestamp(text)
    })
}

fn looks_like_timestamp(text: &str) -> bool {
    let Some(last) = text.chars().last() else {
        return false;
    };
    matches!(last, 'w' | 'd' | 'h')
        && text.len() <= 4
        && text[..text.len() - 1].chars().all(|c| c.is_ascii_digit())
}

#[async_trait]
impl<V: ViewSession> ProviderAdapter<V> for Instagram {
    fn name(&self) -> &'static str {
        "instagram"
    }

    fn origin(&self) -> &'static str {
        "https://www.instagram.com"
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
            login_button: "a[href*='/accounts/login/'], button[type='submit']",
            avatar: "img[alt*='profile picture']",
            challenge: "iframe[src*='captcha'], div[id*='captcha'], div[class*='captcha']",
        }
    }

    fn key_prefix_chars(&self) -> usize {
        100
    }

    async fn key_input(&self, view: &V, item: &V::Handle) -> Result<KeyInput, ViewError> {
        let username = match view.find_in(item, USERNAME).await? {
            Some(handle) => view.read_text(&handle).await?.trim().to_string(),
            None => String::new(),
        };

        let mut spans = Vec::new();
        for span in view.find_all(item, TEXT_SPANS).await? {
            spans.push(view.read_text(&span).await?);
        }
        let text = pick_comment_text(spans, &username).unwrap_or_default();

        Ok(KeyInput {
            stable_id: None,
            text,
            author: (!username.is_empty()).then_some(username),
        })
    }

    async fn action_control(
        &self,
        view: &V,
        item: &V::Handle,
    ) -> Result<Option<V::Handle>, ViewError> {
        let Some(block) = view.find_in(item, LIKE_BLOCK).await? else {
            return Ok(None);
        };
        view.find_in(&block, LIKE_BUTTON).await
    }

    async fn action_state(
        &self,
        view: &V,
        control: &V::Handle,
    ) -> Result<ActionState, ViewError> {
        let Some(svg) = view.find_in(control, "svg").await? else {
            return Ok(ActionState::Indeterminate);
        };
        let label = view.read_attribute(&svg, "aria-label").await?;
        Ok(match label.as_deref() {
            Some("Like") => ActionState::NotEngaged,
            Some("Unlike") => ActionState::Engaged,
            _ => ActionState::Indeterminate,
        })
    }
}
