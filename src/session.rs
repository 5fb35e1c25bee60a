//! Browser session bootstrap: persistent profile, cookie persistence,
//! login and challenge handling.
//!
//! Everything here is one-shot I/O around the traversal core. The browser
//! runs headed so a human can complete logins and captchas; cookies are
//! saved next to the profile so later runs skip the login entirely.

use crate::config::SessionConfig;
use crate::provider::LoginProbe;
use crate::view::cdp::CdpView;
use crate::view::ViewSession;
use anyhow::{Context, Result};
use chromiumoxide::cdp::browser_protocol::network::{Cookie, CookieParam, TimeSinceEpoch};
use chromiumoxide::{Browser, BrowserConfig, Page};
use futures_util::StreamExt;
use std::path::PathBuf;
use std::time::Duration;
use tokio::task::JoinHandle;
use tokio::time::Instant;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoginStatus {
    LoggedIn,
    LoggedOut,
    Unknown,
}

pub struct BrowserSession {
    browser: Browser,
    handler_task: JoinHandle<()>,
    page: Page,
    view: CdpView,
    cookie_file: PathBuf,
}

impl BrowserSession {
    /// Launch headed Chrome with a persistent user-data dir and the
    /// automation fingerprint switches disabled.
    pub async fn launch(config: &SessionConfig) -> Result<Self> {
        let browser_config = BrowserConfig::builder()
            .with_head()
            .user_data_dir(&config.profile_dir)
            .arg("--disable-blink-features=AutomationControlled")
            .arg("--log-level=3")
            .build()
            .map_err(|e| anyhow::anyhow!("browser config: {e}"))?;

        let (browser, mut handler) = Browser::launch(browser_config)
            .await
            .context("failed to launch chrome")?;

        // The handler loop must be polled for the CDP connection to make
        // progress; it ends when the browser process goes away.
        let handler_task = tokio::spawn(async move {
            while let Some(event) = handler.next().await {
                if let Err(e) = event {
                    tracing::debug!(error = %e, "cdp handler event error");
                }
            }
        });

        let page = browser
            .new_page("about:blank")
            .await
            .context("failed to open a page")?;
        let view = CdpView::new(page.clone());

        tracing::info!(profile = %config.profile_dir, "browser session started");
        Ok(Self {
            browser,
            handler_task,
            page,
            view,
            cookie_file: PathBuf::from(&config.cookie_file),
        })
    }

    pub fn view(&self) -> &CdpView {
        &self.view
    }

    /// Get to a logged-in state on the provider's origin: restore saved
    /// cookies when possible, otherwise wait for a manual login and save
    /// the cookies it produces.
    pub async fn ensure_logged_in(
        &self,
        origin: &str,
        probe: &LoginProbe,
        config: &SessionConfig,
    ) -> Result<()> {
        self.view.navigate(origin).await?;
        let _ = self.view.wait_ready(Duration::from_secs(10)).await;

        match self.load_cookies().await {
            Ok(true) => {
                // Cookies installed; reload so they take effect.
                self.view.navigate(origin).await?;
                let _ = self.view.wait_ready(Duration::from_secs(10)).await;
            }
            Ok(false) => {
                tracing::info!("no saved cookies, manual login may be required");
            }
            Err(e) => {
                tracing::warn!(error = %e, "failed to load saved cookies");
            }
        }

        match self.login_status(probe).await {
            LoginStatus::LoggedIn => {
                tracing::info!("already logged in");
                Ok(())
            }
            status => {
                tracing::info!(?status, "waiting for manual login in the browser window");
                self.wait_for_manual_login(probe, config).await?;
                if let Err(e) = self.save_cookies().await {
                    tracing::warn!(error = %e, "failed to save cookies after login");
                }
                Ok(())
            }
        }
    }

    /// Classify the page as logged-in, logged-out, or unknown from the
    /// provider's login-button and avatar selectors.
    pub async fn login_status(&self, probe: &LoginProbe) -> LoginStatus {
        if self.element_present(probe.login_button, Duration::from_secs(2)).await {
            return LoginStatus::LoggedOut;
        }
        if self.element_present(probe.avatar, Duration::from_secs(4)).await {
            return LoginStatus::LoggedIn;
        }
        LoginStatus::Unknown
    }

    /// Block until the avatar appears or the configured timeout expires.
    pub async fn wait_for_manual_login(
        &self,
        probe: &LoginProbe,
        config: &SessionConfig,
    ) -> Result<()> {
        let deadline = Instant::now() + Duration::from_secs(config.login_timeout_s);
        loop {
            match self.login_status(probe).await {
                LoginStatus::LoggedIn => {
                    tracing::info!("login detected");
                    return Ok(());
                }
                LoginStatus::LoggedOut => {
                    tracing::info!("login button still visible, waiting");
                }
                LoginStatus::Unknown => {
                    tracing::debug!("login state unknown, waiting");
                }
            }
            if Instant::now() >= deadline {
                anyhow::bail!(
                    "timed out after {}s waiting for manual login",
                    config.login_timeout_s
                );
            }
            tokio::time::sleep(Duration::from_secs(config.login_poll_interval_s)).await;
        }
    }

    /// Detect a captcha/challenge overlay and block until it clears or an
    /// avatar appears. Bounded by the login timeout so a dead page cannot
    /// hang the run.
    pub async fn resolve_challenge(&self, probe: &LoginProbe, config: &SessionConfig) -> Result<()> {
        if !self.element_present(probe.challenge, Duration::from_secs(1)).await {
            return Ok(());
        }
        tracing::warn!("challenge detected, solve it manually in the browser");
        let deadline = Instant::now() + Duration::from_secs(config.login_timeout_s);
        loop {
            if self.element_present(probe.avatar, Duration::from_secs(1)).await {
                tracing::info!("avatar visible, challenge resolved");
                return Ok(());
            }
            if !self.element_present(probe.challenge, Duration::from_secs(1)).await {
                tracing::info!("challenge gone, resuming");
                return Ok(());
            }
            if Instant::now() >= deadline {
                anyhow::bail!("challenge not resolved within {}s", config.login_timeout_s);
            }
            tokio::time::sleep(Duration::from_secs(config.login_poll_interval_s)).await;
        }
    }

    async fn element_present(&self, selector: &str, wait: Duration) -> bool {
        matches!(self.view.find_anchor(selector, wait).await, Ok(_))
    }

    /// Save the current session cookies as JSON next to the profile.
    pub async fn save_cookies(&self) -> Result<()> {
        let cookies = self
            .page
            .get_cookies()
            .await
            .context("failed to read cookies")?;
        let params: Vec<CookieParam> = cookies
            .into_iter()
            .filter_map(|c| cookie_to_param(c).ok())
            .collect();
        let json = serde_json::to_string_pretty(&params)?;
        std::fs::write(&self.cookie_file, json)
            .with_context(|| format!("failed to write {}", self.cookie_file.display()))?;
        tracing::info!(path = %self.cookie_file.display(), "cookies saved");
        Ok(())
    }

    /// Install saved cookies into the page. `Ok(false)` means there was no
    /// cookie file, which is a first run, not an error.
    pub async fn load_cookies(&self) -> Result<bool> {
        let json = match std::fs::read_to_string(&self.cookie_file) {
            Ok(json) => json,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(false),
            Err(e) => {
                return Err(e).with_context(|| {
                    format!("failed to read {}", self.cookie_file.display())
                })
            }
        };
        let params: Vec<CookieParam> =
            serde_json::from_str(&json).context("cookie file is not valid JSON")?;
        let count = params.len();
        self.page
            .set_cookies(params)
            .await
            .context("failed to install cookies")?;
        tracing::info!(count, path = %self.cookie_file.display(), "cookies loaded");
        Ok(true)
    }

    pub async fn close(self) -> Result<()> {
        let mut browser = self.browser;
        if let Err(e) = browser.close().await {
            tracing::debug!(error = %e, "browser close failed");
        }
        let _ = browser.wait().await;
        self.handler_task.abort();
        Ok(())
    }
}

fn cookie_to_param(cookie: Cookie) -> std::result::Result<CookieParam, String> {
    CookieParam::builder()
        .name(cookie.name)
        .value(cookie.value)
        .domain(cookie.domain)
        .path(cookie.path)
        .secure(cookie.secure)
        .http_only(cookie.http_only)
        .expires(TimeSinceEpoch::new(cookie.expires))
        .build()
}
