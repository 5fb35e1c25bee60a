use anyhow::{Context, Result};
use serde::Deserialize;
use std::path::Path;

/// Top-level configuration, loaded from `config.toml`. Every field has a
/// default matching the tuning the traversal shipped with, so a missing
/// file or section still yields a runnable setup.
#[derive(Debug, Deserialize, Clone, Default)]
pub struct Config {
    #[serde(default)]
    pub provider: ProviderKind,
    #[serde(default)]
    pub traversal: TraversalConfig,
    #[serde(default)]
    pub pacing: PacingConfig,
    #[serde(default)]
    pub session: SessionConfig,
    #[serde(default)]
    pub links: LinksConfig,
}

#[derive(Debug, Deserialize, Clone, Copy, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum ProviderKind {
    #[default]
    Tiktok,
    Instagram,
}

/// Bounds and retry budgets for one feed traversal.
#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct TraversalConfig {
    /// Absolute cap on traversal rounds (secondary safety bound).
    pub max_rounds: u32,
    /// Consecutive rounds with zero new items before the feed is declared
    /// exhausted (primary termination condition).
    pub stagnation_threshold: u32,
    /// Snapshot re-acquisition attempts per round before the link is
    /// given up as unviewable.
    pub round_retry_attempts: u32,
    /// Corrective re-clicks after an unconfirmed action.
    pub action_confirm_retries: u32,
    /// Attempts to open the comment feed before skipping the link.
    pub feed_open_attempts: u32,
}

impl Default for TraversalConfig {
    fn default() -> Self {
        Self {
            max_rounds: 100,
            stagnation_threshold: 5,
            round_retry_attempts: 3,
            action_confirm_retries: 1,
            feed_open_attempts: 1,
        }
    }
}

/// Ranges for the human-mimicry delays and probabilities. All `*_range`
/// pairs are `[low, high]`; durations are seconds, distances pixels.
#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct PacingConfig {
    pub scroll_step_px: u32,
    pub scroll_delta_range: [u32; 2],
    pub scroll_pause_range: [f64; 2],
    pub action_pause_range: [f64; 2],
    pub long_pause_probability: f64,
    pub long_pause_range: [f64; 2],
    pub skip_probability: f64,
    pub retreat_probability: f64,
    pub retreat_delta_range: [u32; 2],
    pub between_links_range: [f64; 2],
    /// Base wait before re-opening a feed; multiplied by the attempt number.
    pub feed_open_backoff_range: [f64; 2],
}

impl Default for PacingConfig {
    fn default() -> Self {
        Self {
            scroll_step_px: 120,
            scroll_delta_range: [400, 1000],
            scroll_pause_range: [0.25, 0.9],
            action_pause_range: [0.6, 1.2],
            long_pause_probability: 0.05,
            long_pause_range: [5.0, 12.0],
            skip_probability: 0.15,
            retreat_probability: 0.08,
            retreat_delta_range: [80, 250],
            between_links_range: [2.0, 4.0],
            feed_open_backoff_range: [1.0, 1.6],
        }
    }
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct SessionConfig {
    /// Persistent Chrome profile directory (keeps the login warm).
    pub profile_dir: String,
    /// JSON file the session cookies are saved to.
    pub cookie_file: String,
    /// How long to wait for a manual login before giving up, seconds.
    pub login_timeout_s: u64,
    /// Poll interval while waiting for login or a challenge, seconds.
    pub login_poll_interval_s: u64,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            profile_dir: "./browser-profile".to_string(),
            cookie_file: "cookies.json".to_string(),
            login_timeout_s: 180,
            login_poll_interval_s: 2,
        }
    }
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct LinksConfig {
    /// Newline-separated list of feed URLs.
    pub file: String,
    /// Pre-validate links with an HTTP GET and drop dead ones.
    pub validate: bool,
    pub request_timeout_s: u64,
}

impl Default for LinksConfig {
    fn default() -> Self {
        Self {
            file: "links.txt".to_string(),
            validate: true,
            request_timeout_s: 10,
        }
    }
}

impl Config {
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read config file: {}", path.display()))?;
        let config: Config =
            toml::from_str(&content).with_context(|| "failed to parse config TOML")?;
        Ok(config)
    }

    /// Load the config file if present, otherwise fall back to defaults.
    pub fn load_or_default(path: &Path) -> Result<Self> {
        if path.exists() {
            Self::load(path)
        } else {
            tracing::info!(path = %path.display(), "no config file, using defaults");
            Ok(Config::default())
        }
    }
}
