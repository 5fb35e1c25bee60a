//! Randomized pacing so the traversal rate resembles organic reading.
//!
//! Purely temporal shaping: pacing decides how long to pause and whether
//! to skip or back-scroll, never whether the traversal is correct or done.
//! Callers perform the actual sleeps so a disabled strategy makes the
//! whole engine deterministic in tests.

use crate::config::PacingConfig;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use std::time::Duration;

pub trait Pacing: Send {
    /// Total scroll distance for the next cursor advance, in pixels.
    fn scroll_delta(&mut self) -> u32;
    /// Pause between scroll sub-steps.
    fn scroll_pause(&mut self) -> Duration;
    /// Pause surrounding an action attempt.
    fn action_pause(&mut self) -> Duration;
    /// Occasional materially longer "reading break".
    fn long_pause(&mut self) -> Option<Duration>;
    /// Whether to skip an otherwise-eligible item.
    fn skip_item(&mut self) -> bool;
    /// Whether to back-scroll after this round.
    fn retreat(&mut self) -> bool;
    /// Reverse-scroll distance, in pixels.
    fn retreat_delta(&mut self) -> u32;
    /// Pause between links.
    fn between_links_pause(&mut self) -> Duration;
    /// Backoff before re-trying to open a feed, growing with the attempt.
    fn feed_open_backoff(&mut self, attempt: u32) -> Duration;
}

/// Production pacing: uniform draws from the configured ranges.
pub struct HumanPacing {
    config: PacingConfig,
    rng: StdRng,
}

impl HumanPacing {
    pub fn new(config: PacingConfig) -> Self {
        Self {
            config,
            rng: StdRng::from_entropy(),
        }
    }

    /// Fixed-seed constructor for reproducible runs and tests.
    pub fn seeded(config: PacingConfig, seed: u64) -> Self {
        Self {
            config,
            rng: StdRng::seed_from_u64(seed),
        }
    }

    fn secs_in(&mut self, range: [f64; 2]) -> Duration {
        let [lo, hi] = range;
        let secs = if hi > lo { self.rng.gen_range(lo..=hi) } else { lo };
        Duration::from_secs_f64(secs.max(0.0))
    }

    fn px_in(&mut self, range: [u32; 2]) -> u32 {
        let [lo, hi] = range;
        if hi > lo {
            self.rng.gen_range(lo..=hi)
        } else {
            lo
        }
    }
}

impl Pacing for HumanPacing {
    fn scroll_delta(&mut self) -> u32 {
        self.px_in(self.config.scroll_delta_range)
    }

    fn scroll_pause(&mut self) -> Duration {
        self.secs_in(self.config.scroll_pause_range)
    }

    fn action_pause(&mut self) -> Duration {
        self.secs_in(self.config.action_pause_range)
    }

    fn long_pause(&mut self) -> Option<Duration> {
        if self.rng.gen::<f64>() < self.config.long_pause_probability {
            Some(self.secs_in(self.config.long_pause_range))
        } else {
            None
        }
    }

    fn skip_item(&mut self) -> bool {
        self.rng.gen::<f64>() < self.config.skip_probability
    }

    fn retreat(&mut self) -> bool {
        self.rng.gen::<f64>() < self.config.retreat_probability
    }

    fn retreat_delta(&mut self) -> u32 {
        self.px_in(self.config.retreat_delta_range)
    }

    fn between_links_pause(&mut self) -> Duration {
        self.secs_in(self.config.between_links_range)
    }

    fn feed_open_backoff(&mut self, attempt: u32) -> Duration {
        let base = self.secs_in(self.config.feed_open_backoff_range);
        base.mul_f64(f64::from(attempt.max(1)))
    }
}

/// Pacing with all randomness removed: zero pauses, never skips, never
/// retreats. Used by the deterministic tests.
pub struct DisabledPacing {
    scroll_delta: u32,
}

impl DisabledPacing {
    pub fn new() -> Self {
        Self { scroll_delta: 600 }
    }
}

impl Default for DisabledPacing {
    fn default() -> Self {
        Self::new()
    }
}

impl Pacing for DisabledPacing {
    fn scroll_delta(&mut self) -> u32 {
        self.scroll_delta
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
        false
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
