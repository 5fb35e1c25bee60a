//! End-of-feed detection.
//!
//! Virtualized feeds legitimately need several rounds to render newly
//! requested content, so a single empty round is not exhaustion. Repeated
//! rounds that contribute no previously-unseen keys are.

pub struct StagnationTracker {
    threshold: u32,
    stagnant: u32,
}

impl StagnationTracker {
    pub fn new(threshold: u32) -> Self {
        Self {
            threshold: threshold.max(1),
            stagnant: 0,
        }
    }

    /// Record the number of new keys a round discovered. Returns `true`
    /// when enough consecutive stagnant rounds have accumulated to call
    /// the feed exhausted.
    pub fn record_round(&mut self, new_keys: usize) -> bool {
        if new_keys == 0 {
            self.stagnant += 1;
        } else {
            self.stagnant = 0;
        }
        self.stagnant >= self.threshold
    }

    pub fn stagnant_rounds(&self) -> u32 {
        self.stagnant
    }

    pub fn threshold(&self) -> u32 {
        self.threshold
    }
}
