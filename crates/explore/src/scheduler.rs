//! Windowed exploration scheduling.
//!
//! Frames are grouped into windows of `window_length_max` frames, and each
//! window allows at most `random_action_max` exploration frames. The chance of
//! exploring a frame is the remaining quota over the remaining window, so the
//! quota is spread across the window and, once the two counters meet, every
//! remaining frame explores.

use crate::rng::Xorshift32;

/// Window and quota sizes for the scheduler.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WindowConfig {
    pub window_length_max: u32,
    pub random_action_max: u32,
}

impl Default for WindowConfig {
    fn default() -> Self {
        Self {
            window_length_max: 100,
            random_action_max: 5,
        }
    }
}

/// Per-frame exploration decision state.
///
/// Both counters start at 0, so the first call opens the first window.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExplorationScheduler {
    window_remaining: u32,
    window_length_max: u32,
    quota_remaining: u32,
    quota_max: u32,
}

impl ExplorationScheduler {
    /// # Panics
    /// If `config.window_length_max` is 0.
    pub fn new(config: WindowConfig) -> Self {
        assert!(
            config.window_length_max > 0,
            "window_length_max must be positive"
        );

        Self {
            window_remaining: 0,
            window_length_max: config.window_length_max,
            quota_remaining: 0,
            quota_max: config.random_action_max,
        }
    }

    /// Decide whether this frame explores. Call exactly once per frame.
    ///
    /// Order matters for replay: reset an exhausted window, compute the
    /// probability from the not-yet-decremented counters, draw once, spend
    /// quota on success, then always shrink the window.
    pub fn should_explore(&mut self, rng: &mut Xorshift32) -> bool {
        if self.window_remaining == 0 {
            self.window_remaining = self.window_length_max;
            self.quota_remaining = self.quota_max;
        }

        let probability = f64::from(self.quota_remaining) / f64::from(self.window_remaining);
        let r = rng.next_prob();
        let explore = f64::from(r) < probability;
        if explore {
            self.quota_remaining -= 1;
        }

        self.window_remaining -= 1;

        explore
    }

    pub fn window_remaining(&self) -> u32 {
        self.window_remaining
    }

    pub fn quota_remaining(&self) -> u32 {
        self.quota_remaining
    }

    pub fn config(&self) -> WindowConfig {
        WindowConfig {
            window_length_max: self.window_length_max,
            random_action_max: self.quota_max,
        }
    }
}
