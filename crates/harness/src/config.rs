//! Harness configuration.
//!
//! One struct replaces the per-variant constants of earlier harness builds;
//! every knob is chosen at construction time.

use tasrig_explore::{ActionProbabilities, WindowConfig};
use tasrig_wire::{RECORD_LEN, buttons};
use thiserror::Error;

// ============================================================================
// Defaults
// ============================================================================

/// Simulation frames per second at 1x speed.
pub const FRAME_RATE_HZ: u32 = 30;

/// Seed used when none is configured.
pub const DEFAULT_SEED: u32 = 22;

/// Longest run allowed by default, in seconds of 1x gameplay.
pub const DEFAULT_MAX_SECONDS: u32 = 600;

/// Default byte budget: 600 s of 30 fps records.
pub const DEFAULT_MAX_BYTES: u32 = DEFAULT_MAX_SECONDS * FRAME_RATE_HZ * RECORD_LEN as u32;

/// Human-watchable playback speed.
pub const MIN_PLAYBACK_SPEED: f32 = 2.0;

/// Speed used to skip through the early part of a long recording.
pub const MAX_PLAYBACK_SPEED: f32 = 100_000.0;

/// Seconds before the end of the loaded recording at which playback slows
/// down to `min_speed`.
pub const REWIND_SECONDS: f32 = 10.0;

/// Speed while the operator holds D-pad down during recording.
pub const FAST_FORWARD_SPEED: f32 = 10.0;

/// Speed after playback ends.
pub const NEUTRAL_SPEED: f32 = 1.0;

/// Largest accepted byte budget. Any larger and the last record's byte
/// count would not fit in a `u32`.
pub const MAX_BUDGET_BYTES: u32 = u32::MAX - (RECORD_LEN as u32 - 1);

/// Convert a rewind window in seconds of `min_speed` playback to bytes.
pub fn rewind_threshold_bytes(seconds: f32, min_speed: f32, frame_rate_hz: u32) -> u32 {
    (seconds * min_speed * frame_rate_hz as f32 * RECORD_LEN as f32) as u32
}

// ============================================================================
// Mode
// ============================================================================

/// What happens when recorded input runs out.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Mode {
    /// Keep going: record from the end of the stream.
    Record,
    /// Evaluation: the stream must cover the whole run.
    Playback,
}

impl Mode {
    /// `0` is playback, anything else records.
    pub fn from_flag(flag: u32) -> Self {
        if flag == 0 { Self::Playback } else { Self::Record }
    }

    pub fn is_record(&self) -> bool {
        matches!(self, Self::Record)
    }
}

// ============================================================================
// HarnessConfig
// ============================================================================

/// Invalid configuration values, reported before any file is touched.
#[derive(Debug, Error, PartialEq)]
pub enum ConfigError {
    #[error("window_length_max must be positive")]
    ZeroWindow,

    #[error("probability {name} must be within [0, 1], got {value}")]
    InvalidProbability { name: &'static str, value: f32 },

    #[error("{name} must be positive and finite, got {value}")]
    InvalidSpeed { name: &'static str, value: f32 },

    #[error("min_speed {min} exceeds max_speed {max}")]
    SpeedOrder { min: f32, max: f32 },

    #[error("max_bytes must be positive")]
    ZeroBudget,

    #[error("max_bytes {max_bytes} exceeds the largest budget {}", MAX_BUDGET_BYTES)]
    BudgetTooLarge { max_bytes: u32 },
}

#[derive(Debug, Clone, PartialEq)]
pub struct HarnessConfig {
    pub seed: u32,
    pub mode: Mode,
    /// Run is fatal once this many bytes have been played or recorded.
    pub max_bytes: u32,
    pub window: WindowConfig,
    pub probabilities: ActionProbabilities,
    pub min_speed: f32,
    pub max_speed: f32,
    /// Playback runs at `max_speed` until this many bytes remain in the
    /// loaded recording.
    pub rewind_threshold_bytes: u32,
    /// Held during playback in record mode to take over.
    pub takeover_button: u16,
    /// Enable D-pad controls and the START resume guard while recording.
    pub operator_controls: bool,
}

impl Default for HarnessConfig {
    fn default() -> Self {
        Self {
            seed: DEFAULT_SEED,
            mode: Mode::Record,
            max_bytes: DEFAULT_MAX_BYTES,
            window: WindowConfig::default(),
            probabilities: ActionProbabilities::default(),
            min_speed: MIN_PLAYBACK_SPEED,
            max_speed: MAX_PLAYBACK_SPEED,
            rewind_threshold_bytes: rewind_threshold_bytes(
                REWIND_SECONDS,
                MIN_PLAYBACK_SPEED,
                FRAME_RATE_HZ,
            ),
            takeover_button: buttons::START_BUTTON,
            operator_controls: true,
        }
    }
}

impl HarnessConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.window.window_length_max == 0 {
            return Err(ConfigError::ZeroWindow);
        }

        let probabilities = [
            ("a", self.probabilities.a),
            ("b", self.probabilities.b),
            ("trigger", self.probabilities.trigger),
        ];
        for (name, value) in probabilities {
            if !(0.0..=1.0).contains(&value) {
                return Err(ConfigError::InvalidProbability { name, value });
            }
        }

        for (name, value) in [("min_speed", self.min_speed), ("max_speed", self.max_speed)] {
            if !value.is_finite() || value <= 0.0 {
                return Err(ConfigError::InvalidSpeed { name, value });
            }
        }
        if self.min_speed > self.max_speed {
            return Err(ConfigError::SpeedOrder {
                min: self.min_speed,
                max: self.max_speed,
            });
        }

        if self.max_bytes == 0 {
            return Err(ConfigError::ZeroBudget);
        }
        if self.max_bytes > MAX_BUDGET_BYTES {
            return Err(ConfigError::BudgetTooLarge {
                max_bytes: self.max_bytes,
            });
        }

        Ok(())
    }

    /// Fast playback speed actually used. Evaluation runs are watched start to
    /// finish, so playback mode never goes above `min_speed`.
    pub fn effective_max_speed(&self) -> f32 {
        match self.mode {
            Mode::Record => self.max_speed,
            Mode::Playback => self.min_speed,
        }
    }
}
