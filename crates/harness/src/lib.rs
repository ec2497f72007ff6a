//! tasrig Harness
//!
//! Sits between a simulation driver and its per-frame controller input.
//! Each frame the driver hands over the live pad and gets back the pad the
//! simulation must actually use, which may be:
//! - the live pad, unchanged
//! - the next record of a previously captured stream (playback)
//! - a synthetic exploration pad, which during playback must also match the
//!   record exactly
//!
//! Recording starts where playback ends. Every fatal condition is returned
//! as a [`HarnessError`]; the driver decides when to call
//! [`Harness::terminate`].
//!
//! # Frame order
//!
//! 1. `resolve_frame_input(live)`: budget check, scheduler draw, pad
//!    generation, record read or write
//! 2. the driver advances its simulation with the returned pad
//! 3. `reseed_with(word)` for each word of simulation state, in a fixed order
//!
//! Changing this order changes every exploration pad after it.

#![deny(unsafe_code)]

pub mod config;
pub mod controller;
pub mod driver;
pub mod error;

use std::path::Path;

use tasrig_replay::{InputStore, RunSummary};
use tasrig_wire::{Pad, RunReport};
use tracing::error;

pub use config::{ConfigError, HarnessConfig, Mode};
pub use controller::{ControllerState, FrameOutcome, FrameSource, RunStats, Transition};
pub use driver::{
    Driver, LiveInput, NeutralInput, Pacer, RunEnd, ScriptedInput, Simulation, StopReason,
};
pub use error::HarnessError;

use controller::Controller;

/// End reason recorded when the simulation reports it is done.
pub const END_REASON_COMPLETE: &str = "complete";

/// End reason recorded when the driver stopped after a fixed frame count.
pub const END_REASON_FRAME_LIMIT: &str = "frame_limit";

/// Driver-facing handle over one input stream. Independent handles share
/// nothing, so several runs can execute side by side.
pub struct Harness {
    controller: Controller,
}

impl Harness {
    /// Open (or create) the stream at `path` and set up PRNG and scheduler
    /// state from `config`.
    pub fn init(config: HarnessConfig, path: impl AsRef<Path>) -> Result<Self, HarnessError> {
        config.validate()?;
        let store = InputStore::open(path)?;
        Ok(Self {
            controller: Controller::new(config, store),
        })
    }

    /// Pad the simulation should use this frame.
    pub fn resolve_frame_input(&mut self, live: Pad) -> Result<Pad, HarnessError> {
        self.step(live).map(|outcome| outcome.pad)
    }

    /// Like [`resolve_frame_input`](Self::resolve_frame_input) with the
    /// frame's bookkeeping attached.
    pub fn step(&mut self, live: Pad) -> Result<FrameOutcome, HarnessError> {
        self.controller.step(live)
    }

    /// Pacing multiplier for the frame just resolved.
    pub fn current_speed_multiplier(&self) -> f32 {
        self.controller.speed()
    }

    /// Mix one word of simulation state into the PRNG.
    pub fn reseed_with(&mut self, external_state: u32) {
        self.controller.reseed(external_state);
    }

    pub fn state(&self) -> ControllerState {
        self.controller.state()
    }

    pub fn config(&self) -> &HarnessConfig {
        self.controller.config()
    }

    pub fn stats(&self) -> RunStats {
        self.controller.stats()
    }

    /// Bytes played or recorded so far.
    pub fn bytes(&self) -> u32 {
        self.controller.bytes()
    }

    /// Current PRNG state.
    pub fn rng_state(&self) -> u32 {
        self.controller.explorer().rng().state()
    }

    pub fn stream_path(&self) -> &Path {
        self.controller.store().path()
    }

    /// Truncate the stream to the bytes played or recorded so far and
    /// flush it.
    pub fn finalize(&mut self) -> Result<(), HarnessError> {
        self.controller.finalize()
    }

    /// Flush without discarding records playback has not reached yet, so a
    /// paused run can pick up where it left off.
    pub fn finalize_keep_tail(&mut self) -> Result<(), HarnessError> {
        self.controller.finalize_keep_tail()
    }

    /// Facts about the run so far, for a report.
    pub fn summary(&self, end_reason: &str, exit_code: i32) -> RunSummary {
        let config = self.config();
        let stats = self.stats();
        RunSummary {
            seed: config.seed,
            record_mode: config.mode.is_record(),
            window_length_max: config.window.window_length_max,
            random_action_max: config.window.random_action_max,
            max_bytes: config.max_bytes,
            frames_played: stats.frames_played,
            frames_recorded: stats.frames_recorded,
            frames_explored: stats.frames_explored,
            end_reason: end_reason.to_string(),
            exit_code,
        }
    }

    /// Finalize, then build a report over the finalized stream.
    pub fn finish(&mut self, end_reason: &str, exit_code: i32) -> Result<RunReport, HarnessError> {
        self.finalize()?;
        self.report(end_reason, exit_code)
    }

    /// [`finalize_keep_tail`](Self::finalize_keep_tail), then report. The
    /// run ended cleanly, so the exit code is 0.
    pub fn pause(&mut self, end_reason: &str) -> Result<RunReport, HarnessError> {
        self.finalize_keep_tail()?;
        self.report(end_reason, 0)
    }

    fn report(&self, end_reason: &str, exit_code: i32) -> Result<RunReport, HarnessError> {
        let report = self
            .summary(end_reason, exit_code)
            .into_report(self.stream_path())?;
        Ok(report)
    }

    /// End the process with `code` after [`finalize`](Self::finalize): the
    /// stream is always cut to the last committed record, whatever the
    /// state.
    pub fn terminate(mut self, code: i32) -> ! {
        if let Err(err) = self.finalize() {
            error!(%err, "failed to finalize input stream");
        }
        std::process::exit(code)
    }
}
