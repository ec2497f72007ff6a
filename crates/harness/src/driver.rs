//! Simulation driver loop.
//!
//! One iteration per frame, strictly sequential: poll the live pad, resolve
//! it through the harness, advance the simulation, fold simulation state back
//! into the PRNG, then sleep to hold the target frame rate. The sleep only
//! paces a watcher; it plays no part in correctness and is skipped headless.
//!
//! The loop ends when the simulation reports it is complete, when a frame
//! limit is reached, or on the first harness error.

use std::thread;
use std::time::{Duration, Instant};

use tasrig_sim::World;
use tasrig_wire::{Frame, Pad};
use tracing::{debug, info};

use crate::controller::FrameOutcome;
use crate::error::HarnessError;
use crate::Harness;

/// The game loop side of the harness.
pub trait Simulation {
    /// Advance exactly one frame using `pad`.
    fn advance(&mut self, pad: &Pad);

    /// State words fed to [`Harness::reseed_with`] after every frame, in
    /// order.
    fn entropy_words(&self) -> Vec<u32>;

    /// True once the run has reached its goal. Checked after every frame.
    fn is_complete(&self) -> bool {
        false
    }
}

impl Simulation for World {
    fn advance(&mut self, pad: &Pad) {
        World::advance(self, pad);
    }

    fn entropy_words(&self) -> Vec<u32> {
        World::entropy_words(self).to_vec()
    }

    fn is_complete(&self) -> bool {
        self.reached_goal()
    }
}

/// Source of the live controller state.
pub trait LiveInput {
    fn poll(&mut self) -> Pad;
}

/// No controller attached.
#[derive(Debug, Clone, Copy, Default)]
pub struct NeutralInput;

impl LiveInput for NeutralInput {
    fn poll(&mut self) -> Pad {
        Pad::NEUTRAL
    }
}

/// Fixed pad sequence, neutral once exhausted.
#[derive(Debug, Clone, Default)]
pub struct ScriptedInput {
    pads: Vec<Pad>,
    next: usize,
}

impl ScriptedInput {
    pub fn new(pads: Vec<Pad>) -> Self {
        Self { pads, next: 0 }
    }
}

impl LiveInput for ScriptedInput {
    fn poll(&mut self) -> Pad {
        let pad = self.pads.get(self.next).copied().unwrap_or(Pad::NEUTRAL);
        self.next += 1;
        pad
    }
}

/// Sleeps between frames to hold `frame_rate_hz × speed`.
#[derive(Debug)]
pub struct Pacer {
    frame_rate_hz: u32,
    headless: bool,
    last: Instant,
}

impl Pacer {
    pub fn new(frame_rate_hz: u32, headless: bool) -> Self {
        Self {
            frame_rate_hz,
            headless,
            last: Instant::now(),
        }
    }

    /// Wall-clock time one frame should take at `speed`, or `None` if
    /// pacing is off.
    pub fn frame_duration(&self, speed: f32) -> Option<Duration> {
        if self.headless || self.frame_rate_hz == 0 || speed <= 0.0 {
            return None;
        }
        Some(Duration::from_secs_f64(
            1.0 / (f64::from(self.frame_rate_hz) * f64::from(speed)),
        ))
    }

    /// Sleep off whatever is left of the current frame.
    pub fn wait(&mut self, speed: f32) {
        if let Some(target) = self.frame_duration(speed) {
            let elapsed = self.last.elapsed();
            if elapsed < target {
                thread::sleep(target - elapsed);
            }
        }
        self.last = Instant::now();
    }
}

/// Why [`Driver::run`] returned without an error.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StopReason {
    /// The simulation reached its goal.
    Complete,
    /// The requested number of frames ran.
    FrameLimit,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RunEnd {
    pub frames: Frame,
    pub reason: StopReason,
}

/// Owns a harness and a simulation and runs them in lockstep.
pub struct Driver<S, L> {
    harness: Harness,
    sim: S,
    input: L,
    pacer: Pacer,
}

impl<S: Simulation, L: LiveInput> Driver<S, L> {
    pub fn new(harness: Harness, sim: S, input: L, pacer: Pacer) -> Self {
        Self {
            harness,
            sim,
            input,
            pacer,
        }
    }

    pub fn harness(&self) -> &Harness {
        &self.harness
    }

    pub fn harness_mut(&mut self) -> &mut Harness {
        &mut self.harness
    }

    pub fn sim(&self) -> &S {
        &self.sim
    }

    pub fn into_parts(self) -> (Harness, S) {
        (self.harness, self.sim)
    }

    /// Run one frame.
    pub fn run_frame(&mut self) -> Result<FrameOutcome, HarnessError> {
        let live = self.input.poll();
        let outcome = self.harness.step(live)?;

        self.sim.advance(&outcome.pad);
        for word in self.sim.entropy_words() {
            self.harness.reseed_with(word);
        }

        self.pacer.wait(self.harness.current_speed_multiplier());
        Ok(outcome)
    }

    /// Run until the simulation is complete or `limit` frames have run.
    /// Without a limit only completion or an error stops the loop.
    pub fn run(&mut self, limit: Option<Frame>) -> Result<RunEnd, HarnessError> {
        let mut frames: Frame = 0;
        let reason = loop {
            if limit.is_some_and(|max| frames >= max) {
                break StopReason::FrameLimit;
            }
            self.run_frame()?;
            frames += 1;
            if self.sim.is_complete() {
                info!(frames, "simulation complete");
                break StopReason::Complete;
            }
        };
        debug!(frames, ?reason, "driver stopped");
        Ok(RunEnd { frames, reason })
    }
}
