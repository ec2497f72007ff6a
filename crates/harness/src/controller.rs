//! Playback/record state machine.
//!
//! Each frame the controller first asks the explorer for this frame's
//! synthetic pad (if any), then either plays the next record from the stream
//! or appends a record to it:
//!
//! ```text
//!            read ok                        takeover / read short (record mode)
//!   Playback ───────► Playback    Playback ───────────────────────────────────► Recording
//!                                    │
//!                                    │ read short (playback mode), divergence,
//!                                    ▼ budget, I/O
//!                               Terminated ◄──────── Recording (budget, abort, I/O)
//! ```
//!
//! Playback ends on the first frame a full record cannot be read, and that
//! same frame is recorded: no frame is skipped.

use tasrig_explore::Explorer;
use tasrig_replay::InputStore;
use tasrig_wire::{Frame, Pad, PadOrigin, RECORD_LEN, buttons};
use tracing::{error, info, trace};

use crate::config::{FAST_FORWARD_SPEED, HarnessConfig, NEUTRAL_SPEED};
use crate::error::HarnessError;

const RECORD_BYTES: u32 = RECORD_LEN as u32;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ControllerState {
    /// Reading frames from the stream.
    Playback,
    /// Appending frames to the stream.
    Recording,
    /// A fatal condition was reported; no further frames are accepted.
    Terminated,
}

/// Mode change that happened during a frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Transition {
    /// The operator held the takeover button; later records were discarded.
    Takeover,
    /// The stream ran out.
    PlaybackFinished,
}

/// Where a frame's pad was committed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FrameSource {
    Played,
    Recorded,
}

/// Result of one resolved frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FrameOutcome {
    pub frame: Frame,
    /// Pad the simulation must use this frame.
    pub pad: Pad,
    pub source: FrameSource,
    /// Whether the explorer replaced the live pad this frame.
    pub origin: PadOrigin,
    pub transition: Option<Transition>,
}

/// Counters reported when a run ends.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RunStats {
    pub frames_played: u32,
    pub frames_recorded: u32,
    pub frames_explored: u32,
}

pub struct Controller {
    config: HarnessConfig,
    store: InputStore,
    explorer: Explorer,
    state: ControllerState,
    /// Bytes played or recorded so far; always a multiple of 4.
    bytes: u32,
    /// Aligned stream length when the run started.
    loaded_len: u64,
    speed: f32,
    frame: Frame,
    /// START stays masked after recording starts until it is released.
    resume_guard: bool,
    fast_forward_held: bool,
    stats: RunStats,
}

impl Controller {
    /// Build a controller over an opened store. `config` must already have
    /// passed [`HarnessConfig::validate`].
    ///
    /// An empty stream in record mode starts recording immediately.
    pub(crate) fn new(config: HarnessConfig, store: InputStore) -> Self {
        let explorer = Explorer::new(config.seed, config.window, config.probabilities);
        let loaded_len = store.opened_len();
        let state = if loaded_len == 0 && config.mode.is_record() {
            ControllerState::Recording
        } else {
            ControllerState::Playback
        };

        info!(
            seed = config.seed,
            mode = ?config.mode,
            frames = store.frames_available(),
            ?state,
            "controller initialized"
        );

        Self {
            config,
            store,
            explorer,
            state,
            bytes: 0,
            loaded_len,
            speed: NEUTRAL_SPEED,
            frame: 0,
            resume_guard: true,
            fast_forward_held: false,
            stats: RunStats::default(),
        }
    }

    pub fn state(&self) -> ControllerState {
        self.state
    }

    pub fn config(&self) -> &HarnessConfig {
        &self.config
    }

    pub fn store(&self) -> &InputStore {
        &self.store
    }

    /// Bytes played or recorded so far.
    pub fn bytes(&self) -> u32 {
        self.bytes
    }

    /// Index of the next frame to resolve.
    pub fn frame(&self) -> Frame {
        self.frame
    }

    pub fn speed(&self) -> f32 {
        self.speed
    }

    pub fn stats(&self) -> RunStats {
        self.stats
    }

    pub fn explorer(&self) -> &Explorer {
        &self.explorer
    }

    pub fn reseed(&mut self, external: u32) {
        self.explorer.reseed(external);
    }

    /// Resolve one frame of input.
    ///
    /// Any error moves the controller to `Terminated`; call
    /// [`finalize`](Self::finalize) before exiting.
    pub fn step(&mut self, live: Pad) -> Result<FrameOutcome, HarnessError> {
        if self.state == ControllerState::Terminated {
            return Err(HarnessError::Terminated);
        }

        match self.resolve(live) {
            Ok(outcome) => {
                trace!(frame = outcome.frame, pad = %outcome.pad, source = ?outcome.source, "frame resolved");
                self.frame += 1;
                Ok(outcome)
            }
            Err(err) => {
                error!(frame = self.frame, bytes = self.bytes, %err, "harness terminating");
                self.state = ControllerState::Terminated;
                Err(err)
            }
        }
    }

    /// Cut the stream to the bytes played or recorded so far and flush it.
    /// Records ahead of the current frame are discarded.
    pub fn finalize(&mut self) -> Result<(), HarnessError> {
        self.store.truncate_and_seek_to(u64::from(self.bytes))?;
        self.flush_and_log()
    }

    /// Like [`finalize`](Self::finalize), but a run paused mid-playback keeps
    /// the records it has not reached yet. Only recording or a fatal error
    /// cuts the stream.
    pub fn finalize_keep_tail(&mut self) -> Result<(), HarnessError> {
        if self.state != ControllerState::Playback {
            self.store.truncate_and_seek_to(u64::from(self.bytes))?;
        }
        self.flush_and_log()
    }

    fn flush_and_log(&mut self) -> Result<(), HarnessError> {
        self.store.flush()?;
        info!(
            frames = self.frame,
            bytes = self.bytes,
            played = self.stats.frames_played,
            recorded = self.stats.frames_recorded,
            explored = self.stats.frames_explored,
            "input stream finalized"
        );
        Ok(())
    }

    fn resolve(&mut self, live: Pad) -> Result<FrameOutcome, HarnessError> {
        let frame = self.frame;
        if self.bytes >= self.config.max_bytes {
            return Err(HarnessError::BudgetExceeded {
                frame,
                max_bytes: self.config.max_bytes,
            });
        }

        let (candidate, origin) = self.explorer.resolve(live);
        let synthetic = origin.is_synthetic().then_some(candidate);
        if synthetic.is_some() {
            self.stats.frames_explored += 1;
        }

        let mut transition = None;
        if self.state == ControllerState::Playback {
            if let Some(pad) = self.play(live, synthetic, &mut transition)? {
                return Ok(FrameOutcome {
                    frame,
                    pad,
                    source: FrameSource::Played,
                    origin,
                    transition,
                });
            }
        }

        let pad = self.record(live, synthetic)?;
        Ok(FrameOutcome {
            frame,
            pad,
            source: FrameSource::Recorded,
            origin,
            transition,
        })
    }

    /// Play one record. `Ok(None)` means playback just ended and this frame
    /// must be recorded instead.
    fn play(
        &mut self,
        live: Pad,
        synthetic: Option<Pad>,
        transition: &mut Option<Transition>,
    ) -> Result<Option<Pad>, HarnessError> {
        let frame = self.frame;
        let record_mode = self.config.mode.is_record();

        if record_mode && live.any_held(self.config.takeover_button) {
            info!(frame, bytes = self.bytes, "takeover, discarding recorded frames ahead");
            self.store.truncate_and_seek_to(u64::from(self.bytes))?;
            *transition = Some(Transition::Takeover);
        }

        match self.store.read_record()? {
            Some(bytes) => {
                let recorded = Pad::from_record(bytes);
                if let Some(expected) = synthetic
                    && expected != recorded
                {
                    return Err(HarnessError::Verification {
                        frame,
                        expected,
                        recorded,
                    });
                }

                self.bytes += RECORD_BYTES;
                self.stats.frames_played += 1;
                self.speed = if record_mode {
                    self.playback_speed()
                } else {
                    self.config.effective_max_speed()
                };
                Ok(Some(recorded))
            }
            None => {
                // Drop any partial record the short read ran into.
                self.store.truncate_and_seek_to(u64::from(self.bytes))?;
                self.state = ControllerState::Recording;
                self.speed = NEUTRAL_SPEED;

                if !record_mode {
                    return Err(HarnessError::PlaybackIncomplete {
                        frame,
                        bytes: self.bytes,
                    });
                }

                info!(frame, bytes = self.bytes, "playback finished, recording");
                transition.get_or_insert(Transition::PlaybackFinished);
                Ok(None)
            }
        }
    }

    /// Speed while replaying in record mode: fast until the last
    /// `rewind_threshold_bytes` of the loaded stream.
    fn playback_speed(&self) -> f32 {
        let slow_from = self
            .loaded_len
            .saturating_sub(u64::from(self.config.rewind_threshold_bytes));
        if u64::from(self.bytes) < slow_from {
            self.config.max_speed
        } else {
            self.config.min_speed
        }
    }

    fn record(&mut self, live: Pad, synthetic: Option<Pad>) -> Result<Pad, HarnessError> {
        let mut pad = live;
        if self.config.operator_controls {
            pad = self.apply_operator_controls(pad)?;
        }
        if let Some(synthetic) = synthetic {
            pad = synthetic;
        }

        self.store.write_record(pad.to_record())?;
        self.bytes += RECORD_BYTES;
        self.stats.frames_recorded += 1;
        Ok(pad)
    }

    /// Live-pad controls for the person recording.
    fn apply_operator_controls(&mut self, mut pad: Pad) -> Result<Pad, HarnessError> {
        let start = self.config.takeover_button;
        if !pad.any_held(start) {
            self.resume_guard = false;
        }
        if self.resume_guard {
            pad.button &= !start;
        }

        if pad.any_held(buttons::U_JPAD) {
            return Err(HarnessError::OperatorAbort { frame: self.frame });
        }

        if pad.any_held(buttons::D_JPAD) {
            self.fast_forward_held = true;
            self.speed = FAST_FORWARD_SPEED;
        } else if self.fast_forward_held {
            self.fast_forward_held = false;
            self.speed = NEUTRAL_SPEED;
        }

        pad.button &= !buttons::D_PAD;
        Ok(pad)
    }
}
