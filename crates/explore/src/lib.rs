//! tasrig Exploration Core
//!
//! Deterministic source of exploration input: a xorshift32 PRNG, a windowed
//! scheduler deciding which frames explore, and a generator producing the
//! synthetic pad for those frames.
//!
//! # Constraints
//!
//! This crate MUST NOT perform I/O, read the clock, or use ambient
//! randomness. Given the same seed and the same sequence of reseed values,
//! every decision and every synthetic pad is identical across runs. The
//! per-frame draw order is part of that contract:
//!
//! 1. scheduler draw (one PRNG step)
//! 2. pad generation, on exploration frames only (five PRNG steps)
//! 3. any reseeding the driver performs after the frame

#![deny(unsafe_code)]

pub mod pad_gen;
pub mod rng;
pub mod scheduler;

pub use pad_gen::{ActionProbabilities, DRAWS_PER_PAD, PadGenerator};
pub use rng::Xorshift32;
pub use scheduler::{ExplorationScheduler, WindowConfig};

use tasrig_wire::{Pad, PadOrigin};

/// PRNG, scheduler and pad generator owned together, stepped once per frame.
#[derive(Debug, Clone)]
pub struct Explorer {
    rng: Xorshift32,
    scheduler: ExplorationScheduler,
    generator: PadGenerator,
}

impl Explorer {
    /// # Panics
    /// If `window.window_length_max` is 0.
    pub fn new(seed: u32, window: WindowConfig, probabilities: ActionProbabilities) -> Self {
        Self {
            rng: Xorshift32::new(seed),
            scheduler: ExplorationScheduler::new(window),
            generator: PadGenerator::new(probabilities),
        }
    }

    /// Run this frame's scheduler decision and, on an exploration frame,
    /// return the synthetic pad.
    pub fn draw(&mut self) -> Option<Pad> {
        if self.scheduler.should_explore(&mut self.rng) {
            Some(self.generator.generate(&mut self.rng))
        } else {
            None
        }
    }

    /// Like [`draw`](Self::draw), falling back to `live` unchanged.
    pub fn resolve(&mut self, live: Pad) -> (Pad, PadOrigin) {
        match self.draw() {
            Some(pad) => (pad, PadOrigin::Synthetic),
            None => (live, PadOrigin::Passthrough),
        }
    }

    pub fn reseed(&mut self, external: u32) {
        self.rng.reseed(external);
    }

    pub fn rng(&self) -> &Xorshift32 {
        &self.rng
    }

    pub fn scheduler(&self) -> &ExplorationScheduler {
        &self.scheduler
    }

    pub fn generator(&self) -> &PadGenerator {
        &self.generator
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn explorer(seed: u32) -> Explorer {
        Explorer::new(seed, WindowConfig::default(), ActionProbabilities::default())
    }

    #[test]
    fn test_passthrough_keeps_live_values() {
        let mut e = Explorer::new(
            22,
            WindowConfig {
                window_length_max: 10,
                random_action_max: 0,
            },
            ActionProbabilities::default(),
        );
        let live = Pad::new(0x1234, 100, -100);
        let before = e.rng().clone();

        let (pad, origin) = e.resolve(live);

        assert_eq!(pad, live);
        assert_eq!(origin, PadOrigin::Passthrough);
        // Only the scheduler draw was consumed.
        let mut expected = before;
        expected.next_u32();
        assert_eq!(e.rng(), &expected);
    }

    #[test]
    fn test_synthetic_consumes_six_draws() {
        let mut e = Explorer::new(
            22,
            WindowConfig {
                window_length_max: 1,
                random_action_max: 1,
            },
            ActionProbabilities::default(),
        );
        let mut expected = e.rng().clone();

        let (_, origin) = e.resolve(Pad::NEUTRAL);

        assert_eq!(origin, PadOrigin::Synthetic);
        for _ in 0..=DRAWS_PER_PAD {
            expected.next_u32();
        }
        assert_eq!(e.rng(), &expected);
    }

    #[test]
    fn test_same_seed_same_stream() {
        let mut a = explorer(42);
        let mut b = explorer(42);
        for frame in 0..5_000u32 {
            assert_eq!(a.draw(), b.draw(), "frame {frame}");
            a.reseed(frame.wrapping_mul(2_654_435_761));
            b.reseed(frame.wrapping_mul(2_654_435_761));
        }
    }

    #[test]
    fn test_different_reseed_diverges() {
        let mut a = explorer(42);
        let mut b = explorer(42);
        a.reseed(1);
        b.reseed(2);
        let sa: Vec<_> = (0..500).map(|_| a.draw()).collect();
        let sb: Vec<_> = (0..500).map(|_| b.draw()).collect();
        assert_ne!(sa, sb);
    }
}
