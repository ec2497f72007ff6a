//! Synthetic pad generation for exploration frames.

use tasrig_wire::{Pad, buttons};

use crate::rng::Xorshift32;

/// PRNG draws consumed by one [`PadGenerator::generate`] call.
pub const DRAWS_PER_PAD: usize = 5;

/// Per-frame press probabilities for the buttons exploration may press.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ActionProbabilities {
    pub a: f32,
    pub b: f32,
    pub trigger: f32,
}

impl Default for ActionProbabilities {
    fn default() -> Self {
        Self {
            a: 0.5,
            b: 0.5,
            trigger: 0.2,
        }
    }
}

/// Builds random but plausible pads from the shared PRNG.
#[derive(Debug, Clone, Default)]
pub struct PadGenerator {
    probabilities: ActionProbabilities,
}

impl PadGenerator {
    pub fn new(probabilities: ActionProbabilities) -> Self {
        Self { probabilities }
    }

    pub fn probabilities(&self) -> ActionProbabilities {
        self.probabilities
    }

    /// Draw a pad: A, B, Z trigger, stick x, stick y, in that order.
    ///
    /// Every check consumes its draw whether or not the button is pressed.
    pub fn generate(&self, rng: &mut Xorshift32) -> Pad {
        let mut button = 0;
        if rng.next_prob() < self.probabilities.a {
            button |= buttons::A_BUTTON;
        }
        if rng.next_prob() < self.probabilities.b {
            button |= buttons::B_BUTTON;
        }
        if rng.next_prob() < self.probabilities.trigger {
            button |= buttons::Z_TRIG;
        }

        let stick_x = rng.next_stick();
        let stick_y = rng.next_stick();

        Pad {
            button,
            stick_x,
            stick_y,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_consumes_five_draws() {
        let generator = PadGenerator::default();
        let mut rng = Xorshift32::new(22);
        let mut expected = rng.clone();

        generator.generate(&mut rng);
        for _ in 0..DRAWS_PER_PAD {
            expected.next_u32();
        }
        assert_eq!(rng, expected);
    }

    #[test]
    fn test_draw_order() {
        let generator = PadGenerator::default();
        let mut rng = Xorshift32::new(1234);
        let mut manual = rng.clone();

        let pad = generator.generate(&mut rng);

        let a = manual.next_prob() < 0.5;
        let b = manual.next_prob() < 0.5;
        let z = manual.next_prob() < 0.2;
        assert_eq!(pad.is_held(buttons::A_BUTTON), a);
        assert_eq!(pad.is_held(buttons::B_BUTTON), b);
        assert_eq!(pad.is_held(buttons::Z_TRIG), z);
        assert_eq!(pad.stick_x, manual.next_stick());
        assert_eq!(pad.stick_y, manual.next_stick());
    }

    #[test]
    fn test_only_exploration_buttons_pressed() {
        let generator = PadGenerator::default();
        let mut rng = Xorshift32::new(99);
        let allowed = buttons::A_BUTTON | buttons::B_BUTTON | buttons::Z_TRIG;
        for _ in 0..1_000 {
            let pad = generator.generate(&mut rng);
            assert_eq!(pad.button & !allowed, 0);
            assert!((-80..=80).contains(&pad.stick_x));
            assert!((-80..=80).contains(&pad.stick_y));
        }
    }

    #[test]
    fn test_probability_extremes() {
        let never = PadGenerator::new(ActionProbabilities {
            a: 0.0,
            b: 0.0,
            trigger: 0.0,
        });
        let mut rng = Xorshift32::new(5);
        for _ in 0..200 {
            assert_eq!(never.generate(&mut rng).button, 0);
        }
    }
}
