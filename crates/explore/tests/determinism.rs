//! Property tests for the exploration stream.

use proptest::prelude::*;
use tasrig_explore::{
    ActionProbabilities, ExplorationScheduler, Explorer, WindowConfig, Xorshift32,
};
use tasrig_wire::Pad;

fn run(seed: u32, window: WindowConfig, reseeds: &[u32], frames: usize) -> Vec<Option<Pad>> {
    let mut explorer = Explorer::new(seed, window, ActionProbabilities::default());
    (0..frames)
        .map(|i| {
            let pad = explorer.draw();
            if !reseeds.is_empty() {
                explorer.reseed(reseeds[i % reseeds.len()]);
            }
            pad
        })
        .collect()
}

prop_compose! {
    fn arb_window()(window_length_max in 1u32..=200)(
        window_length_max in Just(window_length_max),
        random_action_max in 0u32..=window_length_max,
    ) -> WindowConfig {
        WindowConfig { window_length_max, random_action_max }
    }
}

proptest! {
    #![proptest_config(ProptestConfig {
        cases: 64,
        .. ProptestConfig::default()
    })]

    // Two independent runs with the same inputs agree frame for frame.
    #[test]
    fn identical_inputs_identical_stream(
        seed in any::<u32>(),
        window in arb_window(),
        reseeds in proptest::collection::vec(any::<u32>(), 0..16),
    ) {
        let a = run(seed, window, &reseeds, 400);
        let b = run(seed, window, &reseeds, 400);
        prop_assert_eq!(a, b);
    }

    #[test]
    fn synthetic_sticks_stay_in_range(seed in 1u32.., frames in 1usize..500) {
        let window = WindowConfig { window_length_max: 1, random_action_max: 1 };
        for pad in run(seed, window, &[], frames).into_iter().flatten() {
            prop_assert!((-80..=80).contains(&pad.stick_x));
            prop_assert!((-80..=80).contains(&pad.stick_y));
        }
    }

    // Exploration frames in any window never exceed the quota.
    #[test]
    fn window_never_exceeds_quota(seed in any::<u32>(), window in arb_window()) {
        let mut scheduler = ExplorationScheduler::new(window);
        let mut rng = Xorshift32::new(seed);
        for _ in 0..5 {
            let explored = (0..window.window_length_max)
                .filter(|_| scheduler.should_explore(&mut rng))
                .count() as u32;
            prop_assert!(explored <= window.random_action_max);
        }
    }

    #[test]
    fn nonzero_seed_never_collapses(seed in 1u32..) {
        let mut rng = Xorshift32::new(seed);
        for _ in 0..1_000 {
            prop_assert_ne!(rng.next_u32(), 0);
        }
    }
}
