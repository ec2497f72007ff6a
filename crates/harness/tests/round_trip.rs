//! Property tests: anything recorded replays exactly under the same seed.

use std::path::Path;

use proptest::prelude::*;
use tasrig_explore::WindowConfig;
use tasrig_harness::{
    ControllerState, Driver, FrameSource, Harness, HarnessConfig, LiveInput, Mode, Pacer,
    ScriptedInput,
};
use tasrig_replay::RecordReader;
use tasrig_sim::World;
use tasrig_wire::{Pad, buttons};

/// Live pads the operator controls leave untouched.
fn arb_live_pad() -> impl Strategy<Value = Pad> {
    (any::<u16>(), any::<i8>(), any::<i8>()).prop_map(|(button, x, y)| {
        Pad::new(button & !(buttons::D_PAD | buttons::START_BUTTON), x, y)
    })
}

prop_compose! {
    fn arb_window()(window_length_max in 1u32..=50)(
        window_length_max in Just(window_length_max),
        random_action_max in 0u32..=window_length_max,
    ) -> WindowConfig {
        WindowConfig { window_length_max, random_action_max }
    }
}

fn driver<L: LiveInput>(config: HarnessConfig, path: &Path, input: L) -> Driver<World, L> {
    let harness = Harness::init(config, path).unwrap();
    Driver::new(
        harness,
        World::with_goal(f32::INFINITY),
        input,
        Pacer::new(30, true),
    )
}

proptest! {
    #![proptest_config(ProptestConfig {
        cases: 32,
        .. ProptestConfig::default()
    })]

    #[test]
    fn recording_replays_frame_for_frame(
        seed in 1u32..,
        window in arb_window(),
        live in proptest::collection::vec(arb_live_pad(), 1..120),
    ) {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("cont.m64");
        let frames = live.len() as u32;
        let config = HarnessConfig { seed, window, ..Default::default() };

        let mut recorder = driver(
            HarnessConfig { mode: Mode::Record, ..config.clone() },
            &path,
            ScriptedInput::new(live.clone()),
        );
        recorder.run(Some(frames)).unwrap();
        recorder.harness_mut().finalize().unwrap();
        drop(recorder);

        let recorded: Vec<Pad> = RecordReader::from_path(&path).unwrap().collect();
        prop_assert_eq!(recorded.len(), live.len());

        // Replay with a different live pad: only the stream and seed matter.
        let mut player = driver(
            HarnessConfig { mode: Mode::Playback, ..config },
            &path,
            ScriptedInput::new(Vec::new()),
        );
        for expected in &recorded {
            let outcome = player.run_frame().unwrap();
            prop_assert_eq!(outcome.source, FrameSource::Played);
            prop_assert_eq!(outcome.pad, *expected);
        }
        prop_assert_eq!(player.harness().state(), ControllerState::Playback);
    }
}
