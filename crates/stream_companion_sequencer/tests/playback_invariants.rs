// SPDX-License-Identifier: MIT OR Apache-2.0
//! Property tests for the restart and live-update guarantees.

use proptest::prelude::*;
use serde_json::{json, Value};
use stream_companion_sequencer::{
    Dispatcher, ElementId, ElementState, ElementType, RecordingHost, Sequencer, SequencerState,
    UpdateOutcome,
};

fn behavior_from(durations: &[u32]) -> Value {
    Value::Array(
        durations
            .iter()
            .map(|ms| json!({"type": "animate_property", "properties": [
                {"property": "opacity", "from": 0, "to": 1, "duration": ms}
            ]}))
            .collect(),
    )
}

fn element(durations: &[u32]) -> ElementState {
    ElementState::new("prop", ElementType::Text)
        .with_playing(true)
        .with_property("color", json!("#000000"))
        .with_behavior(behavior_from(durations))
}

proptest! {
    #[test]
    fn behavior_change_always_restarts_from_zero(
        first in prop::collection::vec(1u32..2000, 1..6),
        second in prop::collection::vec(1u32..2000, 1..6),
        elapsed in 0u32..8000,
    ) {
        prop_assume!(first != second);
        let mut dispatcher = Dispatcher::with_defaults();
        let mut host = RecordingHost::new();
        dispatcher.on_element_update(element(&first), &mut host).unwrap();
        dispatcher.tick(f64::from(elapsed), &mut host);

        let outcome = dispatcher.on_element_update(element(&second), &mut host).unwrap();
        prop_assert_eq!(outcome, UpdateOutcome::Restarted);

        let seq = dispatcher.sequencer(&ElementId::from("prop")).unwrap();
        prop_assert_eq!(seq.position(), 0.0);
        prop_assert!(seq.is_playing());
        let expected: u32 = second.iter().sum();
        prop_assert_eq!(seq.status().duration, f64::from(expected));
    }

    #[test]
    fn property_change_never_moves_playback(
        durations in prop::collection::vec(100u32..2000, 1..6),
        elapsed_fraction in 0.0f64..0.95,
        rgb in any::<[u8; 3]>(),
    ) {
        let mut dispatcher = Dispatcher::with_defaults();
        let mut host = RecordingHost::new();
        dispatcher.on_element_update(element(&durations), &mut host).unwrap();

        let total: u32 = durations.iter().sum();
        dispatcher.tick(f64::from(total) * elapsed_fraction, &mut host);
        let id = ElementId::from("prop");
        let before = dispatcher.sequencer(&id).unwrap().position();
        let was_playing = dispatcher.status(&id).unwrap().is_playing;

        let color = format!("#{:02x}{:02x}{:02x}", rgb[0], rgb[1], rgb[2]);
        let update = element(&durations).with_property("color", json!(color));
        dispatcher.on_element_update(update, &mut host).unwrap();

        let seq = dispatcher.sequencer(&id).unwrap();
        prop_assert_eq!(seq.position(), before);
        prop_assert_eq!(seq.is_playing(), was_playing);
    }

    #[test]
    fn stop_on_idle_is_idempotent(times in 1usize..5) {
        let mut seq = Sequencer::new(
            ElementId::from("idle"),
            ElementType::Image,
            Default::default(),
            stream_companion_sequencer::Catalogs::builtin().shared(),
            Default::default(),
        );
        let mut host = RecordingHost::new();
        for _ in 0..times {
            seq.stop(&mut host);
        }
        prop_assert_eq!(seq.state(), SequencerState::Idle);
        prop_assert!(host.calls().is_empty());
    }
}
