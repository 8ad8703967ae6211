//! Model-based property test: a tracker driven only by caller events agrees
//! with folding the pure transition function over the same events.

#![allow(clippy::unwrap_used)] // Tests can unwrap
#![allow(clippy::expect_used)] // Tests can expect

use async_tracker_core::{
    StateTag,
    machine::{Step, step},
};
use async_tracker_runtime::OperationTracker;
use async_tracker_testing::properties::{PropEvent, PropState, arb_event};
use async_tracker_testing::{CallbackRecorder, ControlledProducer, LifecycleHook};
use proptest::prelude::*;

struct Model {
    state: PropState,
    moves: u64,
    loads: usize,
    successes: usize,
    errors: usize,
}

fn run_model(events: &[PropEvent]) -> Model {
    let mut model = Model {
        state: PropState::Idle,
        moves: 0,
        loads: 0,
        successes: 0,
        errors: 0,
    };

    for event in events.iter().cloned() {
        let state = std::mem::take(&mut model.state);
        model.state = match step(state, event) {
            Step::Moved(next) => {
                model.moves += 1;
                match next.tag() {
                    StateTag::Loading => model.loads += 1,
                    StateTag::Success => model.successes += 1,
                    StateTag::Error => model.errors += 1,
                    StateTag::Idle => {},
                }
                next
            },
            Step::Ignored(same) => same,
        };
    }

    model
}

proptest! {
    #[test]
    fn tracker_matches_pure_fold(events in prop::collection::vec(arb_event(), 0..24)) {
        let runtime = tokio::runtime::Builder::new_current_thread()
            .enable_all()
            .build()
            .expect("Failed to build runtime");

        let expected = run_model(&events);

        runtime.block_on(async {
            // Operations are never settled, so only caller events move the tracker
            let producer = ControlledProducer::new();
            let recorder = CallbackRecorder::new();
            let tracker = OperationTracker::with_options(producer.clone(), recorder.options());

            for event in events {
                tracker.send(event).await.unwrap();
            }

            prop_assert_eq!(tracker.snapshot().await, expected.state);
            prop_assert_eq!(tracker.generation().await, expected.moves);
            prop_assert_eq!(producer.call_count(), expected.loads);
            prop_assert_eq!(recorder.count(LifecycleHook::OnLoad), expected.loads);
            prop_assert_eq!(recorder.count(LifecycleHook::OnSuccess), expected.successes);
            prop_assert_eq!(recorder.count(LifecycleHook::OnError), expected.errors);
            Ok(())
        })?;
    }
}
