//! Property tests for the transition table

use async_tracker_core::{
    AsyncEvent, AsyncState,
    effect::Effect,
    machine::{Step, accepts, step, transition},
    reducer::{AsyncReducer, Reducer},
};
use async_tracker_testing::properties::{arb_event, arb_settled_state, arb_state};
use proptest::prelude::*;

proptest! {
    #[test]
    fn undefined_pairs_leave_state_unchanged(state in arb_state(), event in arb_event()) {
        prop_assume!(!accepts(state.tag(), event.tag()));
        prop_assert_eq!(transition(state.clone(), event), state);
    }

    #[test]
    fn defined_pairs_always_move(state in arb_state(), event in arb_event()) {
        prop_assume!(accepts(state.tag(), event.tag()));
        prop_assert!(step(state, event).is_moved());
    }

    #[test]
    fn reset_from_settled_is_idle(state in arb_settled_state()) {
        prop_assert_eq!(transition(state, AsyncEvent::Reset), AsyncState::Idle);
    }

    #[test]
    fn load_from_settled_discards_payload(state in arb_settled_state(), context in "[a-z]{0,8}") {
        prop_assert_eq!(
            transition(state, AsyncEvent::Load { context: context.clone() }),
            AsyncState::Loading { context }
        );
    }

    #[test]
    fn load_while_loading_is_ignored(current in "[a-z]{0,8}", next in "[a-z]{0,8}") {
        let loading: AsyncState<i32, String, String> = AsyncState::Loading { context: current };
        let result = step(loading.clone(), AsyncEvent::Load { context: next });
        prop_assert_eq!(result, Step::Ignored(loading));
    }

    #[test]
    fn reducer_effect_matches_entered_state(state in arb_state(), event in arb_event()) {
        let reducer = AsyncReducer::<i32, String, String>::new();
        let mut reduced = state.clone();
        let effect = reducer.reduce(&mut reduced, event.clone());

        prop_assert_eq!(&reduced, &transition(state, event));
        if let Some(effect) = effect {
            prop_assert_eq!(effect, Effect::on_enter(reduced.tag()));
        }
    }
}
