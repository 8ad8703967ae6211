//! The transition table.
//!
//! | Current state | Event          | Next state         |
//! |---------------|----------------|--------------------|
//! | Idle          | Load(c)        | Loading(c)         |
//! | Loading       | AsyncSuccess(d)| Success(d)         |
//! | Loading       | AsyncError(e)  | Error(e)           |
//! | Success       | Load(c)        | Loading(c)         |
//! | Success       | Reset          | Idle               |
//! | Error         | Load(c)        | Loading(c)         |
//! | Error         | Reset          | Idle               |
//!
//! Every other pair leaves the state untouched. In particular a `Load` while
//! `Loading` is ignored, which is what keeps at most one operation in flight,
//! and a completion that arrives outside `Loading` is dropped.

use crate::event::{AsyncEvent, EventTag};
use crate::state::{AsyncState, StateTag};

/// Outcome of feeding one event to the machine
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Step<D, E, C> {
    /// The event had a table entry; this is the new state
    Moved(AsyncState<D, E, C>),
    /// No table entry; the original state, handed back unchanged
    Ignored(AsyncState<D, E, C>),
}

impl<D, E, C> Step<D, E, C> {
    /// Whether the event moved the machine
    #[must_use]
    pub const fn is_moved(&self) -> bool {
        matches!(self, Self::Moved(_))
    }

    /// The resulting state, whichever way the step went
    #[must_use]
    pub fn into_state(self) -> AsyncState<D, E, C> {
        match self {
            Self::Moved(state) | Self::Ignored(state) => state,
        }
    }
}

/// Whether `(state, event)` has an entry in the table
#[must_use]
pub const fn accepts(state: StateTag, event: EventTag) -> bool {
    matches!(
        (state, event),
        (StateTag::Idle | StateTag::Success | StateTag::Error, EventTag::Load)
            | (StateTag::Loading, EventTag::AsyncSuccess | EventTag::AsyncError)
            | (StateTag::Success | StateTag::Error, EventTag::Reset)
    )
}

/// Feed `event` to `state`, reporting whether anything happened
///
/// Consumes the current state so payloads move instead of being cloned.
#[must_use]
pub fn step<D, E, C>(state: AsyncState<D, E, C>, event: AsyncEvent<D, E, C>) -> Step<D, E, C> {
    if !accepts(state.tag(), event.tag()) {
        return Step::Ignored(state);
    }

    let next = match event {
        AsyncEvent::Load { context } => AsyncState::Loading { context },
        AsyncEvent::AsyncSuccess { data } => AsyncState::Success { data },
        AsyncEvent::AsyncError { error } => AsyncState::Error { error },
        AsyncEvent::Reset => AsyncState::Idle,
    };
    Step::Moved(next)
}

/// Pure, total transition function: `(state, event) -> state`
///
/// Undefined pairs return `state` as is.
///
/// # Example
///
/// ```
/// use async_tracker_core::{event::AsyncEvent, machine::transition, state::AsyncState};
///
/// let idle: AsyncState<i32, String, &str> = AsyncState::Idle;
/// let loading = transition(idle, AsyncEvent::Load { context: "x" });
/// assert_eq!(loading, AsyncState::Loading { context: "x" });
///
/// // A second start while loading is ignored
/// let still = transition(loading.clone(), AsyncEvent::Load { context: "y" });
/// assert_eq!(still, loading);
/// ```
#[must_use]
pub fn transition<D, E, C>(
    state: AsyncState<D, E, C>,
    event: AsyncEvent<D, E, C>,
) -> AsyncState<D, E, C> {
    step(state, event).into_state()
}

#[cfg(test)]
mod tests {
    use super::*;

    type State = AsyncState<i32, String, String>;
    type Event = AsyncEvent<i32, String, String>;

    fn sample_state(tag: StateTag) -> State {
        match tag {
            StateTag::Idle => State::Idle,
            StateTag::Loading => State::Loading { context: "ctx".to_string() },
            StateTag::Success => State::Success { data: 7 },
            StateTag::Error => State::Error { error: "err".to_string() },
        }
    }

    fn sample_event(tag: EventTag) -> Event {
        match tag {
            EventTag::Load => Event::Load { context: "next".to_string() },
            EventTag::AsyncSuccess => Event::AsyncSuccess { data: 42 },
            EventTag::AsyncError => Event::AsyncError { error: "boom".to_string() },
            EventTag::Reset => Event::Reset,
        }
    }

    #[test]
    fn test_table_has_seven_entries() {
        let count = StateTag::ALL
            .iter()
            .flat_map(|s| EventTag::ALL.iter().map(move |e| (*s, *e)))
            .filter(|(s, e)| accepts(*s, *e))
            .count();
        assert_eq!(count, 7);
    }

    #[test]
    fn test_undefined_pairs_are_identity() {
        for state_tag in StateTag::ALL {
            for event_tag in EventTag::ALL {
                if accepts(state_tag, event_tag) {
                    continue;
                }
                let state = sample_state(state_tag);
                let result = step(state.clone(), sample_event(event_tag));
                assert_eq!(result, Step::Ignored(state), "{state_tag} + {event_tag}");
            }
        }
    }

    #[test]
    fn test_happy_path() {
        let loading = transition(State::Idle, Event::Load { context: "x".to_string() });
        assert_eq!(loading, State::Loading { context: "x".to_string() });

        let success = transition(loading.clone(), Event::AsyncSuccess { data: 42 });
        assert_eq!(success, State::Success { data: 42 });

        let failed = transition(loading, Event::AsyncError { error: "boom".to_string() });
        assert_eq!(failed, State::Error { error: "boom".to_string() });
    }

    #[test]
    fn test_reload_discards_previous_payload() {
        for settled in [sample_state(StateTag::Success), sample_state(StateTag::Error)] {
            let next = transition(settled, Event::Load { context: "again".to_string() });
            assert_eq!(next, State::Loading { context: "again".to_string() });
        }
    }

    #[test]
    fn test_reset_from_settled_states() {
        assert_eq!(transition(sample_state(StateTag::Success), Event::Reset), State::Idle);
        assert_eq!(transition(sample_state(StateTag::Error), Event::Reset), State::Idle);
    }

    #[test]
    fn test_reset_while_idle_is_noop() {
        assert_eq!(step(State::Idle, Event::Reset), Step::Ignored(State::Idle));
    }

    #[test]
    fn test_load_while_loading_is_ignored() {
        let loading = sample_state(StateTag::Loading);
        let result = step(loading.clone(), Event::Load { context: "other".to_string() });
        assert!(!result.is_moved());
        assert_eq!(result.into_state(), loading);
    }

    #[test]
    fn test_completion_outside_loading_is_ignored() {
        assert_eq!(
            transition(State::Idle, Event::AsyncSuccess { data: 1 }),
            State::Idle
        );
        let success = sample_state(StateTag::Success);
        assert_eq!(
            transition(success.clone(), Event::AsyncError { error: "late".to_string() }),
            success
        );
    }
}
