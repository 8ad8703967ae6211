//! # Async Tracker Core
//!
//! Core types for tracking the lifecycle of a single asynchronous operation.
//!
//! This crate is the functional core: a pure state machine and the effect
//! descriptions it produces. It performs no I/O and owns no runtime; the
//! `async-tracker-runtime` crate drives it.
//!
//! ## Core Concepts
//!
//! - **State**: [`AsyncState`], one of `Idle`, `Loading`, `Success`, `Error`
//! - **Event**: [`AsyncEvent`], one of `Load`, `AsyncSuccess`, `AsyncError`, `Reset`
//! - **Transition**: Pure function `(State, Event) → State` ([`machine::transition`])
//! - **Reducer**: `(State, Event) → Effect`, replacing the state and describing
//!   what entering the new state should do
//! - **Environment**: Injected collaborators (clock, owner liveness)
//!
//! ## Example
//!
//! ```
//! use async_tracker_core::{
//!     effect::Effect,
//!     reducer::{AsyncReducer, Reducer},
//!     AsyncEvent, AsyncState,
//! };
//!
//! let reducer = AsyncReducer::<u32, String, &str>::new();
//! let mut state = AsyncState::default();
//!
//! let effect = reducer.reduce(&mut state, AsyncEvent::load("user-7"));
//! assert_eq!(effect, Some(Effect::StartOperation));
//! assert!(state.is_loading());
//!
//! // A second start while loading is ignored
//! assert_eq!(reducer.reduce(&mut state, AsyncEvent::load("user-8")), None);
//! ```

/// Events fed into the state machine
pub mod event;

/// The transition table
pub mod machine;

/// Tracker state and its tag
pub mod state;

pub use event::{AsyncEvent, EventTag};
pub use state::{AsyncState, StateTag};

// Re-export commonly used types
pub use chrono::{DateTime, Utc};

/// Reducer module - applies events to state and describes the resulting effect
///
/// Reducers are deterministic: given the same state and event they always
/// produce the same new state and the same effect description. Executing the
/// effect is the runtime's job.
pub mod reducer {
    use super::effect::Effect;
    use super::event::AsyncEvent;
    use super::machine::{self, Step};
    use super::state::AsyncState;
    use std::marker::PhantomData;

    /// The Reducer trait
    ///
    /// # Type Parameters
    ///
    /// - `State`: The state this reducer operates on
    /// - `Action`: The input it processes
    pub trait Reducer {
        /// The state type this reducer operates on
        type State;

        /// The action type this reducer processes
        type Action;

        /// Apply `action` to `state`
        ///
        /// Returns `None` when the action has no effect on the current state,
        /// otherwise the effect of entering the new state (which may be
        /// [`Effect::None`]).
        fn reduce(&self, state: &mut Self::State, action: Self::Action) -> Option<Effect>;
    }

    /// Reducer for [`AsyncState`] driven by [`AsyncEvent`]
    ///
    /// Replaces the state wholesale with the result of [`machine::step`]; a
    /// state value is never edited in place.
    pub struct AsyncReducer<D, E, C> {
        _phantom: PhantomData<fn() -> (D, E, C)>,
    }

    impl<D, E, C> AsyncReducer<D, E, C> {
        /// Create a new reducer
        #[must_use]
        pub const fn new() -> Self {
            Self {
                _phantom: PhantomData,
            }
        }
    }

    impl<D, E, C> Default for AsyncReducer<D, E, C> {
        fn default() -> Self {
            Self::new()
        }
    }

    impl<D, E, C> Clone for AsyncReducer<D, E, C> {
        fn clone(&self) -> Self {
            *self
        }
    }

    impl<D, E, C> Copy for AsyncReducer<D, E, C> {}

    impl<D, E, C> std::fmt::Debug for AsyncReducer<D, E, C> {
        fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
            f.write_str("AsyncReducer")
        }
    }

    impl<D, E, C> Reducer for AsyncReducer<D, E, C> {
        type State = AsyncState<D, E, C>;
        type Action = AsyncEvent<D, E, C>;

        fn reduce(&self, state: &mut Self::State, action: Self::Action) -> Option<Effect> {
            let current = std::mem::take(state);
            match machine::step(current, action) {
                Step::Moved(next) => {
                    let effect = Effect::on_enter(next.tag());
                    *state = next;
                    Some(effect)
                },
                Step::Ignored(unchanged) => {
                    *state = unchanged;
                    None
                },
            }
        }
    }
}

/// Effect module - side effect descriptions
///
/// Effects are values, not execution. Each state has exactly one entry effect,
/// looked up by tag, and the runtime performs it once per transition.
pub mod effect {
    use super::state::StateTag;

    /// What entering a state should do
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub enum Effect {
        /// No-op effect (entering `Idle`)
        None,

        /// Entering `Loading`: notify `on_load`, invoke the producer and feed
        /// its eventual result back as `AsyncSuccess`/`AsyncError`
        StartOperation,

        /// Entering `Success`: notify `on_success`
        NotifySuccess,

        /// Entering `Error`: notify `on_error`
        NotifyError,
    }

    impl Effect {
        /// Entry effect for a state tag
        #[must_use]
        pub const fn on_enter(tag: StateTag) -> Self {
            match tag {
                StateTag::Idle => Self::None,
                StateTag::Loading => Self::StartOperation,
                StateTag::Success => Self::NotifySuccess,
                StateTag::Error => Self::NotifyError,
            }
        }

        /// Whether this is the no-op effect
        #[must_use]
        pub const fn is_none(self) -> bool {
            matches!(self, Self::None)
        }

        /// Stable name, used for log fields and metric labels
        #[must_use]
        pub const fn as_str(self) -> &'static str {
            match self {
                Self::None => "none",
                Self::StartOperation => "start_operation",
                Self::NotifySuccess => "notify_success",
                Self::NotifyError => "notify_error",
            }
        }
    }
}

/// Environment module - dependency injection traits
///
/// Everything the driver needs from its host is abstracted behind a trait and
/// injected through [`TrackerEnvironment`](environment::TrackerEnvironment).
pub mod environment {
    use chrono::{DateTime, Utc};
    use std::sync::Arc;
    use std::sync::atomic::{AtomicBool, Ordering};

    /// Clock trait - abstracts time operations for testability
    ///
    /// # Examples
    ///
    /// ```ignore
    /// // Test - fixed time for deterministic tests
    /// struct FixedClock { time: DateTime<Utc> }
    /// impl Clock for FixedClock {
    ///     fn now(&self) -> DateTime<Utc> {
    ///         self.time
    ///     }
    /// }
    /// ```
    pub trait Clock: Send + Sync {
        /// Get the current time
        fn now(&self) -> DateTime<Utc>;
    }

    /// Wall clock
    #[derive(Debug, Clone, Copy, Default)]
    pub struct SystemClock;

    impl Clock for SystemClock {
        fn now(&self) -> DateTime<Utc> {
            Utc::now()
        }
    }

    /// Owner liveness signal
    ///
    /// The tracker consults this once per asynchronous completion, right
    /// before applying it. A `false` answer drops the completion silently.
    pub trait Liveness: Send + Sync {
        /// Whether the owner of the tracker is still active
        fn is_alive(&self) -> bool;
    }

    impl<F> Liveness for F
    where
        F: Fn() -> bool + Send + Sync,
    {
        fn is_alive(&self) -> bool {
            self()
        }
    }

    /// Liveness for owners that never go away
    #[derive(Debug, Clone, Copy, Default)]
    pub struct AlwaysAlive;

    impl Liveness for AlwaysAlive {
        fn is_alive(&self) -> bool {
            true
        }
    }

    /// Shared owner guard
    ///
    /// Starts alive; any clone can call [`teardown`](Self::teardown) and every
    /// clone observes it.
    ///
    /// ```
    /// use async_tracker_core::environment::{Liveness, LivenessFlag};
    ///
    /// let owner = LivenessFlag::new();
    /// let seen_by_tracker = owner.clone();
    /// owner.teardown();
    /// assert!(!seen_by_tracker.is_alive());
    /// ```
    #[derive(Debug, Clone)]
    pub struct LivenessFlag {
        alive: Arc<AtomicBool>,
    }

    impl LivenessFlag {
        /// Create an alive flag
        #[must_use]
        pub fn new() -> Self {
            Self {
                alive: Arc::new(AtomicBool::new(true)),
            }
        }

        /// Mark the owner as gone
        pub fn teardown(&self) {
            self.alive.store(false, Ordering::Release);
        }
    }

    impl Default for LivenessFlag {
        fn default() -> Self {
            Self::new()
        }
    }

    impl Liveness for LivenessFlag {
        fn is_alive(&self) -> bool {
            self.alive.load(Ordering::Acquire)
        }
    }

    /// Collaborators injected into a tracker
    ///
    /// Defaults to [`AlwaysAlive`] and [`SystemClock`].
    #[derive(Clone)]
    pub struct TrackerEnvironment {
        /// Owner liveness predicate
        pub liveness: Arc<dyn Liveness>,
        /// Time source for `entered_at` and operation durations
        pub clock: Arc<dyn Clock>,
    }

    impl TrackerEnvironment {
        /// Create an environment from explicit collaborators
        #[must_use]
        pub fn new(liveness: Arc<dyn Liveness>, clock: Arc<dyn Clock>) -> Self {
            Self { liveness, clock }
        }

        /// Replace the liveness predicate
        #[must_use]
        pub fn with_liveness(mut self, liveness: impl Liveness + 'static) -> Self {
            self.liveness = Arc::new(liveness);
            self
        }

        /// Replace the clock
        #[must_use]
        pub fn with_clock(mut self, clock: impl Clock + 'static) -> Self {
            self.clock = Arc::new(clock);
            self
        }
    }

    impl Default for TrackerEnvironment {
        fn default() -> Self {
            Self::new(Arc::new(AlwaysAlive), Arc::new(SystemClock))
        }
    }

    impl std::fmt::Debug for TrackerEnvironment {
        fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
            f.debug_struct("TrackerEnvironment")
                .field("alive", &self.liveness.is_alive())
                .finish_non_exhaustive()
        }
    }
}
