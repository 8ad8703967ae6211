//! # Async Tracker Testing
//!
//! Testing utilities and helpers for the async tracker.
//!
//! This crate provides:
//! - Mock implementations of environment traits ([`FixedClock`])
//! - A producer whose operations the test settles by hand ([`ControlledProducer`])
//! - A recorder for lifecycle callbacks ([`CallbackRecorder`])
//! - A Given-When-Then harness for reducers ([`ReducerTest`])
//! - Property-based testing strategies
//!
//! ## Example
//!
//! ```ignore
//! use async_tracker_testing::{CallbackRecorder, ControlledProducer};
//!
//! #[tokio::test]
//! async fn test_fetch_flow() {
//!     let producer = ControlledProducer::new();
//!     let recorder = CallbackRecorder::new();
//!     let tracker = OperationTracker::with_options(producer.clone(), recorder.options());
//!
//!     let mut handle = tracker.load("x".to_string()).await?;
//!     producer.resolve(42);
//!     handle.wait().await;
//!
//!     assert_eq!(recorder.count(LifecycleHook::OnSuccess), 1);
//! }
//! ```

use async_tracker_core::environment::Clock;
use chrono::{DateTime, Utc};


pub use reducer_test::{ReducerTest, assertions};

/// Mock implementations for testing.
pub mod mocks {
    use super::{Clock, DateTime, Utc};
    use async_tracker_core::AsyncState;
    use async_tracker_runtime::{Producer, Production, TrackerOptions};
    use std::collections::VecDeque;
    use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
    use tokio::sync::oneshot;

    /// Fixed clock for deterministic tests
    ///
    /// Always returns the same time, making tests reproducible.
    ///
    /// # Example
    ///
    /// ```
    /// use async_tracker_testing::mocks::FixedClock;
    /// use async_tracker_core::environment::Clock;
    /// use chrono::Utc;
    ///
    /// let clock = FixedClock::new(Utc::now());
    /// let time1 = clock.now();
    /// let time2 = clock.now();
    /// assert_eq!(time1, time2); // Always the same!
    /// ```
    #[derive(Debug, Clone)]
    pub struct FixedClock {
        time: DateTime<Utc>,
    }

    impl FixedClock {
        /// Create a new fixed clock with the given time
        #[must_use]
        pub const fn new(time: DateTime<Utc>) -> Self {
            Self { time }
        }
    }

    impl Clock for FixedClock {
        fn now(&self) -> DateTime<Utc> {
            self.time
        }
    }

    /// Create a default fixed clock for tests (2025-01-01 00:00:00 UTC)
    ///
    /// # Panics
    ///
    /// This function will panic if the hardcoded timestamp fails to parse,
    /// which should never happen in practice.
    #[must_use]
    #[allow(clippy::expect_used)]
    pub fn test_clock() -> FixedClock {
        FixedClock::new(
            DateTime::parse_from_rfc3339("2025-01-01T00:00:00Z")
                .expect("hardcoded timestamp should always parse")
                .with_timezone(&Utc),
        )
    }

    fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
        mutex.lock().unwrap_or_else(PoisonError::into_inner)
    }

    struct ControlledInner<D, E, C> {
        calls: Vec<AsyncState<D, E, C>>,
        pending: VecDeque<oneshot::Sender<Result<D, E>>>,
    }

    /// Producer whose operations are settled by the test
    ///
    /// Every invocation records the state it was called with and returns a
    /// deferred value that stays pending until [`resolve`](Self::resolve) or
    /// [`reject`](Self::reject) is called. Operations settle oldest first.
    /// If the producer is dropped with operations outstanding, they never
    /// settle.
    pub struct ControlledProducer<D, E, C> {
        inner: Arc<Mutex<ControlledInner<D, E, C>>>,
    }

    impl<D, E, C> ControlledProducer<D, E, C> {
        /// Create a producer with no outstanding operations
        #[must_use]
        pub fn new() -> Self {
            Self {
                inner: Arc::new(Mutex::new(ControlledInner {
                    calls: Vec::new(),
                    pending: VecDeque::new(),
                })),
            }
        }

        /// Number of times the producer was invoked
        #[must_use]
        pub fn call_count(&self) -> usize {
            lock(&self.inner).calls.len()
        }

        /// States the producer was invoked with, in order
        #[must_use]
        pub fn calls(&self) -> Vec<AsyncState<D, E, C>>
        where
            D: Clone,
            E: Clone,
            C: Clone,
        {
            lock(&self.inner).calls.clone()
        }

        /// Number of operations that have not been settled
        #[must_use]
        pub fn pending(&self) -> usize {
            lock(&self.inner).pending.len()
        }

        /// Settle the oldest outstanding operation with `data`
        ///
        /// Returns `false` if nothing was outstanding.
        pub fn resolve(&self, data: D) -> bool {
            self.settle(Ok(data))
        }

        /// Fail the oldest outstanding operation with `error`
        ///
        /// Returns `false` if nothing was outstanding.
        pub fn reject(&self, error: E) -> bool {
            self.settle(Err(error))
        }

        fn settle(&self, result: Result<D, E>) -> bool {
            let sender = lock(&self.inner).pending.pop_front();
            // A closed receiver means the awaiting task is gone; still counts as settled.
            sender.is_some_and(|tx| {
                let _ = tx.send(result);
                true
            })
        }
    }

    impl<D, E, C> Default for ControlledProducer<D, E, C> {
        fn default() -> Self {
            Self::new()
        }
    }

    impl<D, E, C> Clone for ControlledProducer<D, E, C> {
        fn clone(&self) -> Self {
            Self {
                inner: Arc::clone(&self.inner),
            }
        }
    }

    impl<D, E, C> Producer<D, E, C> for ControlledProducer<D, E, C>
    where
        D: Clone + Send + 'static,
        E: Clone + Send + 'static,
        C: Clone + Send,
    {
        fn produce(&self, state: &AsyncState<D, E, C>) -> Production<D, E> {
            let (tx, rx) = oneshot::channel();
            {
                let mut inner = lock(&self.inner);
                inner.calls.push(state.clone());
                inner.pending.push_back(tx);
            }

            Production::deferred(async move {
                match rx.await {
                    Ok(result) => result,
                    Err(_) => std::future::pending().await,
                }
            })
        }
    }

    /// Lifecycle callbacks a [`CallbackRecorder`] listens to
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub enum LifecycleHook {
        /// `on_load`
        OnLoad,
        /// `on_success`
        OnSuccess,
        /// `on_error`
        OnError,
    }

    type Recorded<D, E, C> = Vec<(LifecycleHook, AsyncState<D, E, C>)>;

    /// Records every lifecycle callback invocation
    ///
    /// ```ignore
    /// let recorder = CallbackRecorder::new();
    /// let tracker = OperationTracker::with_options(producer, recorder.options());
    /// ```
    pub struct CallbackRecorder<D, E, C> {
        calls: Arc<Mutex<Recorded<D, E, C>>>,
    }

    impl<D, E, C> CallbackRecorder<D, E, C>
    where
        D: Clone + Send + 'static,
        E: Clone + Send + 'static,
        C: Clone + Send + 'static,
    {
        /// Create an empty recorder
        #[must_use]
        pub fn new() -> Self {
            Self {
                calls: Arc::new(Mutex::new(Vec::new())),
            }
        }

        /// Tracker options with all three callbacks wired to this recorder
        #[must_use]
        pub fn options(&self) -> TrackerOptions<D, E, C> {
            let (on_load, on_success, on_error) = (self.clone(), self.clone(), self.clone());
            TrackerOptions::new()
                .on_load(move |state| on_load.record(LifecycleHook::OnLoad, state))
                .on_success(move |state| on_success.record(LifecycleHook::OnSuccess, state))
                .on_error(move |state| on_error.record(LifecycleHook::OnError, state))
        }

        fn record(&self, hook: LifecycleHook, state: &AsyncState<D, E, C>) {
            lock(&self.calls).push((hook, state.clone()));
        }

        /// Every invocation, in order
        #[must_use]
        pub fn calls(&self) -> Recorded<D, E, C> {
            lock(&self.calls).clone()
        }

        /// Number of invocations of `hook`
        #[must_use]
        pub fn count(&self, hook: LifecycleHook) -> usize {
            lock(&self.calls).iter().filter(|(h, _)| *h == hook).count()
        }

        /// States `hook` was invoked with, in order
        #[must_use]
        pub fn states(&self, hook: LifecycleHook) -> Vec<AsyncState<D, E, C>> {
            lock(&self.calls)
                .iter()
                .filter(|(h, _)| *h == hook)
                .map(|(_, state)| state.clone())
                .collect()
        }
    }

    impl<D, E, C> Default for CallbackRecorder<D, E, C>
    where
        D: Clone + Send + 'static,
        E: Clone + Send + 'static,
        C: Clone + Send + 'static,
    {
        fn default() -> Self {
            Self::new()
        }
    }

    impl<D, E, C> Clone for CallbackRecorder<D, E, C> {
        fn clone(&self) -> Self {
            Self {
                calls: Arc::clone(&self.calls),
            }
        }
    }
}

/// Property-based testing strategies for tracker states and events
pub mod properties {
    use async_tracker_core::{AsyncEvent, AsyncState};
    use proptest::prelude::*;

    /// State type used by the strategies
    pub type PropState = AsyncState<i32, String, String>;

    /// Event type used by the strategies
    pub type PropEvent = AsyncEvent<i32, String, String>;

    /// Any state, with arbitrary payloads
    pub fn arb_state() -> impl Strategy<Value = PropState> {
        prop_oneof![
            Just(AsyncState::Idle),
            "[a-z0-9]{0,12}".prop_map(|context| AsyncState::Loading { context }),
            any::<i32>().prop_map(|data| AsyncState::Success { data }),
            "[a-z ]{1,16}".prop_map(|error| AsyncState::Error { error }),
        ]
    }

    /// Any event, with arbitrary payloads
    pub fn arb_event() -> impl Strategy<Value = PropEvent> {
        prop_oneof![
            "[a-z0-9]{0,12}".prop_map(|context| AsyncEvent::Load { context }),
            any::<i32>().prop_map(|data| AsyncEvent::AsyncSuccess { data }),
            "[a-z ]{1,16}".prop_map(|error| AsyncEvent::AsyncError { error }),
            Just(AsyncEvent::Reset),
        ]
    }

    /// A settled state (`Success` or `Error`)
    pub fn arb_settled_state() -> impl Strategy<Value = PropState> {
        prop_oneof![
            any::<i32>().prop_map(|data| AsyncState::Success { data }),
            "[a-z ]{1,16}".prop_map(|error| AsyncState::Error { error }),
        ]
    }
}

// Re-export commonly used items
pub use mocks::{CallbackRecorder, ControlledProducer, FixedClock, LifecycleHook, test_clock};
