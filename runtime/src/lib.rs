//! # Async Tracker Runtime
//!
//! Runtime driver for the async tracker.
//!
//! This crate provides [`OperationTracker`], which owns an
//! [`AsyncState`](async_tracker_core::AsyncState), applies events to it through
//! the pure state machine, and performs the one side effect attached to each
//! state it enters.
//!
//! ## Core Components
//!
//! - **`OperationTracker`**: Holds state, serializes dispatch, executes entry effects
//! - **Producer**: Starts the tracked operation and hands back a deferred result
//! - **`TrackerOptions`**: Optional `on_load`/`on_success`/`on_error` callbacks
//! - **`EffectHandle`**: Awaitable completion of the effects a dispatch started
//!
//! ## Example
//!
//! ```ignore
//! use async_tracker_runtime::{OperationTracker, Production, TrackerOptions};
//!
//! let tracker = OperationTracker::with_options(
//!     |state: &AsyncState<User, ApiError, UserId>| {
//!         let id = state.context().copied();
//!         Production::deferred(async move { fetch_user(id).await })
//!     },
//!     TrackerOptions::new().on_success(|state| println!("{:?}", state.data())),
//! );
//!
//! let mut handle = tracker.load(UserId(7)).await?;
//! handle.wait().await;
//! assert!(tracker.snapshot().await.is_success());
//! ```

/// Completion tracking for dispatched events
pub mod handle;

/// Prometheus metrics for observability
pub mod metrics;

/// Tracker configuration
pub mod options;

/// Producers of the tracked operation
pub mod producer;

/// The tracker itself
pub mod tracker;

/// Error types for the tracker runtime
pub mod error {
    use async_tracker_core::StateTag;
    use thiserror::Error;

    /// The producer handed back a plain value instead of a deferred one
    ///
    /// This is a programming error. It is reported synchronously from the
    /// dispatch that entered `Loading` and never turned into an `Error` state.
    #[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
    #[error("The producer passed to the tracker must return a deferred value (entered {state})")]
    pub struct InvalidProducerError {
        /// State the tracker was in when the producer was invoked
        pub state: StateTag,
    }

    /// Errors that can occur during tracker operations
    #[derive(Error, Debug)]
    pub enum TrackerError {
        /// The producer did not return a deferred value
        ///
        /// The tracker stays in `Loading`.
        #[error(transparent)]
        InvalidProducer(#[from] InvalidProducerError),

        /// Tracker has been torn down and is not accepting events
        ///
        /// Returned when `send()` is called after `teardown()`. Completions
        /// are never rejected this way; they are dropped silently.
        #[error("Tracker has been torn down")]
        TornDown,

        /// Timeout waiting for a matching state
        ///
        /// Returned by `send_and_wait_for` when the timeout expires first.
        #[error("Timeout waiting for state")]
        Timeout,

        /// State broadcast channel closed
        #[error("State broadcast channel closed")]
        ChannelClosed,
    }
}

pub use error::{InvalidProducerError, TrackerError};
pub use handle::EffectHandle;
pub use options::TrackerOptions;
pub use producer::{Producer, Production};
pub use tracker::OperationTracker;
