//! The operation tracker.
//!
//! # Dispatch
//!
//! Every event, whether sent by the caller or produced by a settling
//! operation, goes through the same path:
//!
//! 1. Take the write lock on the current state (this is what serializes
//!    dispatch, events apply strictly in arrival order)
//! 2. Run the reducer; an ignored event stops here
//! 3. Stamp the transition (generation, `entered_at`), record metrics,
//!    broadcast the new state
//! 4. Execute the entry effect of the new state, still under the lock, so
//!    exactly one effect runs per transition and effects never interleave
//!
//! # Stale completions
//!
//! The task awaiting a producer's future holds only a `Weak` reference to the
//! tracker. If the tracker is gone when the future settles the result is
//! dropped. Otherwise the owner's liveness predicate is consulted right before
//! applying, and a dead owner (or a torn-down tracker) drops it as well. The
//! producer's computation itself is never aborted.

use crate::error::{InvalidProducerError, TrackerError};
use crate::handle::{DecrementGuard, EffectHandle, EffectTracking};
use crate::metrics::TrackerMetrics;
use crate::options::{Callback, TrackerOptions};
use crate::producer::{Producer, Production};
use async_tracker_core::{
    AsyncEvent, AsyncState, StateTag,
    effect::Effect,
    environment::TrackerEnvironment,
    reducer::{AsyncReducer, Reducer},
};
use chrono::{DateTime, Utc};
use futures::future::BoxFuture;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{RwLock, broadcast};

/// State plus bookkeeping about when it was entered
struct Current<D, E, C> {
    state: AsyncState<D, E, C>,
    generation: u64,
    entered_at: DateTime<Utc>,
}

struct Shared<D, E, C> {
    current: RwLock<Current<D, E, C>>,
    reducer: AsyncReducer<D, E, C>,
    producer: Box<dyn Producer<D, E, C>>,
    options: TrackerOptions<D, E, C>,
    environment: TrackerEnvironment,
    torn_down: AtomicBool,
    state_broadcast: broadcast::Sender<AsyncState<D, E, C>>,
}

/// Where an event came from
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Origin {
    Caller,
    Completion,
}

/// Tracks the lifecycle of a single asynchronous operation
///
/// Starts `Idle`. A `Load` moves it to `Loading`, which invokes the producer;
/// the producer's eventual result moves it to `Success` or `Error`. `Reset`
/// returns a settled tracker to `Idle`, and `Load` from a settled state starts
/// over. While `Loading`, further `Load`s are ignored, so at most one
/// operation is in flight.
///
/// Cloning is cheap and every clone shares the same state.
///
/// # Type Parameters
///
/// - `D`: Data the operation resolves with
/// - `E`: Error the operation fails with
/// - `C`: Context supplied with `Load`
pub struct OperationTracker<D, E, C> {
    shared: Arc<Shared<D, E, C>>,
}

impl<D, E, C> OperationTracker<D, E, C>
where
    D: Clone + Send + Sync + 'static,
    E: Clone + Send + Sync + 'static,
    C: Clone + Send + Sync + 'static,
{
    /// Create a tracker with no callbacks and the default environment
    #[must_use]
    pub fn new<P>(producer: P) -> Self
    where
        P: Producer<D, E, C> + 'static,
    {
        Self::with_environment(producer, TrackerOptions::default(), TrackerEnvironment::default())
    }

    /// Create a tracker with lifecycle callbacks
    #[must_use]
    pub fn with_options<P>(producer: P, options: TrackerOptions<D, E, C>) -> Self
    where
        P: Producer<D, E, C> + 'static,
    {
        Self::with_environment(producer, options, TrackerEnvironment::default())
    }

    /// Create a tracker with callbacks and injected collaborators
    ///
    /// # Arguments
    ///
    /// - `producer`: Starts the operation each time `Loading` is entered
    /// - `options`: Lifecycle callbacks and broadcast capacity
    /// - `environment`: Owner liveness predicate and clock
    #[must_use]
    pub fn with_environment<P>(
        producer: P,
        options: TrackerOptions<D, E, C>,
        environment: TrackerEnvironment,
    ) -> Self
    where
        P: Producer<D, E, C> + 'static,
    {
        let (state_broadcast, _) = broadcast::channel(options.broadcast_capacity());
        let entered_at = environment.clock.now();

        Self {
            shared: Arc::new(Shared {
                current: RwLock::new(Current {
                    state: AsyncState::Idle,
                    generation: 0,
                    entered_at,
                }),
                reducer: AsyncReducer::new(),
                producer: Box::new(producer),
                options,
                environment,
                torn_down: AtomicBool::new(false),
                state_broadcast,
            }),
        }
    }

    /// Send an event to the tracker
    ///
    /// Applies the transition table and, if the state changed, performs the
    /// entry effect of the new state before returning.
    ///
    /// Caller events are gated only by [`teardown`](Self::teardown), not by
    /// the environment's liveness predicate: a `Load` sent after the owner is
    /// gone still invokes the producer, and its completion is then dropped.
    /// Call `teardown` alongside the owner going away to refuse new work.
    ///
    /// # Returns
    ///
    /// An [`EffectHandle`] that completes once the operation started by this
    /// event (if any) has settled and its result was applied.
    ///
    /// # Errors
    ///
    /// - [`TrackerError::TornDown`] if [`teardown`](Self::teardown) was called
    /// - [`TrackerError::InvalidProducer`] if the event entered `Loading` and
    ///   the producer returned a plain value; the state stays `Loading`
    #[tracing::instrument(skip(self, event), fields(event = %event.tag()), name = "tracker_send")]
    pub async fn send(&self, event: AsyncEvent<D, E, C>) -> Result<EffectHandle, TrackerError> {
        if self.is_torn_down() {
            tracing::warn!("Rejected event: tracker is torn down");
            return Err(TrackerError::TornDown);
        }

        self.apply(event, Origin::Caller).await
    }

    /// Start an operation with `context`
    ///
    /// Shorthand for `send(AsyncEvent::Load { context })`.
    ///
    /// # Errors
    ///
    /// See [`send`](Self::send).
    pub async fn load(&self, context: C) -> Result<EffectHandle, TrackerError> {
        self.send(AsyncEvent::Load { context }).await
    }

    /// Return a settled tracker to `Idle`
    ///
    /// # Errors
    ///
    /// See [`send`](Self::send).
    pub async fn reset(&self) -> Result<EffectHandle, TrackerError> {
        self.send(AsyncEvent::Reset).await
    }

    /// Send an event and wait for the first state matching `predicate`
    ///
    /// Subscribes before sending, so a state entered while the event is being
    /// applied is not missed. Only states entered after the send are
    /// considered.
    ///
    /// # Errors
    ///
    /// - [`TrackerError::Timeout`]: no matching state within `timeout`
    /// - [`TrackerError::ChannelClosed`]: the broadcast channel closed
    /// - Any error from [`send`](Self::send)
    pub async fn send_and_wait_for<F>(
        &self,
        event: AsyncEvent<D, E, C>,
        predicate: F,
        timeout: Duration,
    ) -> Result<AsyncState<D, E, C>, TrackerError>
    where
        F: Fn(&AsyncState<D, E, C>) -> bool,
    {
        // Subscribe BEFORE sending to avoid race condition
        let mut rx = self.subscribe();

        self.send(event).await?;

        tokio::time::timeout(timeout, async {
            loop {
                match rx.recv().await {
                    Ok(state) if predicate(&state) => return Ok(state),
                    Ok(_) => {},
                    Err(broadcast::error::RecvError::Lagged(skipped)) => {
                        tracing::warn!(skipped, "State subscriber lagged, {} states skipped", skipped);
                    },
                    Err(broadcast::error::RecvError::Closed) => {
                        return Err(TrackerError::ChannelClosed);
                    },
                }
            }
        })
        .await
        .map_err(|_| TrackerError::Timeout)?
    }

    /// Start an operation and wait until it settles
    ///
    /// If an operation is already in flight the `Load` is ignored and this
    /// waits for that operation instead.
    ///
    /// # Errors
    ///
    /// See [`send_and_wait_for`](Self::send_and_wait_for).
    pub async fn load_and_wait(
        &self,
        context: C,
        timeout: Duration,
    ) -> Result<AsyncState<D, E, C>, TrackerError> {
        self.send_and_wait_for(
            AsyncEvent::Load { context },
            |state| state.tag().is_settled(),
            timeout,
        )
        .await
    }

    /// Read current state via a closure
    ///
    /// ```ignore
    /// let loaded = tracker.state(|s| s.data().cloned()).await;
    /// ```
    pub async fn state<F, T>(&self, f: F) -> T
    where
        F: FnOnce(&AsyncState<D, E, C>) -> T,
    {
        let current = self.shared.current.read().await;
        f(&current.state)
    }

    /// Clone of the current state
    pub async fn snapshot(&self) -> AsyncState<D, E, C> {
        self.state(AsyncState::clone).await
    }

    /// Tag of the current state
    pub async fn status(&self) -> StateTag {
        self.state(AsyncState::tag).await
    }

    /// Number of transitions applied so far
    pub async fn generation(&self) -> u64 {
        self.shared.current.read().await.generation
    }

    /// When the current state was entered, per the injected clock
    pub async fn entered_at(&self) -> DateTime<Utc> {
        self.shared.current.read().await.entered_at
    }

    /// Subscribe to every state the tracker enters
    ///
    /// Ignored events produce nothing. A receiver that falls more than the
    /// configured broadcast capacity behind gets `RecvError::Lagged`.
    #[must_use]
    pub fn subscribe(&self) -> broadcast::Receiver<AsyncState<D, E, C>> {
        self.shared.state_broadcast.subscribe()
    }

    /// Mark the owner as gone
    ///
    /// Further `send`s fail with [`TrackerError::TornDown`] and completions of
    /// operations still in flight are discarded.
    pub fn teardown(&self) {
        if !self.shared.torn_down.swap(true, Ordering::AcqRel) {
            tracing::info!("Tracker torn down, pending completions will be discarded");
        }
    }

    /// Whether [`teardown`](Self::teardown) was called
    #[must_use]
    pub fn is_torn_down(&self) -> bool {
        self.shared.torn_down.load(Ordering::Acquire)
    }

    /// Guard for completions, consulted right before one is applied
    fn completion_allowed(&self) -> bool {
        !self.is_torn_down() && self.shared.environment.liveness.is_alive()
    }

    async fn apply(
        &self,
        event: AsyncEvent<D, E, C>,
        origin: Origin,
    ) -> Result<EffectHandle, TrackerError> {
        let (handle, tracking) = EffectHandle::new();
        let event_tag = event.tag();

        let mut current = self.shared.current.write().await;
        tracing::trace!("Acquired write lock on state");

        if origin == Origin::Completion && !self.completion_allowed() {
            tracing::warn!(event = %event_tag, "Owner is gone, suppressing completion");
            TrackerMetrics::record_suppressed();
            return Ok(handle);
        }

        let from = current.state.tag();
        let Some(effect) = self.shared.reducer.reduce(&mut current.state, event) else {
            tracing::trace!(state = %from, event = %event_tag, "No transition, event ignored");
            TrackerMetrics::record_ignored(from, event_tag);
            return Ok(handle);
        };

        let to = current.state.tag();
        let now = self.shared.environment.clock.now();
        if from == StateTag::Loading {
            let elapsed = (now - current.entered_at).to_std().unwrap_or(Duration::ZERO);
            TrackerMetrics::record_operation(to, elapsed);
        }
        current.generation += 1;
        current.entered_at = now;

        TrackerMetrics::record_transition(from, to);
        tracing::debug!(
            from = %from,
            to = %to,
            generation = current.generation,
            ?origin,
            "State transition applied"
        );

        // No subscribers is fine
        let _ = self.shared.state_broadcast.send(current.state.clone());

        self.execute_effect(effect, &current.state, &tracking)?;
        Ok(handle)
    }

    /// Execute the entry effect of `state`
    ///
    /// # Errors
    ///
    /// Returns [`InvalidProducerError`] if the producer did not return a
    /// deferred value.
    fn execute_effect(
        &self,
        effect: Effect,
        state: &AsyncState<D, E, C>,
        tracking: &EffectTracking,
    ) -> Result<(), InvalidProducerError> {
        let options = &self.shared.options;

        match effect {
            Effect::None => {
                tracing::trace!("Entered idle, nothing to execute");
            },
            Effect::StartOperation => {
                notify(options.on_load.as_ref(), "on_load", state);

                match self.shared.producer.produce(state) {
                    Production::Deferred(future) => {
                        tracing::trace!("Producer returned a deferred value, awaiting it");
                        self.spawn_completion(future, tracking.clone());
                    },
                    Production::Plain(_) => {
                        tracing::error!(
                            state = %state.tag(),
                            "Producer returned a plain value instead of a deferred one"
                        );
                        TrackerMetrics::record_invalid_producer();
                        return Err(InvalidProducerError { state: state.tag() });
                    },
                }
            },
            Effect::NotifySuccess => notify(options.on_success.as_ref(), "on_success", state),
            Effect::NotifyError => notify(options.on_error.as_ref(), "on_error", state),
        }

        Ok(())
    }

    /// Await `future` on the runtime and feed its result back
    fn spawn_completion(&self, future: BoxFuture<'static, Result<D, E>>, tracking: EffectTracking) {
        tracking.increment();
        let weak = Arc::downgrade(&self.shared);

        tokio::spawn(async move {
            let _guard = DecrementGuard(tracking);

            let event = AsyncEvent::from_result(future.await);

            let Some(shared) = weak.upgrade() else {
                tracing::debug!(event = %event.tag(), "Tracker dropped before the operation settled");
                TrackerMetrics::record_suppressed();
                return;
            };

            let tracker = Self { shared };
            if let Err(error) = tracker.apply(event, Origin::Completion).await {
                tracing::warn!(error = %error, "Applying completion failed");
            }
        });
    }
}

fn notify<D, E, C>(callback: Option<&Callback<D, E, C>>, name: &'static str, state: &AsyncState<D, E, C>) {
    if let Some(callback) = callback {
        tracing::trace!(callback = name, "Invoking lifecycle callback");
        TrackerMetrics::record_callback(name);
        callback(state);
    }
}

impl<D, E, C> Clone for OperationTracker<D, E, C> {
    fn clone(&self) -> Self {
        Self {
            shared: Arc::clone(&self.shared),
        }
    }
}

impl<D, E, C> std::fmt::Debug for OperationTracker<D, E, C> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OperationTracker")
            .field("options", &self.shared.options)
            .field("torn_down", &self.shared.torn_down.load(Ordering::Acquire))
            .finish_non_exhaustive()
    }
}
