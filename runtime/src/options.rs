//! Tracker configuration.

use async_tracker_core::AsyncState;
use std::sync::Arc;

/// Lifecycle callback, invoked with the state that was just entered
pub type Callback<D, E, C> = Arc<dyn Fn(&AsyncState<D, E, C>) + Send + Sync>;

/// Default capacity of the state broadcast channel
pub const DEFAULT_BROADCAST_CAPACITY: usize = 16;

/// Options for an [`OperationTracker`](crate::OperationTracker)
///
/// Every callback is optional; a missing one is simply not called.
///
/// # Example
///
/// ```
/// use async_tracker_runtime::TrackerOptions;
///
/// let options = TrackerOptions::<u32, String, String>::new()
///     .on_success(|state| println!("loaded {:?}", state.data()))
///     .on_error(|state| eprintln!("failed: {:?}", state.error()))
///     .with_broadcast_capacity(64);
/// assert!(options.has_on_success());
/// assert!(!options.has_on_load());
/// ```
pub struct TrackerOptions<D, E, C> {
    pub(crate) on_load: Option<Callback<D, E, C>>,
    pub(crate) on_success: Option<Callback<D, E, C>>,
    pub(crate) on_error: Option<Callback<D, E, C>>,
    pub(crate) broadcast_capacity: usize,
}

impl<D, E, C> TrackerOptions<D, E, C> {
    /// Options with no callbacks and the default broadcast capacity
    #[must_use]
    pub const fn new() -> Self {
        Self {
            on_load: None,
            on_success: None,
            on_error: None,
            broadcast_capacity: DEFAULT_BROADCAST_CAPACITY,
        }
    }

    /// Called with the `Loading` state just before the producer is invoked
    #[must_use]
    pub fn on_load<F>(mut self, callback: F) -> Self
    where
        F: Fn(&AsyncState<D, E, C>) + Send + Sync + 'static,
    {
        self.on_load = Some(Arc::new(callback));
        self
    }

    /// Called with the `Success` state each time it is entered
    #[must_use]
    pub fn on_success<F>(mut self, callback: F) -> Self
    where
        F: Fn(&AsyncState<D, E, C>) + Send + Sync + 'static,
    {
        self.on_success = Some(Arc::new(callback));
        self
    }

    /// Called with the `Error` state each time it is entered
    #[must_use]
    pub fn on_error<F>(mut self, callback: F) -> Self
    where
        F: Fn(&AsyncState<D, E, C>) + Send + Sync + 'static,
    {
        self.on_error = Some(Arc::new(callback));
        self
    }

    /// Number of state snapshots buffered for slow subscribers
    ///
    /// Clamped to at least 1.
    #[must_use]
    pub fn with_broadcast_capacity(mut self, capacity: usize) -> Self {
        self.broadcast_capacity = capacity.max(1);
        self
    }

    /// Whether an `on_load` callback is configured
    #[must_use]
    pub const fn has_on_load(&self) -> bool {
        self.on_load.is_some()
    }

    /// Whether an `on_success` callback is configured
    #[must_use]
    pub const fn has_on_success(&self) -> bool {
        self.on_success.is_some()
    }

    /// Whether an `on_error` callback is configured
    #[must_use]
    pub const fn has_on_error(&self) -> bool {
        self.on_error.is_some()
    }

    /// Configured broadcast capacity
    #[must_use]
    pub const fn broadcast_capacity(&self) -> usize {
        self.broadcast_capacity
    }
}

impl<D, E, C> Default for TrackerOptions<D, E, C> {
    fn default() -> Self {
        Self::new()
    }
}

impl<D, E, C> Clone for TrackerOptions<D, E, C> {
    fn clone(&self) -> Self {
        Self {
            on_load: self.on_load.clone(),
            on_success: self.on_success.clone(),
            on_error: self.on_error.clone(),
            broadcast_capacity: self.broadcast_capacity,
        }
    }
}

impl<D, E, C> std::fmt::Debug for TrackerOptions<D, E, C> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TrackerOptions")
            .field("on_load", &self.has_on_load())
            .field("on_success", &self.has_on_success())
            .field("on_error", &self.has_on_error())
            .field("broadcast_capacity", &self.broadcast_capacity)
            .finish()
    }
}
