//! Producers of the tracked operation.
//!
//! A producer is invoked each time the tracker enters `Loading` and must hand
//! back a deferred result. Handing back a plain value is a programming error:
//! the tracker refuses it with [`InvalidProducerError`](crate::error::InvalidProducerError)
//! rather than pretending the operation already settled.

use async_tracker_core::AsyncState;
use futures::future::BoxFuture;
use std::future::Future;

/// What a producer hands back
pub enum Production<D, E> {
    /// An eventual result; the tracker awaits it on the tokio runtime
    Deferred(BoxFuture<'static, Result<D, E>>),
    /// A value that was never deferred; rejected by the tracker
    Plain(Result<D, E>),
}

impl<D, E> Production<D, E> {
    /// Wrap a future as a deferred production
    pub fn deferred<F>(future: F) -> Self
    where
        F: Future<Output = Result<D, E>> + Send + 'static,
    {
        Self::Deferred(Box::pin(future))
    }

    /// Whether this production can be awaited
    #[must_use]
    pub const fn is_deferred(&self) -> bool {
        matches!(self, Self::Deferred(_))
    }
}

impl<D, E> From<BoxFuture<'static, Result<D, E>>> for Production<D, E> {
    fn from(future: BoxFuture<'static, Result<D, E>>) -> Self {
        Self::Deferred(future)
    }
}

// Manual Debug implementation since Future doesn't implement Debug
impl<D, E> std::fmt::Debug for Production<D, E> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Deferred(_) => write!(f, "Production::Deferred(<future>)"),
            Self::Plain(_) => write!(f, "Production::Plain(<value>)"),
        }
    }
}

/// Starts the tracked operation
///
/// Receives the `Loading` state that triggered it, so the start context is
/// available through [`AsyncState::context`].
///
/// Any `Fn(&AsyncState<D, E, C>) -> Production<D, E>` closure is a producer:
///
/// ```
/// use async_tracker_runtime::{Production, Producer};
/// use async_tracker_core::AsyncState;
///
/// let producer = |state: &AsyncState<usize, String, String>| {
///     let name = state.context().cloned().unwrap_or_default();
///     Production::deferred(async move { Ok::<_, String>(name.len()) })
/// };
/// let loading = AsyncState::Loading { context: "ada".to_string() };
/// assert!(producer.produce(&loading).is_deferred());
/// ```
pub trait Producer<D, E, C>: Send + Sync {
    /// Invoke the operation for `state`
    fn produce(&self, state: &AsyncState<D, E, C>) -> Production<D, E>;
}

impl<D, E, C, F> Producer<D, E, C> for F
where
    F: Fn(&AsyncState<D, E, C>) -> Production<D, E> + Send + Sync,
{
    fn produce(&self, state: &AsyncState<D, E, C>) -> Production<D, E> {
        self(state)
    }
}
