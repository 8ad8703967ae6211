//! Tracker state and its tag.
//!
//! [`AsyncState`] is the single value a tracker holds. Exactly one case is
//! active at a time and each payload (`context`, `data`, `error`) lives only on
//! the case that owns it, so a `Success` can never carry a stale error.
//!
//! # Example
//!
//! ```
//! use async_tracker_core::state::{AsyncState, StateTag};
//!
//! let state: AsyncState<u32, String, &str> = AsyncState::Loading { context: "user-7" };
//! assert_eq!(state.tag(), StateTag::Loading);
//! assert_eq!(state.context(), Some(&"user-7"));
//! assert!(state.data().is_none());
//! ```

use serde::{Deserialize, Serialize};
use std::fmt;

/// Discriminant of an [`AsyncState`], without its payload
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StateTag {
    /// Nothing has been started, or the tracker was reset
    Idle,
    /// An operation is in flight
    Loading,
    /// The last operation resolved with data
    Success,
    /// The last operation resolved with an error
    Error,
}

impl StateTag {
    /// All tags, in lifecycle order
    pub const ALL: [Self; 4] = [Self::Idle, Self::Loading, Self::Success, Self::Error];

    /// Stable lowercase name, used for log fields and metric labels
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Idle => "idle",
            Self::Loading => "loading",
            Self::Success => "success",
            Self::Error => "error",
        }
    }

    /// Whether this tag marks a finished operation (`Success` or `Error`)
    #[must_use]
    pub const fn is_settled(self) -> bool {
        matches!(self, Self::Success | Self::Error)
    }
}

impl fmt::Display for StateTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// State of a tracked asynchronous operation
///
/// # Type Parameters
///
/// - `D`: Data the operation resolves with
/// - `E`: Error the operation fails with
/// - `C`: Context supplied when the operation is started
///
/// Serializes as `{"state": "loading", "context": ...}`, i.e. internally tagged
/// by `state` with the payload next to it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "state", rename_all = "snake_case")]
pub enum AsyncState<D, E, C> {
    /// No operation has been started
    Idle,
    /// An operation is running for `context`
    Loading {
        /// Context the operation was started with
        context: C,
    },
    /// The operation resolved successfully
    Success {
        /// Resolved value
        data: D,
    },
    /// The operation failed
    Error {
        /// Failure reported by the operation
        error: E,
    },
}

// Manual impl: a derive would demand `D: Default` and friends.
impl<D, E, C> Default for AsyncState<D, E, C> {
    fn default() -> Self {
        Self::Idle
    }
}

impl<D, E, C> AsyncState<D, E, C> {
    /// Tag of the active case
    #[must_use]
    pub const fn tag(&self) -> StateTag {
        match self {
            Self::Idle => StateTag::Idle,
            Self::Loading { .. } => StateTag::Loading,
            Self::Success { .. } => StateTag::Success,
            Self::Error { .. } => StateTag::Error,
        }
    }

    /// Resolved data, present only in `Success`
    #[must_use]
    pub const fn data(&self) -> Option<&D> {
        match self {
            Self::Success { data } => Some(data),
            _ => None,
        }
    }

    /// Failure, present only in `Error`
    #[must_use]
    pub const fn error(&self) -> Option<&E> {
        match self {
            Self::Error { error } => Some(error),
            _ => None,
        }
    }

    /// Start context, present only in `Loading`
    #[must_use]
    pub const fn context(&self) -> Option<&C> {
        match self {
            Self::Loading { context } => Some(context),
            _ => None,
        }
    }

    /// True iff the tag is `Idle`
    #[must_use]
    pub const fn is_idle(&self) -> bool {
        matches!(self, Self::Idle)
    }

    /// True iff the tag is `Loading`
    #[must_use]
    pub const fn is_loading(&self) -> bool {
        matches!(self, Self::Loading { .. })
    }

    /// True iff the tag is `Success`
    #[must_use]
    pub const fn is_success(&self) -> bool {
        matches!(self, Self::Success { .. })
    }

    /// True iff the tag is `Error`
    #[must_use]
    pub const fn is_error(&self) -> bool {
        matches!(self, Self::Error { .. })
    }
}
