//! Events fed into the tracker state machine.
//!
//! Callers send `Load` and `Reset`; the driver sends `AsyncSuccess` and
//! `AsyncError` when a producer's future settles. Any of them may be sent by
//! hand, the machine ignores the ones that make no sense for the current state.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Discriminant of an [`AsyncEvent`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum EventTag {
    /// Start an operation
    Load,
    /// The in-flight operation resolved
    AsyncSuccess,
    /// The in-flight operation failed
    AsyncError,
    /// Return to idle
    Reset,
}

impl EventTag {
    /// All tags
    pub const ALL: [Self; 4] = [Self::Load, Self::AsyncSuccess, Self::AsyncError, Self::Reset];

    /// Stable camel-case name, used for log fields and metric labels
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Load => "load",
            Self::AsyncSuccess => "asyncSuccess",
            Self::AsyncError => "asyncError",
            Self::Reset => "reset",
        }
    }
}

impl fmt::Display for EventTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Input to the tracker state machine
///
/// Serializes as `{"type": "asyncSuccess", "data": ...}`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum AsyncEvent<D, E, C> {
    /// Start an operation with the given context
    Load {
        /// Context handed to the producer through the `Loading` state
        context: C,
    },
    /// The operation resolved with `data`
    AsyncSuccess {
        /// Resolved value
        data: D,
    },
    /// The operation failed with `error`
    AsyncError {
        /// Failure value
        error: E,
    },
    /// Go back to `Idle`
    Reset,
}

impl<D, E, C> AsyncEvent<D, E, C> {
    /// Shorthand for `AsyncEvent::Load { context }`
    #[must_use]
    pub const fn load(context: C) -> Self {
        Self::Load { context }
    }

    /// Build the completion event for a settled operation
    #[must_use]
    pub fn from_result(result: Result<D, E>) -> Self {
        match result {
            Ok(data) => Self::AsyncSuccess { data },
            Err(error) => Self::AsyncError { error },
        }
    }

    /// Tag of this event
    #[must_use]
    pub const fn tag(&self) -> EventTag {
        match self {
            Self::Load { .. } => EventTag::Load,
            Self::AsyncSuccess { .. } => EventTag::AsyncSuccess,
            Self::AsyncError { .. } => EventTag::AsyncError,
            Self::Reset => EventTag::Reset,
        }
    }
}
