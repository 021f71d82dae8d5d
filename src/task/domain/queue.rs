//! Open queue labels with engine semantics for six of them.
//!
//! Only the six states named here carry transition-engine semantics.
//! Every other label is free-form: registered flows may introduce their
//! own intermediate queues (`failed`, `rejected`, `backlog`, ...), which
//! the engine stores and returns untouched and which are manipulated only
//! through generic field updates.

use super::TaskDomainError;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Current lifecycle state label of a task.
///
/// Deliberately an open string rather than a closed enum; validation
/// against registered flows is an advisory layer above the engine.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Queue(String);

impl Queue {
    /// Label of the pending pool new tasks enter.
    pub const INCOMING: &'static str = "incoming";
    /// Label of tasks under an active claim lease.
    pub const CLAIMED: &'static str = "claimed";
    /// Label of submitted tasks awaiting review.
    pub const PROVISIONAL: &'static str = "provisional";
    /// Terminal success label, reachable only via accept.
    pub const DONE: &'static str = "done";
    /// Label of submissions routed aside by burnout detection.
    pub const NEEDS_CONTINUATION: &'static str = "needs_continuation";
    /// Label of explicitly blocked tasks.
    pub const BLOCKED: &'static str = "blocked";

    /// Creates a validated queue label.
    ///
    /// # Errors
    ///
    /// Returns [`TaskDomainError::EmptyQueue`] when the label is empty
    /// after trimming.
    pub fn new(value: impl Into<String>) -> Result<Self, TaskDomainError> {
        let raw = value.into();
        let trimmed = raw.trim();
        if trimmed.is_empty() {
            return Err(TaskDomainError::EmptyQueue);
        }
        Ok(Self(trimmed.to_owned()))
    }

    /// Returns the `incoming` queue.
    #[must_use]
    pub fn incoming() -> Self {
        Self(Self::INCOMING.to_owned())
    }

    /// Returns the `claimed` queue.
    #[must_use]
    pub fn claimed() -> Self {
        Self(Self::CLAIMED.to_owned())
    }

    /// Returns the `provisional` queue.
    #[must_use]
    pub fn provisional() -> Self {
        Self(Self::PROVISIONAL.to_owned())
    }

    /// Returns the terminal `done` queue.
    #[must_use]
    pub fn done() -> Self {
        Self(Self::DONE.to_owned())
    }

    /// Returns the `needs_continuation` queue.
    #[must_use]
    pub fn needs_continuation() -> Self {
        Self(Self::NEEDS_CONTINUATION.to_owned())
    }

    /// Returns the `blocked` queue.
    #[must_use]
    pub fn blocked() -> Self {
        Self(Self::BLOCKED.to_owned())
    }

    /// Returns the label as `str`.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Returns `true` when the label equals `incoming`.
    #[must_use]
    pub fn is_incoming(&self) -> bool {
        self.0 == Self::INCOMING
    }

    /// Returns `true` when the label equals `claimed`.
    #[must_use]
    pub fn is_claimed(&self) -> bool {
        self.0 == Self::CLAIMED
    }

    /// Returns `true` when the label equals `provisional`.
    #[must_use]
    pub fn is_provisional(&self) -> bool {
        self.0 == Self::PROVISIONAL
    }

    /// Returns `true` when the label equals `done`.
    #[must_use]
    pub fn is_done(&self) -> bool {
        self.0 == Self::DONE
    }

    /// Returns `true` when the label equals `blocked`.
    #[must_use]
    pub fn is_blocked(&self) -> bool {
        self.0 == Self::BLOCKED
    }
}

impl AsRef<str> for Queue {
    fn as_ref(&self) -> &str {
        self.as_str()
    }
}

impl fmt::Display for Queue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}
