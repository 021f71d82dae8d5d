//! Named sub-gates attached to a task.
//!
//! Hooks are opaque to the transition engine; their statuses are updated
//! out-of-band and surfaced in poll projections.

use super::{ParseHookStatusError, TaskDomainError};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Completion status of a single hook.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum HookStatus {
    /// The hook has not reported yet.
    Pending,
    /// The hook reported success.
    Passed,
    /// The hook reported failure.
    Failed,
}

impl HookStatus {
    /// Returns the canonical storage representation.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Passed => "passed",
            Self::Failed => "failed",
        }
    }
}

impl fmt::Display for HookStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl TryFrom<&str> for HookStatus {
    type Error = ParseHookStatusError;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        let normalized = value.trim().to_ascii_lowercase();
        match normalized.as_str() {
            "pending" => Ok(Self::Pending),
            "passed" => Ok(Self::Passed),
            "failed" => Ok(Self::Failed),
            _ => Err(ParseHookStatusError(value.to_owned())),
        }
    }
}

/// A named sub-gate with its current status and optional evidence.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Hook {
    /// Hook name, unique within its task.
    pub name: String,
    /// Current completion status.
    pub status: HookStatus,
    /// Optional evidence payload recorded at completion.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub evidence: Option<serde_json::Value>,
}

impl Hook {
    /// Creates a pending hook with the given name.
    #[must_use]
    pub fn pending(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            status: HookStatus::Pending,
            evidence: None,
        }
    }
}

/// Ordered collection of hooks, serialized as a JSON array.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct HookSet(Vec<Hook>);

impl HookSet {
    /// Creates an empty hook set.
    #[must_use]
    pub const fn new() -> Self {
        Self(Vec::new())
    }

    /// Creates a set of pending hooks from names, preserving order.
    #[must_use]
    pub fn from_names<I, S>(names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self(names.into_iter().map(Hook::pending).collect())
    }

    /// Returns the hooks in declaration order.
    #[must_use]
    pub fn hooks(&self) -> &[Hook] {
        &self.0
    }

    /// Returns `true` when the set contains no hooks.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Records the completion of the named hook.
    ///
    /// # Errors
    ///
    /// Returns [`TaskDomainError::UnknownHook`] when no hook with the
    /// given name exists.
    pub fn complete(
        &mut self,
        name: &str,
        status: HookStatus,
        evidence: Option<serde_json::Value>,
    ) -> Result<(), TaskDomainError> {
        let hook = self
            .0
            .iter_mut()
            .find(|hook| hook.name == name)
            .ok_or_else(|| TaskDomainError::UnknownHook(name.to_owned()))?;
        hook.status = status;
        hook.evidence = evidence;
        Ok(())
    }
}

impl From<Vec<Hook>> for HookSet {
    fn from(hooks: Vec<Hook>) -> Self {
        Self(hooks)
    }
}
