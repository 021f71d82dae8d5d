//! Identifier and validated scalar types for the task domain.
//!
//! Task identity is caller-supplied: orchestrators mint their own keys
//! and the server treats them as opaque strings. The remaining newtypes
//! validate the fleet vocabulary (scope, agent, orchestrator) once at the
//! boundary so the engine never re-checks them.

use super::TaskDomainError;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Caller-supplied opaque task identifier, globally unique.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TaskKey(String);

impl TaskKey {
    /// Creates a validated task key.
    ///
    /// # Errors
    ///
    /// Returns [`TaskDomainError::EmptyTaskKey`] when the value is empty
    /// after trimming.
    pub fn new(value: impl Into<String>) -> Result<Self, TaskDomainError> {
        let raw = value.into();
        let trimmed = raw.trim();
        if trimmed.is_empty() {
            return Err(TaskDomainError::EmptyTaskKey);
        }
        Ok(Self(trimmed.to_owned()))
    }

    /// Returns the key as `str`.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Consumes the key, returning the wrapped string.
    #[must_use]
    pub fn into_inner(self) -> String {
        self.0
    }
}

impl AsRef<str> for TaskKey {
    fn as_ref(&self) -> &str {
        self.as_str()
    }
}

impl fmt::Display for TaskKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Tenant partition key; every visibility and mutation query filters by
/// it.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ScopeName(String);

impl ScopeName {
    /// Creates a validated scope name.
    ///
    /// # Errors
    ///
    /// Returns [`TaskDomainError::EmptyScope`] when the value is empty
    /// after trimming.
    pub fn new(value: impl Into<String>) -> Result<Self, TaskDomainError> {
        let raw = value.into();
        let trimmed = raw.trim();
        if trimmed.is_empty() {
            return Err(TaskDomainError::EmptyScope);
        }
        Ok(Self(trimmed.to_owned()))
    }

    /// Returns the scope as `str`.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl AsRef<str> for ScopeName {
    fn as_ref(&self) -> &str {
        self.as_str()
    }
}

impl fmt::Display for ScopeName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Human-readable name of the agent holding a claim inside an
/// orchestrator.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct AgentName(String);

impl AgentName {
    /// Creates a validated agent name.
    ///
    /// # Errors
    ///
    /// Returns [`TaskDomainError::EmptyAgentName`] when the value is
    /// empty after trimming.
    pub fn new(value: impl Into<String>) -> Result<Self, TaskDomainError> {
        let raw = value.into();
        let trimmed = raw.trim();
        if trimmed.is_empty() {
            return Err(TaskDomainError::EmptyAgentName);
        }
        Ok(Self(trimmed.to_owned()))
    }

    /// Returns the name as `str`.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl AsRef<str> for AgentName {
    fn as_ref(&self) -> &str {
        self.as_str()
    }
}

impl fmt::Display for AgentName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Fleet-member identity, derived as `<cluster>-<machine_id>` at
/// registration time.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct OrchestratorId(String);

impl OrchestratorId {
    /// Creates a validated orchestrator identifier.
    ///
    /// # Errors
    ///
    /// Returns [`TaskDomainError::EmptyOrchestratorId`] when the value is
    /// empty after trimming.
    pub fn new(value: impl Into<String>) -> Result<Self, TaskDomainError> {
        let raw = value.into();
        let trimmed = raw.trim();
        if trimmed.is_empty() {
            return Err(TaskDomainError::EmptyOrchestratorId);
        }
        Ok(Self(trimmed.to_owned()))
    }

    /// Derives the identifier for a `(cluster, machine_id)` pair.
    ///
    /// # Errors
    ///
    /// Returns [`TaskDomainError::EmptyOrchestratorId`] when either part
    /// is empty after trimming.
    pub fn from_parts(cluster: &str, machine_id: &str) -> Result<Self, TaskDomainError> {
        let cluster = cluster.trim();
        let machine_id = machine_id.trim();
        if cluster.is_empty() || machine_id.is_empty() {
            return Err(TaskDomainError::EmptyOrchestratorId);
        }
        Ok(Self(format!("{cluster}-{machine_id}")))
    }

    /// Returns the identifier as `str`.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl AsRef<str> for OrchestratorId {
    fn as_ref(&self) -> &str {
        self.as_str()
    }
}

impl fmt::Display for OrchestratorId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}
