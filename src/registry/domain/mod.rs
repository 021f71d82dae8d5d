//! Domain model for the advisory role and flow registries.
//!
//! Registries gate the engine at three points only: role validation at
//! task creation, the selector's `claims_from` queue hint, and the
//! scheduler poll snapshot. They carry no engine semantics of their own.

use crate::task::domain::Queue;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;

/// Errors returned while constructing registry values.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum RegistryDomainError {
    /// The role name is empty after trimming.
    #[error("role name must not be empty")]
    EmptyRoleName,

    /// The flow name is empty after trimming.
    #[error("flow name must not be empty")]
    EmptyFlowName,
}

/// A registered agent role.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RoleDefinition {
    name: String,
    claims_from: Option<Queue>,
}

impl RoleDefinition {
    /// Creates a validated role definition.
    ///
    /// # Errors
    ///
    /// Returns [`RegistryDomainError::EmptyRoleName`] when the name is
    /// empty after trimming.
    pub fn new(name: impl Into<String>) -> Result<Self, RegistryDomainError> {
        let raw = name.into();
        let trimmed = raw.trim();
        if trimmed.is_empty() {
            return Err(RegistryDomainError::EmptyRoleName);
        }
        Ok(Self {
            name: trimmed.to_owned(),
            claims_from: None,
        })
    }

    /// Sets the queue this role claims from by default.
    #[must_use]
    pub fn with_claims_from(mut self, queue: Queue) -> Self {
        self.claims_from = Some(queue);
        self
    }

    /// Returns the role name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Returns the queue hint applied when this role is the only one in
    /// a claim filter.
    #[must_use]
    pub const fn claims_from(&self) -> Option<&Queue> {
        self.claims_from.as_ref()
    }
}

/// A registered declarative pipeline.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FlowDefinition {
    name: String,
    config: Value,
}

impl FlowDefinition {
    /// Creates a validated flow definition.
    ///
    /// # Errors
    ///
    /// Returns [`RegistryDomainError::EmptyFlowName`] when the name is
    /// empty after trimming.
    pub fn new(name: impl Into<String>, config: Value) -> Result<Self, RegistryDomainError> {
        let raw = name.into();
        let trimmed = raw.trim();
        if trimmed.is_empty() {
            return Err(RegistryDomainError::EmptyFlowName);
        }
        Ok(Self {
            name: trimmed.to_owned(),
            config,
        })
    }

    /// Returns the flow name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Returns the opaque flow configuration.
    #[must_use]
    pub const fn config(&self) -> &Value {
        &self.config
    }
}
