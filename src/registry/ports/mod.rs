//! Port interfaces for the role and flow registries.

use crate::registry::domain::{FlowDefinition, RoleDefinition};
use async_trait::async_trait;
use std::sync::Arc;
use thiserror::Error;

/// Result type for registry operations.
pub type RegistryResult<T> = Result<T, RegistryError>;

/// Role registry contract.
#[async_trait]
pub trait RoleRegistry: Send + Sync {
    /// Stores or replaces a role definition.
    async fn upsert(&self, role: &RoleDefinition) -> RegistryResult<()>;

    /// Finds a role by name.
    ///
    /// Returns `None` when the role is not registered.
    async fn find(&self, name: &str) -> RegistryResult<Option<RoleDefinition>>;

    /// Returns all registered roles.
    async fn list(&self) -> RegistryResult<Vec<RoleDefinition>>;

    /// Returns `true` when no roles are registered, in which case role
    /// validation at task creation is skipped.
    async fn is_empty(&self) -> RegistryResult<bool>;
}

/// Flow registry contract.
#[async_trait]
pub trait FlowRegistry: Send + Sync {
    /// Stores or replaces a flow definition.
    async fn upsert(&self, flow: &FlowDefinition) -> RegistryResult<()>;

    /// Returns all registered flows.
    async fn list(&self) -> RegistryResult<Vec<FlowDefinition>>;
}

/// Errors returned by registry implementations.
#[derive(Debug, Clone, Error)]
pub enum RegistryError {
    /// Persistence-layer failure.
    #[error("persistence error: {0}")]
    Persistence(Arc<dyn std::error::Error + Send + Sync>),
}

impl RegistryError {
    /// Wraps a persistence error.
    pub fn persistence(err: impl std::error::Error + Send + Sync + 'static) -> Self {
        Self::Persistence(Arc::new(err))
    }
}
