//! In-memory registries for tests and development.

use crate::registry::{
    domain::{FlowDefinition, RoleDefinition},
    ports::{FlowRegistry, RegistryError, RegistryResult, RoleRegistry},
};
use async_trait::async_trait;
use std::collections::BTreeMap;
use std::sync::{Arc, RwLock};

fn lock_error(err: impl std::fmt::Display) -> RegistryError {
    RegistryError::persistence(std::io::Error::other(err.to_string()))
}

/// Thread-safe in-memory role registry.
#[derive(Debug, Clone, Default)]
pub struct InMemoryRoleRegistry {
    roles: Arc<RwLock<BTreeMap<String, RoleDefinition>>>,
}

impl InMemoryRoleRegistry {
    /// Creates an empty role registry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl RoleRegistry for InMemoryRoleRegistry {
    async fn upsert(&self, role: &RoleDefinition) -> RegistryResult<()> {
        let mut roles = self.roles.write().map_err(lock_error)?;
        roles.insert(role.name().to_owned(), role.clone());
        Ok(())
    }

    async fn find(&self, name: &str) -> RegistryResult<Option<RoleDefinition>> {
        let roles = self.roles.read().map_err(lock_error)?;
        Ok(roles.get(name).cloned())
    }

    async fn list(&self) -> RegistryResult<Vec<RoleDefinition>> {
        let roles = self.roles.read().map_err(lock_error)?;
        Ok(roles.values().cloned().collect())
    }

    async fn is_empty(&self) -> RegistryResult<bool> {
        let roles = self.roles.read().map_err(lock_error)?;
        Ok(roles.is_empty())
    }
}

/// Thread-safe in-memory flow registry.
#[derive(Debug, Clone, Default)]
pub struct InMemoryFlowRegistry {
    flows: Arc<RwLock<BTreeMap<String, FlowDefinition>>>,
}

impl InMemoryFlowRegistry {
    /// Creates an empty flow registry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl FlowRegistry for InMemoryFlowRegistry {
    async fn upsert(&self, flow: &FlowDefinition) -> RegistryResult<()> {
        let mut flows = self.flows.write().map_err(lock_error)?;
        flows.insert(flow.name().to_owned(), flow.clone());
        Ok(())
    }

    async fn list(&self) -> RegistryResult<Vec<FlowDefinition>> {
        let flows = self.flows.read().map_err(lock_error)?;
        Ok(flows.values().cloned().collect())
    }
}
