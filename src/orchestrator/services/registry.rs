//! Service layer for orchestrator registration and heartbeats.
//!
//! Provides [`OrchestratorRegistryService`] which coordinates fleet
//! member registration, re-registration, and liveness updates.

use crate::orchestrator::{
    domain::{
        OrchestratorDomainError, OrchestratorId, OrchestratorRegistration, ScopeName,
    },
    ports::{DirectoryError, OrchestratorDirectory},
};
use crate::task::domain::TaskDomainError;
use mockable::Clock;
use std::sync::Arc;
use thiserror::Error;

/// Request payload for registering an orchestrator.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RegisterOrchestratorRequest {
    /// Cluster the orchestrator belongs to.
    pub cluster: String,
    /// Machine identifier within the cluster.
    pub machine_id: String,
    /// Scope the orchestrator operates in; required.
    pub scope: String,
}

impl RegisterOrchestratorRequest {
    /// Creates a registration request.
    #[must_use]
    pub fn new(
        cluster: impl Into<String>,
        machine_id: impl Into<String>,
        scope: impl Into<String>,
    ) -> Self {
        Self {
            cluster: cluster.into(),
            machine_id: machine_id.into(),
            scope: scope.into(),
        }
    }
}

/// Service-level errors for orchestrator registry operations.
#[derive(Debug, Error)]
pub enum OrchestratorRegistryError {
    /// Domain validation failed.
    #[error(transparent)]
    Domain(#[from] OrchestratorDomainError),

    /// Shared identity validation failed.
    #[error(transparent)]
    Identity(#[from] TaskDomainError),

    /// Directory operation failed.
    #[error(transparent)]
    Directory(#[from] DirectoryError),

    /// No orchestrator exists with the given identifier.
    #[error("orchestrator {0} not found")]
    NotFound(OrchestratorId),
}

/// Result type for orchestrator registry operations.
pub type OrchestratorRegistryResult<T> = Result<T, OrchestratorRegistryError>;

/// Orchestrator registration and liveness service.
#[derive(Clone)]
pub struct OrchestratorRegistryService<D, C>
where
    D: OrchestratorDirectory,
    C: Clock + Send + Sync,
{
    directory: Arc<D>,
    clock: Arc<C>,
}

impl<D, C> OrchestratorRegistryService<D, C>
where
    D: OrchestratorDirectory,
    C: Clock + Send + Sync,
{
    /// Creates a new registry service.
    #[must_use]
    pub const fn new(directory: Arc<D>, clock: Arc<C>) -> Self {
        Self { directory, clock }
    }

    /// Registers an orchestrator, or re-registers an existing one.
    ///
    /// Re-registration under the same derived identifier updates the
    /// scope and revives the orchestrator to active.
    ///
    /// # Errors
    ///
    /// Returns [`OrchestratorRegistryError`] when validation fails or the
    /// directory rejects persistence.
    pub async fn register(
        &self,
        request: RegisterOrchestratorRequest,
    ) -> OrchestratorRegistryResult<OrchestratorRegistration> {
        let now = self.clock.utc();
        let scope = ScopeName::new(request.scope)?;
        let id = OrchestratorId::from_parts(&request.cluster, &request.machine_id)?;

        let registration = match self.directory.find(&id).await? {
            Some(mut existing) => {
                existing.re_register(scope, now);
                existing
            }
            None => OrchestratorRegistration::new(request.cluster, request.machine_id, scope, now)?,
        };
        self.directory.upsert(&registration).await?;
        Ok(registration)
    }

    /// Records a heartbeat, reviving the orchestrator to active.
    ///
    /// # Errors
    ///
    /// Returns [`OrchestratorRegistryError::NotFound`] when the
    /// orchestrator has never registered.
    pub async fn heartbeat(
        &self,
        id: &OrchestratorId,
    ) -> OrchestratorRegistryResult<OrchestratorRegistration> {
        let now = self.clock.utc();
        self.directory
            .record_heartbeat(id, now)
            .await?
            .ok_or_else(|| OrchestratorRegistryError::NotFound(id.clone()))
    }

    /// Finds a registration by identifier.
    ///
    /// Returns `Ok(None)` when the orchestrator has never registered.
    ///
    /// # Errors
    ///
    /// Returns [`OrchestratorRegistryError::Directory`] when the lookup
    /// fails.
    pub async fn find(
        &self,
        id: &OrchestratorId,
    ) -> OrchestratorRegistryResult<Option<OrchestratorRegistration>> {
        Ok(self.directory.find(id).await?)
    }
}
