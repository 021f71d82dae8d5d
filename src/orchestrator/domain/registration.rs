//! Orchestrator registration aggregate root.

use super::{OrchestratorDomainError, OrchestratorStatus};
use crate::task::domain::{OrchestratorId, ScopeName};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Orchestrator registration aggregate root.
///
/// The identifier is derived as `<cluster>-<machine_id>`, so the same
/// machine re-registering updates its existing record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrchestratorRegistration {
    id: OrchestratorId,
    cluster: String,
    machine_id: String,
    scope: ScopeName,
    status: OrchestratorStatus,
    last_heartbeat: DateTime<Utc>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

/// Parameter object for reconstructing a persisted registration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PersistedOrchestratorData {
    /// Persisted identifier.
    pub id: OrchestratorId,
    /// Persisted cluster name.
    pub cluster: String,
    /// Persisted machine identifier.
    pub machine_id: String,
    /// Persisted scope.
    pub scope: ScopeName,
    /// Persisted liveness status.
    pub status: OrchestratorStatus,
    /// Persisted last heartbeat timestamp.
    pub last_heartbeat: DateTime<Utc>,
    /// Persisted creation timestamp.
    pub created_at: DateTime<Utc>,
    /// Persisted latest lifecycle timestamp.
    pub updated_at: DateTime<Utc>,
}

impl OrchestratorRegistration {
    /// Creates a new active registration.
    ///
    /// # Errors
    ///
    /// Returns [`OrchestratorDomainError`] when the cluster or machine
    /// identifier is empty after trimming.
    pub fn new(
        cluster: impl Into<String>,
        machine_id: impl Into<String>,
        scope: ScopeName,
        now: DateTime<Utc>,
    ) -> Result<Self, OrchestratorDomainError> {
        let cluster = cluster.into().trim().to_owned();
        let machine_id = machine_id.into().trim().to_owned();
        if cluster.is_empty() {
            return Err(OrchestratorDomainError::EmptyCluster);
        }
        if machine_id.is_empty() {
            return Err(OrchestratorDomainError::EmptyMachineId);
        }
        let id = OrchestratorId::from_parts(&cluster, &machine_id)?;

        Ok(Self {
            id,
            cluster,
            machine_id,
            scope,
            status: OrchestratorStatus::Active,
            last_heartbeat: now,
            created_at: now,
            updated_at: now,
        })
    }

    /// Reconstructs a registration from persisted storage.
    #[must_use]
    pub fn from_persisted(data: PersistedOrchestratorData) -> Self {
        Self {
            id: data.id,
            cluster: data.cluster,
            machine_id: data.machine_id,
            scope: data.scope,
            status: data.status,
            last_heartbeat: data.last_heartbeat,
            created_at: data.created_at,
            updated_at: data.updated_at,
        }
    }

    /// Returns the derived identifier.
    #[must_use]
    pub const fn id(&self) -> &OrchestratorId {
        &self.id
    }

    /// Returns the cluster name.
    #[must_use]
    pub fn cluster(&self) -> &str {
        &self.cluster
    }

    /// Returns the machine identifier.
    #[must_use]
    pub fn machine_id(&self) -> &str {
        &self.machine_id
    }

    /// Returns the scope recorded at registration.
    #[must_use]
    pub const fn scope(&self) -> &ScopeName {
        &self.scope
    }

    /// Returns the liveness status.
    #[must_use]
    pub const fn status(&self) -> OrchestratorStatus {
        self.status
    }

    /// Returns the last heartbeat timestamp.
    #[must_use]
    pub const fn last_heartbeat(&self) -> DateTime<Utc> {
        self.last_heartbeat
    }

    /// Returns the creation timestamp.
    #[must_use]
    pub const fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    /// Returns the latest lifecycle timestamp.
    #[must_use]
    pub const fn updated_at(&self) -> DateTime<Utc> {
        self.updated_at
    }

    /// Records a heartbeat, forcing the status back to active.
    pub fn heartbeat(&mut self, now: DateTime<Utc>) {
        self.status = OrchestratorStatus::Active;
        self.last_heartbeat = now;
        self.updated_at = now;
    }

    /// Re-registers the orchestrator, updating its scope and reviving it.
    pub fn re_register(&mut self, scope: ScopeName, now: DateTime<Utc>) {
        self.scope = scope;
        self.status = OrchestratorStatus::Active;
        self.last_heartbeat = now;
        self.updated_at = now;
    }

    /// Marks the orchestrator offline.
    pub fn mark_offline(&mut self, now: DateTime<Utc>) {
        self.status = OrchestratorStatus::Offline;
        self.updated_at = now;
    }

    /// Returns `true` when the registration is active but silent since
    /// before the cutoff.
    #[must_use]
    pub fn is_stale(&self, cutoff: DateTime<Utc>) -> bool {
        self.status == OrchestratorStatus::Active && self.last_heartbeat < cutoff
    }
}
