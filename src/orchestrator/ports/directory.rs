//! Directory port for orchestrator registration persistence.

use crate::orchestrator::domain::{OrchestratorId, OrchestratorRegistration};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::sync::Arc;
use thiserror::Error;

/// Result type for directory operations.
pub type DirectoryResult<T> = Result<T, DirectoryError>;

/// Orchestrator registration persistence contract.
#[async_trait]
pub trait OrchestratorDirectory: Send + Sync {
    /// Stores or replaces a registration.
    async fn upsert(&self, registration: &OrchestratorRegistration) -> DirectoryResult<()>;

    /// Finds a registration by identifier.
    ///
    /// Returns `None` when the orchestrator has never registered.
    async fn find(&self, id: &OrchestratorId)
    -> DirectoryResult<Option<OrchestratorRegistration>>;

    /// Records a heartbeat, reviving the orchestrator to active.
    ///
    /// Returns the updated registration, or `None` when the orchestrator
    /// has never registered.
    async fn record_heartbeat(
        &self,
        id: &OrchestratorId,
        now: DateTime<Utc>,
    ) -> DirectoryResult<Option<OrchestratorRegistration>>;

    /// Marks every active orchestrator silent since before the cutoff as
    /// offline.
    ///
    /// Returns the number of orchestrators marked. Tasks are never
    /// touched; lease expiry handles their claims.
    async fn mark_stale_offline(&self, cutoff: DateTime<Utc>, now: DateTime<Utc>)
    -> DirectoryResult<u64>;

    /// Returns all registrations.
    async fn list(&self) -> DirectoryResult<Vec<OrchestratorRegistration>>;
}

/// Errors returned by directory implementations.
#[derive(Debug, Clone, Error)]
pub enum DirectoryError {
    /// Persistence-layer failure.
    #[error("persistence error: {0}")]
    Persistence(Arc<dyn std::error::Error + Send + Sync>),
}

impl DirectoryError {
    /// Wraps a persistence error.
    pub fn persistence(err: impl std::error::Error + Send + Sync + 'static) -> Self {
        Self::Persistence(Arc::new(err))
    }
}
