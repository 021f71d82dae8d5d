//! In-memory orchestrator directory for tests and development.

use crate::orchestrator::{
    domain::{OrchestratorId, OrchestratorRegistration},
    ports::{DirectoryError, DirectoryResult, OrchestratorDirectory},
};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::collections::HashMap;
use std::sync::{Arc, RwLock};

fn lock_error(err: impl std::fmt::Display) -> DirectoryError {
    DirectoryError::persistence(std::io::Error::other(err.to_string()))
}

/// Thread-safe in-memory orchestrator directory.
#[derive(Debug, Clone, Default)]
pub struct InMemoryOrchestratorDirectory {
    registrations: Arc<RwLock<HashMap<OrchestratorId, OrchestratorRegistration>>>,
}

impl InMemoryOrchestratorDirectory {
    /// Creates an empty directory.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl OrchestratorDirectory for InMemoryOrchestratorDirectory {
    async fn upsert(&self, registration: &OrchestratorRegistration) -> DirectoryResult<()> {
        let mut registrations = self.registrations.write().map_err(lock_error)?;
        registrations.insert(registration.id().clone(), registration.clone());
        Ok(())
    }

    async fn find(
        &self,
        id: &OrchestratorId,
    ) -> DirectoryResult<Option<OrchestratorRegistration>> {
        let registrations = self.registrations.read().map_err(lock_error)?;
        Ok(registrations.get(id).cloned())
    }

    async fn record_heartbeat(
        &self,
        id: &OrchestratorId,
        now: DateTime<Utc>,
    ) -> DirectoryResult<Option<OrchestratorRegistration>> {
        let mut registrations = self.registrations.write().map_err(lock_error)?;
        let Some(registration) = registrations.get_mut(id) else {
            return Ok(None);
        };
        registration.heartbeat(now);
        Ok(Some(registration.clone()))
    }

    async fn mark_stale_offline(
        &self,
        cutoff: DateTime<Utc>,
        now: DateTime<Utc>,
    ) -> DirectoryResult<u64> {
        let mut registrations = self.registrations.write().map_err(lock_error)?;
        let mut marked = 0;
        for registration in registrations.values_mut() {
            if registration.is_stale(cutoff) {
                registration.mark_offline(now);
                marked += 1;
            }
        }
        Ok(marked)
    }

    async fn list(&self) -> DirectoryResult<Vec<OrchestratorRegistration>> {
        let registrations = self.registrations.read().map_err(lock_error)?;
        let mut all: Vec<OrchestratorRegistration> = registrations.values().cloned().collect();
        all.sort_by(|a, b| a.id().as_str().cmp(b.id().as_str()));
        Ok(all)
    }
}
