//! Diesel row models and domain conversions for the directory.

use super::schema::orchestrators;
use crate::orchestrator::{
    domain::{
        OrchestratorId, OrchestratorRegistration, OrchestratorStatus, PersistedOrchestratorData,
        ScopeName,
    },
    ports::{DirectoryError, DirectoryResult},
};
use chrono::{DateTime, Utc};
use diesel::prelude::*;

/// Row model for orchestrator records.
#[derive(Debug, Clone, Queryable, Selectable, Insertable)]
#[diesel(table_name = orchestrators)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct OrchestratorRow {
    pub id: String,
    pub cluster: String,
    pub machine_id: String,
    pub scope: String,
    pub status: String,
    pub last_heartbeat: DateTime<Utc>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Converts a stored row into the domain registration.
pub fn row_to_registration(row: OrchestratorRow) -> DirectoryResult<OrchestratorRegistration> {
    let data = PersistedOrchestratorData {
        id: OrchestratorId::new(row.id).map_err(DirectoryError::persistence)?,
        cluster: row.cluster,
        machine_id: row.machine_id,
        scope: ScopeName::new(row.scope).map_err(DirectoryError::persistence)?,
        status: OrchestratorStatus::try_from(row.status.as_str())
            .map_err(DirectoryError::persistence)?,
        last_heartbeat: row.last_heartbeat,
        created_at: row.created_at,
        updated_at: row.updated_at,
    };
    Ok(OrchestratorRegistration::from_persisted(data))
}

/// Builds the upsert row for a registration.
pub fn registration_to_row(registration: &OrchestratorRegistration) -> OrchestratorRow {
    OrchestratorRow {
        id: registration.id().as_str().to_owned(),
        cluster: registration.cluster().to_owned(),
        machine_id: registration.machine_id().to_owned(),
        scope: registration.scope().as_str().to_owned(),
        status: registration.status().as_str().to_owned(),
        last_heartbeat: registration.last_heartbeat(),
        created_at: registration.created_at(),
        updated_at: registration.updated_at(),
    }
}
