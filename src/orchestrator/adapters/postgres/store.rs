//! `PostgreSQL` orchestrator directory.

use super::{
    models::{OrchestratorRow, registration_to_row, row_to_registration},
    schema::orchestrators,
};
use crate::orchestrator::{
    domain::{OrchestratorId, OrchestratorRegistration, OrchestratorStatus},
    ports::{DirectoryError, DirectoryResult, OrchestratorDirectory},
};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use diesel::pg::PgConnection;
use diesel::prelude::*;
use diesel::r2d2::{ConnectionManager, Pool};

/// `PostgreSQL` connection pool type used by directory adapters.
pub type DirectoryPgPool = Pool<ConnectionManager<PgConnection>>;

/// `PostgreSQL`-backed orchestrator directory.
#[derive(Debug, Clone)]
pub struct PostgresOrchestratorDirectory {
    pool: DirectoryPgPool,
}

impl PostgresOrchestratorDirectory {
    /// Creates a new directory from a `PostgreSQL` connection pool.
    #[must_use]
    pub const fn new(pool: DirectoryPgPool) -> Self {
        Self { pool }
    }

    async fn run_blocking<F, T>(&self, f: F) -> DirectoryResult<T>
    where
        F: FnOnce(&mut PgConnection) -> DirectoryResult<T> + Send + 'static,
        T: Send + 'static,
    {
        let pool = self.pool.clone();
        tokio::task::spawn_blocking(move || {
            let mut connection = pool.get().map_err(DirectoryError::persistence)?;
            f(&mut connection)
        })
        .await
        .map_err(DirectoryError::persistence)?
    }
}

#[async_trait]
impl OrchestratorDirectory for PostgresOrchestratorDirectory {
    async fn upsert(&self, registration: &OrchestratorRegistration) -> DirectoryResult<()> {
        let row = registration_to_row(registration);
        self.run_blocking(move |connection| {
            diesel::insert_into(orchestrators::table)
                .values(&row)
                .on_conflict(orchestrators::id)
                .do_update()
                .set((
                    orchestrators::scope.eq(row.scope.clone()),
                    orchestrators::status.eq(row.status.clone()),
                    orchestrators::last_heartbeat.eq(row.last_heartbeat),
                    orchestrators::updated_at.eq(row.updated_at),
                ))
                .execute(connection)
                .map_err(DirectoryError::persistence)?;
            Ok(())
        })
        .await
    }

    async fn find(
        &self,
        id: &OrchestratorId,
    ) -> DirectoryResult<Option<OrchestratorRegistration>> {
        let id = id.as_str().to_owned();
        self.run_blocking(move |connection| {
            let row = orchestrators::table
                .filter(orchestrators::id.eq(id))
                .select(OrchestratorRow::as_select())
                .first::<OrchestratorRow>(connection)
                .optional()
                .map_err(DirectoryError::persistence)?;
            row.map(row_to_registration).transpose()
        })
        .await
    }

    async fn record_heartbeat(
        &self,
        id: &OrchestratorId,
        now: DateTime<Utc>,
    ) -> DirectoryResult<Option<OrchestratorRegistration>> {
        let id = id.as_str().to_owned();
        self.run_blocking(move |connection| {
            let row = diesel::update(orchestrators::table.filter(orchestrators::id.eq(id)))
                .set((
                    orchestrators::status.eq(OrchestratorStatus::Active.as_str()),
                    orchestrators::last_heartbeat.eq(now),
                    orchestrators::updated_at.eq(now),
                ))
                .get_result::<OrchestratorRow>(connection)
                .optional()
                .map_err(DirectoryError::persistence)?;
            row.map(row_to_registration).transpose()
        })
        .await
    }

    async fn mark_stale_offline(
        &self,
        cutoff: DateTime<Utc>,
        now: DateTime<Utc>,
    ) -> DirectoryResult<u64> {
        self.run_blocking(move |connection| {
            let marked = diesel::update(
                orchestrators::table
                    .filter(orchestrators::status.eq(OrchestratorStatus::Active.as_str()))
                    .filter(orchestrators::last_heartbeat.lt(cutoff)),
            )
            .set((
                orchestrators::status.eq(OrchestratorStatus::Offline.as_str()),
                orchestrators::updated_at.eq(now),
            ))
            .execute(connection)
            .map_err(DirectoryError::persistence)?;
            Ok(u64::try_from(marked).unwrap_or(u64::MAX))
        })
        .await
    }

    async fn list(&self) -> DirectoryResult<Vec<OrchestratorRegistration>> {
        self.run_blocking(move |connection| {
            let rows = orchestrators::table
                .order(orchestrators::id.asc())
                .select(OrchestratorRow::as_select())
                .load::<OrchestratorRow>(connection)
                .map_err(DirectoryError::persistence)?;
            rows.into_iter().map(row_to_registration).collect()
        })
        .await
    }
}
