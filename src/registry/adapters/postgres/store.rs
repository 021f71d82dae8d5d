//! `PostgreSQL` registries.

use super::{
    models::{FlowRow, RoleRow, flow_to_row, role_to_row, row_to_flow, row_to_role},
    schema::{flows, roles},
};
use crate::registry::{
    domain::{FlowDefinition, RoleDefinition},
    ports::{FlowRegistry, RegistryError, RegistryResult, RoleRegistry},
};
use async_trait::async_trait;
use diesel::pg::PgConnection;
use diesel::prelude::*;
use diesel::r2d2::{ConnectionManager, Pool};

/// `PostgreSQL` connection pool type used by registry adapters.
pub type RegistryPgPool = Pool<ConnectionManager<PgConnection>>;

async fn run_blocking<F, T>(pool: &RegistryPgPool, f: F) -> RegistryResult<T>
where
    F: FnOnce(&mut PgConnection) -> RegistryResult<T> + Send + 'static,
    T: Send + 'static,
{
    let pool = pool.clone();
    tokio::task::spawn_blocking(move || {
        let mut connection = pool.get().map_err(RegistryError::persistence)?;
        f(&mut connection)
    })
    .await
    .map_err(RegistryError::persistence)?
}

/// `PostgreSQL`-backed role registry.
#[derive(Debug, Clone)]
pub struct PostgresRoleRegistry {
    pool: RegistryPgPool,
}

impl PostgresRoleRegistry {
    /// Creates a new registry from a `PostgreSQL` connection pool.
    #[must_use]
    pub const fn new(pool: RegistryPgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl RoleRegistry for PostgresRoleRegistry {
    async fn upsert(&self, role: &RoleDefinition) -> RegistryResult<()> {
        let row = role_to_row(role);
        run_blocking(&self.pool, move |connection| {
            diesel::insert_into(roles::table)
                .values(&row)
                .on_conflict(roles::name)
                .do_update()
                .set(roles::claims_from.eq(row.claims_from.clone()))
                .execute(connection)
                .map_err(RegistryError::persistence)?;
            Ok(())
        })
        .await
    }

    async fn find(&self, name: &str) -> RegistryResult<Option<RoleDefinition>> {
        let name = name.to_owned();
        run_blocking(&self.pool, move |connection| {
            let row = roles::table
                .filter(roles::name.eq(name))
                .select(RoleRow::as_select())
                .first::<RoleRow>(connection)
                .optional()
                .map_err(RegistryError::persistence)?;
            row.map(row_to_role).transpose()
        })
        .await
    }

    async fn list(&self) -> RegistryResult<Vec<RoleDefinition>> {
        run_blocking(&self.pool, move |connection| {
            let rows = roles::table
                .order(roles::name.asc())
                .select(RoleRow::as_select())
                .load::<RoleRow>(connection)
                .map_err(RegistryError::persistence)?;
            rows.into_iter().map(row_to_role).collect()
        })
        .await
    }

    async fn is_empty(&self) -> RegistryResult<bool> {
        run_blocking(&self.pool, move |connection| {
            let count = roles::table
                .count()
                .get_result::<i64>(connection)
                .map_err(RegistryError::persistence)?;
            Ok(count == 0)
        })
        .await
    }
}

/// `PostgreSQL`-backed flow registry.
#[derive(Debug, Clone)]
pub struct PostgresFlowRegistry {
    pool: RegistryPgPool,
}

impl PostgresFlowRegistry {
    /// Creates a new registry from a `PostgreSQL` connection pool.
    #[must_use]
    pub const fn new(pool: RegistryPgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl FlowRegistry for PostgresFlowRegistry {
    async fn upsert(&self, flow: &FlowDefinition) -> RegistryResult<()> {
        let row = flow_to_row(flow);
        run_blocking(&self.pool, move |connection| {
            diesel::insert_into(flows::table)
                .values(&row)
                .on_conflict(flows::name)
                .do_update()
                .set(flows::config.eq(row.config.clone()))
                .execute(connection)
                .map_err(RegistryError::persistence)?;
            Ok(())
        })
        .await
    }

    async fn list(&self) -> RegistryResult<Vec<FlowDefinition>> {
        run_blocking(&self.pool, move |connection| {
            let rows = flows::table
                .order(flows::name.asc())
                .select(FlowRow::as_select())
                .load::<FlowRow>(connection)
                .map_err(RegistryError::persistence)?;
            rows.into_iter().map(row_to_flow).collect()
        })
        .await
    }
}
