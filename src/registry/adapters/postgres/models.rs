//! Diesel row models and domain conversions for registry persistence.

use super::schema::{flows, roles};
use crate::registry::{
    domain::{FlowDefinition, RoleDefinition},
    ports::{RegistryError, RegistryResult},
};
use crate::task::domain::Queue;
use diesel::prelude::*;
use serde_json::Value;

/// Row model for role records.
#[derive(Debug, Clone, Queryable, Selectable, Insertable)]
#[diesel(table_name = roles)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct RoleRow {
    pub name: String,
    pub claims_from: Option<String>,
}

/// Row model for flow records.
#[derive(Debug, Clone, Queryable, Selectable, Insertable)]
#[diesel(table_name = flows)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct FlowRow {
    pub name: String,
    pub config: Value,
}

/// Converts a stored role row into the domain definition.
pub fn row_to_role(row: RoleRow) -> RegistryResult<RoleDefinition> {
    let role = RoleDefinition::new(row.name).map_err(RegistryError::persistence)?;
    match row.claims_from {
        Some(queue) => {
            let queue = Queue::new(queue).map_err(RegistryError::persistence)?;
            Ok(role.with_claims_from(queue))
        }
        None => Ok(role),
    }
}

/// Builds the upsert row for a role definition.
pub fn role_to_row(role: &RoleDefinition) -> RoleRow {
    RoleRow {
        name: role.name().to_owned(),
        claims_from: role.claims_from().map(|queue| queue.as_str().to_owned()),
    }
}

/// Converts a stored flow row into the domain definition.
pub fn row_to_flow(row: FlowRow) -> RegistryResult<FlowDefinition> {
    FlowDefinition::new(row.name, row.config).map_err(RegistryError::persistence)
}

/// Builds the upsert row for a flow definition.
pub fn flow_to_row(flow: &FlowDefinition) -> FlowRow {
    FlowRow {
        name: flow.name().to_owned(),
        config: flow.config().clone(),
    }
}
