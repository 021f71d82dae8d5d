//! `PostgreSQL` adapters for registry persistence.

pub(crate) mod models;
pub(crate) mod schema;
mod store;

pub use store::{PostgresFlowRegistry, PostgresRoleRegistry, RegistryPgPool};
