//! `PostgreSQL` adapters for the orchestrator directory.

pub(crate) mod models;
pub(crate) mod schema;
mod store;

pub use store::{DirectoryPgPool, PostgresOrchestratorDirectory};
