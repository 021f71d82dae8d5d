//! `PostgreSQL` adapters for task persistence.

pub(crate) mod models;
pub(crate) mod schema;
mod store;

pub use store::{PostgresTaskStore, TaskPgPool};
