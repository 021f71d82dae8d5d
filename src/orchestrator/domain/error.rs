//! Error types for orchestrator domain validation and parsing.

use crate::task::domain::TaskDomainError;
use thiserror::Error;

/// Errors returned while constructing orchestrator domain values.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum OrchestratorDomainError {
    /// The cluster name is empty after trimming.
    #[error("cluster must not be empty")]
    EmptyCluster,

    /// The machine identifier is empty after trimming.
    #[error("machine id must not be empty")]
    EmptyMachineId,

    /// Shared identity validation failed.
    #[error(transparent)]
    Identity(#[from] TaskDomainError),
}

/// Error returned while parsing orchestrator statuses from persistence.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[error("unknown orchestrator status: {0}")]
pub struct ParseOrchestratorStatusError(pub String);
