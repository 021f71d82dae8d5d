//! Service layer for the orchestrator directory.

mod registry;

pub use registry::{
    OrchestratorRegistryError, OrchestratorRegistryResult, OrchestratorRegistryService,
    RegisterOrchestratorRequest,
};
