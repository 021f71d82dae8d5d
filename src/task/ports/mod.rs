//! Port interfaces for task persistence.

mod store;

pub use store::{
    ClaimCriteria, TaskFilter, TaskStore, TaskStoreError, TaskStoreResult, TransitionWrite,
};
