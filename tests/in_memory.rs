//! In-memory integration tests for the coordination core.
//!
//! Tests are organized into modules by functionality:
//! - `lifecycle_tests`: Create, claim, submit, accept, reject flows
//! - `claim_race_tests`: Concurrent claims and version arbitration
//! - `lease_tests`: Lease expiry and the reconciler sweep
//! - `scope_tests`: Tenant partition isolation
//! - `facade_tests`: Validation failures and the error taxonomy
//! - `poll_tests`: Aggregate scheduler snapshots

mod in_memory {
    pub mod helpers;

    mod claim_race_tests;
    mod facade_tests;
    mod lease_tests;
    mod lifecycle_tests;
    mod poll_tests;
    mod scope_tests;
}
