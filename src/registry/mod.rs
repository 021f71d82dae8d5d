//! Advisory role and flow registries.
//!
//! Referenced by the core only where they gate it: role validation at
//! task creation, the selector's queue resolution hint, and the
//! scheduler poll snapshot.

pub mod adapters;
pub mod domain;
pub mod ports;
