//! Scheduling services: lease reconciliation and poll snapshots.

mod poll;
mod reconciler;

pub use poll::{PollError, PollSnapshot, ProvisionalTask, QueueCounts, SchedulerPollService};
pub use reconciler::{LeaseReconciler, ReconcilerError, ReconcilerReport};
