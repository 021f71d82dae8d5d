//! The lease reconciler.
//!
//! An independent periodic task, not an outgrowth of request handling.
//! Each cycle is two conditional bulk writes against the store: expired
//! claims return to the pending pool, and silent orchestrators are
//! marked offline. Re-running a cycle with no new expirations is a
//! no-op, and the sweep is safe to run concurrently with live client
//! traffic.

use crate::config::CoordinatorConfig;
use crate::orchestrator::ports::{DirectoryError, OrchestratorDirectory};
use crate::task::{
    domain::{HistoryEvent, NewHistoryEntry},
    ports::{TaskStore, TaskStoreError},
};
use chrono::Duration;
use mockable::Clock;
use serde_json::json;
use std::sync::Arc;
use thiserror::Error;
use tokio::task::JoinHandle;

/// Outcome of one reconciler cycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ReconcilerReport {
    /// Expired claims returned to the pending pool.
    pub released: usize,
    /// Silent orchestrators marked offline.
    pub marked_offline: u64,
}

/// Errors returned by reconciler cycles.
#[derive(Debug, Error)]
pub enum ReconcilerError {
    /// Store operation failed.
    #[error(transparent)]
    Store(#[from] TaskStoreError),

    /// Directory operation failed.
    #[error(transparent)]
    Directory(#[from] DirectoryError),
}

/// Returns expired claims to the pending pool and marks silent
/// orchestrators offline on a fixed cadence.
#[derive(Clone)]
pub struct LeaseReconciler<S, D, C>
where
    S: TaskStore,
    D: OrchestratorDirectory,
    C: Clock + Send + Sync,
{
    store: Arc<S>,
    directory: Arc<D>,
    clock: Arc<C>,
    config: CoordinatorConfig,
}

impl<S, D, C> LeaseReconciler<S, D, C>
where
    S: TaskStore,
    D: OrchestratorDirectory,
    C: Clock + Send + Sync,
{
    /// Creates a new reconciler.
    #[must_use]
    pub const fn new(
        store: Arc<S>,
        directory: Arc<D>,
        clock: Arc<C>,
        config: CoordinatorConfig,
    ) -> Self {
        Self {
            store,
            directory,
            clock,
            config,
        }
    }

    /// Runs one reconciliation cycle.
    ///
    /// Released rows keep their version; a stale submit from the
    /// previous lease holder still collides on `queue = claimed` and
    /// fails cleanly. Per-row history failures are logged and never
    /// abort the sweep.
    ///
    /// # Errors
    ///
    /// Returns [`ReconcilerError`] when a bulk write itself fails.
    pub async fn run_once(&self) -> Result<ReconcilerReport, ReconcilerError> {
        let now = self.clock.utc();

        let released = self.store.release_expired(now).await?;
        for task in &released {
            tracing::info!(task = %task.key(), "released expired lease");
            let entry = NewHistoryEntry::new(task.key().clone(), HistoryEvent::Requeued)
                .with_details(json!({ "detail": "Lease expired" }));
            if let Err(err) = self.store.append_history(&entry, now).await {
                tracing::warn!(
                    task = %task.key(),
                    error = %err,
                    "failed to journal lease expiry",
                );
            }
        }

        let stale_seconds =
            i64::try_from(self.config.stale_orchestrator_timeout_seconds).unwrap_or(i64::MAX);
        let cutoff = now - Duration::seconds(stale_seconds);
        let marked_offline = self.directory.mark_stale_offline(cutoff, now).await?;
        if marked_offline > 0 {
            tracing::info!(marked_offline, "marked silent orchestrators offline");
        }

        Ok(ReconcilerReport {
            released: released.len(),
            marked_offline,
        })
    }

    /// Spawns the reconciler as an independent periodic task.
    ///
    /// Cycle failures are logged and the loop continues; the store is
    /// expected to recover.
    #[must_use]
    pub fn spawn(self) -> JoinHandle<()>
    where
        S: 'static,
        D: 'static,
        C: 'static,
    {
        let interval = self.config.reconciler_interval();
        tokio::spawn(async move {
            let mut ticker = tokio::time::interval(interval);
            ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);
            loop {
                ticker.tick().await;
                match self.run_once().await {
                    Ok(report) if report.released > 0 || report.marked_offline > 0 => {
                        tracing::info!(
                            released = report.released,
                            marked_offline = report.marked_offline,
                            "reconciler cycle completed",
                        );
                    }
                    Ok(_) => {}
                    Err(err) => {
                        tracing::error!(error = %err, "reconciler cycle failed");
                    }
                }
            }
        })
    }
}
