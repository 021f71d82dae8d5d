//! Append-only journal of task lifecycle events.
//!
//! History rows are best-effort: they are appended after the
//! authoritative task write commits, and a missing row never invalidates
//! task state.

use super::{ParseHistoryEventError, TaskKey};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

/// Lifecycle event recorded in the task history journal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum HistoryEvent {
    /// Task record created.
    Created,
    /// Claim granted from the pending pool.
    Claimed,
    /// Review claim granted on a provisional task.
    ReviewClaimed,
    /// Work submitted by the claim holder.
    Submitted,
    /// Burnout heuristic fired during submission.
    BurnoutDetected,
    /// Submission accepted; task reached the terminal state.
    Accepted,
    /// Submission rejected; task returned to the pending pool.
    Rejected,
    /// Claim relinquished or forfeited back to the pending pool.
    Requeued,
    /// Task explicitly blocked.
    Blocked,
    /// Task explicitly unblocked.
    Unblocked,
}

impl HistoryEvent {
    /// Returns the canonical storage representation.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Created => "created",
            Self::Claimed => "claimed",
            Self::ReviewClaimed => "review_claimed",
            Self::Submitted => "submitted",
            Self::BurnoutDetected => "burnout_detected",
            Self::Accepted => "accepted",
            Self::Rejected => "rejected",
            Self::Requeued => "requeued",
            Self::Blocked => "blocked",
            Self::Unblocked => "unblocked",
        }
    }
}

impl fmt::Display for HistoryEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl TryFrom<&str> for HistoryEvent {
    type Error = ParseHistoryEventError;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        let normalized = value.trim().to_ascii_lowercase();
        match normalized.as_str() {
            "created" => Ok(Self::Created),
            "claimed" => Ok(Self::Claimed),
            "review_claimed" => Ok(Self::ReviewClaimed),
            "submitted" => Ok(Self::Submitted),
            "burnout_detected" => Ok(Self::BurnoutDetected),
            "accepted" => Ok(Self::Accepted),
            "rejected" => Ok(Self::Rejected),
            "requeued" => Ok(Self::Requeued),
            "blocked" => Ok(Self::Blocked),
            "unblocked" => Ok(Self::Unblocked),
            _ => Err(ParseHistoryEventError(value.to_owned())),
        }
    }
}

/// Journal entry awaiting persistence.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewHistoryEntry {
    /// Task the entry belongs to.
    pub task: TaskKey,
    /// Recorded lifecycle event.
    pub event: HistoryEvent,
    /// Agent or reviewer associated with the event, when known.
    pub agent: Option<String>,
    /// Structured event detail payload.
    pub details: Option<serde_json::Value>,
}

impl NewHistoryEntry {
    /// Creates an entry with no agent or details.
    #[must_use]
    pub const fn new(task: TaskKey, event: HistoryEvent) -> Self {
        Self {
            task,
            event,
            agent: None,
            details: None,
        }
    }

    /// Sets the associated agent.
    #[must_use]
    pub fn with_agent(mut self, agent: impl Into<String>) -> Self {
        self.agent = Some(agent.into());
        self
    }

    /// Sets the structured detail payload.
    #[must_use]
    pub fn with_details(mut self, details: serde_json::Value) -> Self {
        self.details = Some(details);
        self
    }
}

/// Persisted journal entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HistoryEntry {
    /// Surrogate row identifier.
    pub id: Uuid,
    /// Task the entry belongs to.
    pub task: TaskKey,
    /// Recorded lifecycle event.
    pub event: HistoryEvent,
    /// Agent or reviewer associated with the event, when known.
    pub agent: Option<String>,
    /// Structured event detail payload.
    pub details: Option<serde_json::Value>,
    /// Append timestamp.
    pub created_at: DateTime<Utc>,
}
