//! Lifecycle transition requests, guards, and side effects.
//!
//! Transitions are tagged variants so the engine dispatches exhaustively:
//! adding an action or a guard without handling it everywhere is a
//! compile error. Guards are evaluated against an observed task snapshot
//! before the conditional store write; the write's
//! `(key, queue, version)` predicate remains the ultimate arbiter under
//! concurrency.

use super::{
    AgentName, OrchestratorId, Queue, ScopeName, Task, TaskKey, TransitionError,
    history::NewHistoryEntry,
};
use chrono::{DateTime, Utc};
use serde_json::Value;

/// Caller-supplied classifier filter, a single label or a set.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LabelFilter(Vec<String>);

impl LabelFilter {
    /// Creates a filter from one or more labels, dropping empties.
    ///
    /// Returns `None` when no non-empty label remains, so callers treat
    /// an all-blank filter as absent.
    #[must_use]
    pub fn new<I, S>(labels: I) -> Option<Self>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let labels: Vec<String> = labels
            .into_iter()
            .map(Into::into)
            .map(|label| label.trim().to_owned())
            .filter(|label| !label.is_empty())
            .collect();
        if labels.is_empty() {
            None
        } else {
            Some(Self(labels))
        }
    }

    /// Returns the labels in the filter.
    #[must_use]
    pub fn labels(&self) -> &[String] {
        &self.0
    }

    /// Returns the single label when the filter holds exactly one.
    #[must_use]
    pub fn single(&self) -> Option<&str> {
        match self.0.as_slice() {
            [only] => Some(only),
            _ => None,
        }
    }

    /// Returns `true` when the filter contains the label.
    #[must_use]
    pub fn contains(&self, label: &str) -> bool {
        self.0.iter().any(|candidate| candidate == label)
    }
}

/// Burnout thresholds applied at submit time.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BurnoutLimits {
    /// Turns-used threshold that fires when no commits were produced.
    pub burnout_turn_threshold: i64,
    /// Absolute turns-used ceiling that fires regardless of commits.
    pub max_turn_limit: i64,
}

impl BurnoutLimits {
    /// Returns `true` when a submission should route to
    /// `needs_continuation`.
    #[must_use]
    pub const fn is_burnout(&self, commits_count: i64, turns_used: i64) -> bool {
        (commits_count == 0 && turns_used >= self.burnout_turn_threshold)
            || turns_used >= self.max_turn_limit
    }

    /// Returns the threshold that fired for a burnout submission.
    #[must_use]
    pub const fn threshold_for(&self, commits_count: i64, turns_used: i64) -> i64 {
        if commits_count == 0 && turns_used >= self.burnout_turn_threshold {
            self.burnout_turn_threshold
        } else {
            self.max_turn_limit
        }
    }
}

/// Payload of a claim or review-claim transition.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClaimTransition {
    /// Agent taking the lease.
    pub agent: AgentName,
    /// Fleet member taking the lease.
    pub orchestrator: OrchestratorId,
    /// Absolute lease expiry.
    pub lease_expires_at: DateTime<Utc>,
    /// Scope the claim was requested under.
    pub scope: ScopeName,
    /// Optional role filter the task must match.
    pub role_filter: Option<LabelFilter>,
    /// Queue the task was observed in by the selector.
    pub from: Queue,
    /// Version the selector observed; the write predicates on it.
    pub expected_version: i64,
}

/// Payload of a submit transition.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SubmitTransition {
    /// Commits produced by the claim holder.
    pub commits_count: i64,
    /// Turns consumed by the claim holder.
    pub turns_used: i64,
    /// Structured check results.
    pub check_results: Option<Value>,
    /// Free-form execution notes.
    pub execution_notes: Option<String>,
    /// Optional caller-observed version to predicate on.
    pub expected_version: Option<i64>,
}

/// Payload of an accept transition.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AcceptTransition {
    /// Reviewer accepting the submission.
    pub accepted_by: String,
}

/// Payload of a reject transition.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RejectTransition {
    /// Reason recorded in history.
    pub reason: String,
    /// Reviewer rejecting the submission.
    pub rejected_by: String,
}

/// Payload of a requeue transition.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RequeueTransition {
    /// Optional agent relinquishing the claim.
    pub agent: Option<String>,
    /// Optional detail recorded in history.
    pub detail: Option<String>,
}

/// A requested lifecycle transition, one variant per action.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TransitionRequest {
    /// Take a lease on a pending task.
    Claim(ClaimTransition),
    /// Take a review lease on a provisional task.
    ClaimForReview(ClaimTransition),
    /// Submit work under an active lease.
    Submit(SubmitTransition),
    /// Accept a provisional submission; the only path to `done`.
    Accept(AcceptTransition),
    /// Reject a provisional submission back to the pending pool.
    Reject(RejectTransition),
    /// Relinquish a claim back to the pending pool.
    Requeue(RequeueTransition),
    /// Explicitly block a pending task on its dependency.
    Block,
    /// Return an explicitly blocked task to the pending pool.
    Unblock,
}

/// Guard evaluated before the conditional write.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Guard {
    /// `blocked_by` is absent or references a `done` task.
    DependencyResolved,
    /// The caller's role filter includes the task's role.
    RoleMatches,
    /// The lease is granted and strictly unexpired.
    LeaseValid,
    /// The caller-observed version equals the current version.
    VersionMatches,
    /// The task's scope equals the request scope.
    ScopeMatches,
}

/// Resolution state of a task's `blocked_by` dependency, established by
/// the engine before guard evaluation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DependencyState {
    /// The task has no dependency.
    None,
    /// The dependency exists and is in the terminal state.
    Resolved,
    /// The dependency exists but has not reached the terminal state.
    Unresolved(TaskKey),
    /// The dependency does not exist.
    Missing(TaskKey),
}

/// Request-derived inputs to guard evaluation.
#[derive(Debug, Clone)]
pub struct GuardContext<'a> {
    /// Evaluation instant for lease checks.
    pub now: DateTime<Utc>,
    /// Scope the request was made under, when one is in play.
    pub scope: Option<&'a ScopeName>,
    /// Role filter supplied by the caller, when any.
    pub role_filter: Option<&'a LabelFilter>,
    /// Version the caller observed, when it predicates the write.
    pub expected_version: Option<i64>,
    /// Resolution state of the task's dependency.
    pub dependency: DependencyState,
}

impl Guard {
    /// Checks the guard against an observed task.
    ///
    /// # Errors
    ///
    /// Returns the [`TransitionError`] describing the violated guard.
    pub fn check(self, task: &Task, ctx: &GuardContext<'_>) -> Result<(), TransitionError> {
        match self {
            Self::DependencyResolved => match &ctx.dependency {
                DependencyState::None | DependencyState::Resolved => Ok(()),
                DependencyState::Unresolved(blocker) => Err(TransitionError::DependencyUnresolved {
                    task: task.key().clone(),
                    blocker: blocker.clone(),
                }),
                DependencyState::Missing(blocker) => Err(TransitionError::DependencyMissing {
                    task: task.key().clone(),
                    blocker: blocker.clone(),
                }),
            },
            Self::RoleMatches => match ctx.role_filter {
                None => Ok(()),
                Some(filter) => {
                    let matches = task.role().is_some_and(|role| filter.contains(role));
                    if matches {
                        Ok(())
                    } else {
                        Err(TransitionError::RoleMismatch {
                            task: task.key().clone(),
                            role: task.role().map(str::to_owned),
                        })
                    }
                }
            },
            Self::LeaseValid => {
                if task.lease_active_at(ctx.now) {
                    Ok(())
                } else {
                    Err(TransitionError::LeaseExpired {
                        task: task.key().clone(),
                    })
                }
            }
            Self::VersionMatches => match ctx.expected_version {
                None => Ok(()),
                Some(expected) if expected == task.version() => Ok(()),
                Some(expected) => Err(TransitionError::VersionMismatch {
                    task: task.key().clone(),
                    expected,
                    found: task.version(),
                }),
            },
            Self::ScopeMatches => match ctx.scope {
                None => Ok(()),
                Some(scope) if scope == task.scope() => Ok(()),
                Some(scope) => Err(TransitionError::ScopeMismatch {
                    task: task.key().clone(),
                    requested: scope.to_string(),
                }),
            },
        }
    }
}

/// Side effect to run after the conditional write commits.
///
/// Effects never run when the write matches zero rows.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SideEffect {
    /// Append a best-effort history row.
    AppendHistory(NewHistoryEntry),
    /// Clear `blocked_by` on every task depending on the blocker.
    UnblockDependents {
        /// Task whose dependents are released.
        blocker: TaskKey,
    },
}

impl TransitionRequest {
    /// Returns the queue the action transitions from.
    #[must_use]
    pub fn from_queue(&self) -> Queue {
        match self {
            Self::Claim(claim) => claim.from.clone(),
            Self::ClaimForReview(_) | Self::Accept(_) | Self::Reject(_) => Queue::provisional(),
            Self::Submit(_) | Self::Requeue(_) => Queue::claimed(),
            Self::Block => Queue::incoming(),
            Self::Unblock => Queue::blocked(),
        }
    }

    /// Returns the guards the action evaluates, in order.
    #[must_use]
    pub const fn guards(&self) -> &'static [Guard] {
        match self {
            Self::Claim(_) => &[
                Guard::ScopeMatches,
                Guard::DependencyResolved,
                Guard::RoleMatches,
                Guard::VersionMatches,
            ],
            Self::ClaimForReview(_) => &[
                Guard::ScopeMatches,
                Guard::RoleMatches,
                Guard::VersionMatches,
            ],
            Self::Submit(_) => &[Guard::LeaseValid, Guard::VersionMatches],
            Self::Accept(_) | Self::Reject(_) | Self::Requeue(_) | Self::Block => &[],
            Self::Unblock => &[Guard::DependencyResolved],
        }
    }

    /// Builds the guard context for this request.
    #[must_use]
    pub fn guard_context(
        &self,
        now: DateTime<Utc>,
        dependency: DependencyState,
    ) -> GuardContext<'_> {
        let (scope, role_filter, expected_version) = match self {
            Self::Claim(claim) | Self::ClaimForReview(claim) => (
                Some(&claim.scope),
                claim.role_filter.as_ref(),
                Some(claim.expected_version),
            ),
            Self::Submit(submit) => (None, None, submit.expected_version),
            Self::Accept(_) | Self::Reject(_) | Self::Requeue(_) | Self::Block | Self::Unblock => {
                (None, None, None)
            }
        };
        GuardContext {
            now,
            scope,
            role_filter,
            expected_version,
            dependency,
        }
    }

    /// Checks the from-queue and every guard against an observed task.
    ///
    /// # Errors
    ///
    /// Returns the first violated guard as a [`TransitionError`].
    pub fn check(&self, task: &Task, ctx: &GuardContext<'_>) -> Result<(), TransitionError> {
        let expected = self.from_queue();
        if task.queue() != &expected {
            return Err(TransitionError::WrongQueue {
                task: task.key().clone(),
                expected,
                found: task.queue().clone(),
            });
        }
        if matches!(self, Self::Block) && task.blocked_by().is_none() {
            return Err(TransitionError::MissingBlocker {
                task: task.key().clone(),
            });
        }
        for guard in self.guards() {
            guard.check(task, ctx)?;
        }
        Ok(())
    }
}
