//! Error types for task domain validation, parsing, and transitions.

use super::{Queue, TaskKey};
use thiserror::Error;

/// Errors returned while constructing domain task values.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum TaskDomainError {
    /// The task key is empty after trimming.
    #[error("task key must not be empty")]
    EmptyTaskKey,

    /// The scope is empty after trimming.
    #[error("scope must not be empty")]
    EmptyScope,

    /// The agent name is empty after trimming.
    #[error("agent name must not be empty")]
    EmptyAgentName,

    /// The orchestrator identifier (or one of its parts) is empty.
    #[error("orchestrator identifier must not be empty")]
    EmptyOrchestratorId,

    /// The queue label is empty after trimming.
    #[error("queue label must not be empty")]
    EmptyQueue,

    /// The file path is empty after trimming.
    #[error("file path must not be empty")]
    EmptyFilePath,

    /// The branch is empty after trimming.
    #[error("branch must not be empty")]
    EmptyBranch,

    /// A task cannot block on itself.
    #[error("task {0} cannot be blocked by itself")]
    SelfDependency(TaskKey),

    /// No hook with the given name exists on the task.
    #[error("unknown hook: {0}")]
    UnknownHook(String),
}

/// Error returned while parsing priority labels from persistence.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[error("unknown priority: {0}")]
pub struct ParsePriorityError(pub String);

/// Error returned while parsing hook statuses.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[error("unknown hook status: {0}")]
pub struct ParseHookStatusError(pub String);

/// Error returned while parsing history events from persistence.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[error("unknown history event: {0}")]
pub struct ParseHistoryEventError(pub String);

/// Guard failures raised while evaluating a lifecycle transition.
///
/// Each variant corresponds to one guard of the state machine; the
/// conditional store write remains the ultimate arbiter under
/// concurrency.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum TransitionError {
    /// The task is not in the queue the action transitions from.
    #[error("task {task} is in queue '{found}', expected '{expected}'")]
    WrongQueue {
        /// Task being transitioned.
        task: TaskKey,
        /// Queue the action requires.
        expected: Queue,
        /// Queue the task was observed in.
        found: Queue,
    },

    /// The observed version does not match the caller's expectation.
    #[error("task {task} is at version {found}, expected {expected}")]
    VersionMismatch {
        /// Task being transitioned.
        task: TaskKey,
        /// Version the caller observed.
        expected: i64,
        /// Version currently recorded.
        found: i64,
    },

    /// The claim lease has expired or was never granted.
    #[error("task {task} has no active lease")]
    LeaseExpired {
        /// Task being transitioned.
        task: TaskKey,
    },

    /// The task's `blocked_by` dependency is not in the terminal state.
    #[error("task {task} is blocked by unresolved task {blocker}")]
    DependencyUnresolved {
        /// Task being transitioned.
        task: TaskKey,
        /// Unresolved dependency.
        blocker: TaskKey,
    },

    /// The task's `blocked_by` dependency does not exist.
    #[error("task {task} is blocked by missing task {blocker}")]
    DependencyMissing {
        /// Task being transitioned.
        task: TaskKey,
        /// Missing dependency.
        blocker: TaskKey,
    },

    /// The caller's role filter does not include the task's role.
    #[error("task {task} role {role:?} does not match the requested filter")]
    RoleMismatch {
        /// Task being transitioned.
        task: TaskKey,
        /// Role recorded on the task.
        role: Option<String>,
    },

    /// The task belongs to a different scope than the request.
    #[error("task {task} is outside scope '{requested}'")]
    ScopeMismatch {
        /// Task being transitioned.
        task: TaskKey,
        /// Scope the request was made under.
        requested: String,
    },

    /// An explicit block was requested on a task with no dependency.
    #[error("task {task} cannot be blocked without a blocked_by dependency")]
    MissingBlocker {
        /// Task being transitioned.
        task: TaskKey,
    },
}
