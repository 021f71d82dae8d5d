//! Domain model for the task lifecycle engine.
//!
//! The task domain models queue membership, lease-based claim ownership,
//! optimistic-concurrency transitions, and the append-only history
//! journal while keeping all infrastructure concerns outside of the
//! domain boundary.

mod error;
mod history;
mod hook;
mod ids;
mod priority;
mod queue;
mod task;
mod transition;

pub use error::{
    ParseHistoryEventError, ParseHookStatusError, ParsePriorityError, TaskDomainError,
    TransitionError,
};
pub use history::{HistoryEntry, HistoryEvent, NewHistoryEntry};
pub use hook::{Hook, HookSet, HookStatus};
pub use ids::{AgentName, OrchestratorId, ScopeName, TaskKey};
pub use priority::Priority;
pub use queue::Queue;
pub use task::{NewTaskSpec, PersistedTaskData, Task, TaskPatch};
pub use transition::{
    AcceptTransition, BurnoutLimits, ClaimTransition, DependencyState, Guard, GuardContext,
    LabelFilter, RejectTransition, RequeueTransition, SideEffect, SubmitTransition,
    TransitionRequest,
};
