//! Service layer for the task lifecycle engine.

mod engine;
mod facade;
mod selector;

pub use engine::{EngineError, EngineResult, TransitionEngine};
pub use facade::{
    AcceptTaskRequest, ClaimTaskRequest, CompleteHookRequest, CreateTaskRequest, ErrorKind,
    FacadeError, FacadeResult, ListTasksRequest, RejectTaskRequest, RequeueTaskRequest,
    SubmitTaskRequest, TaskFacade, UpdateTaskRequest,
};
pub use selector::{ClaimError, ClaimOutcome, ClaimRequest, ClaimSelector};
