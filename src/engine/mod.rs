// src/engine/mod.rs

//! Orchestration engine for dagrun.
//!
//! This module ties together:
//! - the DAG scheduler (pure state machine in [`crate::dag`])
//! - the async runner that launches tasks as independent Tokio tasks and
//!   reacts to them settling ([`runtime`])
//! - the lifecycle event stream consumed by the result collector and by an
//!   optional [`RunObserver`]
//!
//! Settlement handling is pure and lives in [`event_handlers`]; the IO shell
//! is [`runtime::Runner`].

use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use serde_json::Value;

use crate::dag::TaskState;
use crate::errors::TaskError;

pub use crate::types::OnFailure;

/// Canonical task id type used throughout the engine.
pub type TaskId = String;

/// Outcome of a task's executor, as seen by the scheduler.
#[derive(Debug, Clone, PartialEq)]
pub enum TaskOutcome {
    Success(Value),
    Failed(TaskError),
}

impl TaskOutcome {
    pub fn is_success(&self) -> bool {
        matches!(self, TaskOutcome::Success(_))
    }
}

/// Payload attached to a [`TaskEvent`].
#[derive(Debug, Clone, PartialEq)]
pub enum EventDetail {
    None,
    Result(Value),
    Error(TaskError),
    /// The failed task that caused a skip.
    BlockedBy(TaskId),
}

/// A single task state transition, stamped with its offset from run start.
#[derive(Debug, Clone, PartialEq)]
pub struct TaskEvent {
    pub id: TaskId,
    pub state: TaskState,
    pub at: Duration,
    pub detail: EventDetail,
}

impl TaskEvent {
    fn new(id: impl Into<TaskId>, state: TaskState, at: Duration, detail: EventDetail) -> Self {
        Self {
            id: id.into(),
            state,
            at,
            detail,
        }
    }

    pub fn pending(id: impl Into<TaskId>, at: Duration) -> Self {
        Self::new(id, TaskState::Pending, at, EventDetail::None)
    }

    pub fn ready(id: impl Into<TaskId>, at: Duration) -> Self {
        Self::new(id, TaskState::Ready, at, EventDetail::None)
    }

    pub fn running(id: impl Into<TaskId>, at: Duration) -> Self {
        Self::new(id, TaskState::Running, at, EventDetail::None)
    }

    pub fn succeeded(id: impl Into<TaskId>, at: Duration, result: Value) -> Self {
        Self::new(id, TaskState::Succeeded, at, EventDetail::Result(result))
    }

    pub fn failed(id: impl Into<TaskId>, at: Duration, error: TaskError) -> Self {
        Self::new(id, TaskState::Failed, at, EventDetail::Error(error))
    }

    pub fn skipped(id: impl Into<TaskId>, at: Duration, blocked_by: impl Into<TaskId>) -> Self {
        Self::new(
            id,
            TaskState::Skipped,
            at,
            EventDetail::BlockedBy(blocked_by.into()),
        )
    }
}

/// Options for a single run.
#[derive(Clone, Default)]
pub struct RunOptions {
    /// Maximum number of tasks in flight at once; `None` is unbounded.
    pub concurrency_limit: Option<usize>,
    pub on_failure: OnFailure,
    /// Receives every lifecycle event. Purely advisory.
    pub observer: Option<Arc<dyn RunObserver>>,
}

impl RunOptions {
    pub fn with_concurrency_limit(mut self, limit: usize) -> Self {
        self.concurrency_limit = Some(limit);
        self
    }

    pub fn with_observer(mut self, observer: Arc<dyn RunObserver>) -> Self {
        self.observer = Some(observer);
        self
    }
}

impl fmt::Debug for RunOptions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RunOptions")
            .field("concurrency_limit", &self.concurrency_limit)
            .field("on_failure", &self.on_failure)
            .field("observer", &self.observer.is_some())
            .finish()
    }
}

pub mod event_handlers;
pub mod observer;
pub mod runtime;

pub use event_handlers::{Settled, handle_settled, start_run};
pub use observer::{RunObserver, TracingObserver};
pub use runtime::{Runner, run};
