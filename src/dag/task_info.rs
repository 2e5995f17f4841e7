// src/dag/task_info.rs

//! Per-run task state.

use serde::Serialize;

use crate::engine::TaskId;

/// Lifecycle of a task within a single run.
///
/// ```text
/// Pending -> Ready -> Running -> Succeeded
///    |                       \-> Failed
///    \-> Skipped (a dependency Failed or was Skipped)
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum TaskState {
    /// Waiting on at least one dependency.
    Pending,
    /// All dependencies succeeded; waiting for a dispatch slot.
    Ready,
    /// Dispatched; the executor is in flight.
    Running,
    Succeeded,
    Failed,
    /// Never executed because an ancestor failed.
    Skipped,
}

impl TaskState {
    pub fn is_terminal(self) -> bool {
        matches!(
            self,
            TaskState::Succeeded | TaskState::Failed | TaskState::Skipped
        )
    }

    pub fn as_str(self) -> &'static str {
        match self {
            TaskState::Pending => "pending",
            TaskState::Ready => "ready",
            TaskState::Running => "running",
            TaskState::Succeeded => "succeeded",
            TaskState::Failed => "failed",
            TaskState::Skipped => "skipped",
        }
    }
}

impl std::fmt::Display for TaskState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Scheduler bookkeeping for one task.
#[derive(Debug, Clone)]
pub struct TaskInfo {
    pub id: TaskId,
    /// Direct dependencies for this task.
    pub deps: Vec<TaskId>,
    pub state: TaskState,
    /// For `Skipped` tasks: the failed task that blocked them.
    pub blocked_by: Option<TaskId>,
}

impl TaskInfo {
    pub fn new(id: TaskId, deps: Vec<TaskId>) -> Self {
        Self {
            id,
            deps,
            state: TaskState::Pending,
            blocked_by: None,
        }
    }
}
