// src/dag/scheduler_step.rs

//! Step-by-step execution result types for the scheduler.

use crate::engine::TaskId;

/// Structured result of a single scheduler "step".
///
/// Tests can drive the [`Scheduler`](crate::dag::Scheduler) by hand and make
/// assertions about what changed.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SchedulerStep {
    /// Tasks that became `Ready` as a result of this step, ascending.
    pub newly_ready: Vec<TaskId>,
    /// Tasks that were newly marked `Skipped` in this step, ascending.
    pub newly_skipped: Vec<TaskId>,
    /// Whether every task is now terminal.
    pub run_just_finished: bool,
}
