// src/dag/mod.rs

//! Task model, graph building and scheduling.
//!
//! - [`task`] defines [`Task`], its executor trait and the context it runs with.
//! - [`validate`] holds the structural checks (duplicates, unknown deps, cycles).
//! - [`graph`] builds the immutable, validated [`DagGraph`].
//! - [`scheduler`] contains the per-run state machine that decides which tasks
//!   are ready to run, and which must be skipped.
//! - [`task_info`] provides the per-run task state.
//! - [`scheduler_step`] defines the result type for scheduler steps.
//! - [`state_manager`] manages per-run state transitions.

pub mod graph;
pub mod scheduler;
pub mod scheduler_step;
pub mod state_manager;
pub mod task;
pub mod task_info;
pub mod validate;

pub use graph::DagGraph;
pub use scheduler::Scheduler;
pub use scheduler_step::SchedulerStep;
pub use task::{ExecFuture, Task, TaskContext, TaskExecutor, TaskInputs};
pub use task_info::TaskState;
