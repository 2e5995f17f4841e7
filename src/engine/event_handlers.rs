// src/engine/event_handlers.rs

//! Pure settlement handling for the runner.
//!
//! These functions update the scheduler and return the lifecycle events the
//! IO shell should publish. They never touch Tokio.

use std::time::Duration;

use tracing::warn;

use crate::dag::{Scheduler, TaskInputs, TaskState};
use crate::engine::{TaskEvent, TaskId, TaskOutcome};

/// A task that has finished executing, with its finish offset.
#[derive(Debug, Clone)]
pub struct Settled {
    pub id: TaskId,
    pub outcome: TaskOutcome,
    pub finished_at: Duration,
}

/// Start the run: every task is announced `Pending`, then the roots `Ready`.
pub fn start_run(scheduler: &mut Scheduler, at: Duration) -> Vec<TaskEvent> {
    let mut events: Vec<TaskEvent> = scheduler
        .task_names()
        .map(|name| TaskEvent::pending(name, at))
        .collect();

    let step = scheduler.start();
    events.extend(step.newly_ready.into_iter().map(|name| TaskEvent::ready(name, at)));
    events
}

/// Record a settled task.
///
/// Successful results are kept in `outputs` so dependents can receive them.
/// The returned events are, in order: the task's own terminal event, then
/// any dependents skipped or made ready by it, all stamped with the task's
/// finish offset.
pub fn handle_settled(
    scheduler: &mut Scheduler,
    outputs: &mut TaskInputs,
    settled: Settled,
) -> Vec<TaskEvent> {
    let Settled {
        id,
        outcome,
        finished_at,
    } = settled;

    if scheduler.state_of(&id) != Some(TaskState::Running) {
        warn!(task = %id, "settlement for task that is not running; ignoring");
        return Vec::new();
    }

    let step = scheduler.step_completion(&id, &outcome);

    let mut events = Vec::with_capacity(1 + step.newly_ready.len() + step.newly_skipped.len());
    match outcome {
        TaskOutcome::Success(value) => {
            outputs.insert(id.clone(), value.clone());
            events.push(TaskEvent::succeeded(id.clone(), finished_at, value));
        }
        TaskOutcome::Failed(err) => {
            events.push(TaskEvent::failed(id.clone(), finished_at, err));
        }
    }

    events.extend(
        step.newly_skipped
            .into_iter()
            .map(|name| TaskEvent::skipped(name, finished_at, id.clone())),
    );
    events.extend(
        step.newly_ready
            .into_iter()
            .map(|name| TaskEvent::ready(name, finished_at)),
    );

    events
}

/// Results of `task`'s declared dependencies.
pub fn inputs_for(scheduler: &Scheduler, outputs: &TaskInputs, task: &str) -> TaskInputs {
    scheduler
        .graph()
        .dependencies_of(task)
        .iter()
        .filter_map(|dep| outputs.get(dep).map(|v| (dep.clone(), v.clone())))
        .collect()
}
