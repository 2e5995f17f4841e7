use std::collections::{BTreeMap, BTreeSet};
use std::sync::Arc;

use tracing::{debug, info, warn};

use crate::dag::graph::DagGraph;
use crate::dag::scheduler_step::SchedulerStep;
use crate::dag::state_manager::{ReadOnlyStateManager, StateManager};
use crate::dag::task_info::{TaskInfo, TaskState};
use crate::engine::{TaskId, TaskOutcome};

/// Scheduler holds the immutable DAG plus the mutable per-run task table.
///
/// It is a synchronous state machine with no Tokio types and no IO; the async
/// shell in [`engine::Runner`](crate::engine::Runner) owns exactly one of
/// these per run and is the only writer of task state.
///
/// It is responsible for:
/// - marking dependency-free tasks `Ready` when the run starts
/// - handing out `Ready` tasks within the concurrency limit
/// - recording success/failure of dispatched tasks
/// - promoting dependents whose dependencies all succeeded
/// - skipping the transitive dependents of a failed task
#[derive(Debug)]
pub struct Scheduler {
    graph: Arc<DagGraph>,
    tasks: BTreeMap<TaskId, TaskInfo>,
    /// Ready queue. Dispatch order among ready tasks is ascending id.
    ready: BTreeSet<TaskId>,
    in_flight: usize,
    started: bool,
}

impl Scheduler {
    pub fn new(graph: Arc<DagGraph>) -> Self {
        let tasks = graph
            .tasks()
            .map(|name| {
                let deps = graph.dependencies_of(name).to_vec();
                (name.to_string(), TaskInfo::new(name.to_string(), deps))
            })
            .collect();

        Self {
            graph,
            tasks,
            ready: BTreeSet::new(),
            in_flight: 0,
            started: false,
        }
    }

    pub fn graph(&self) -> &DagGraph {
        &self.graph
    }

    /// Mark every task without dependencies `Ready`.
    ///
    /// Calling this more than once is a no-op.
    pub fn start(&mut self) -> SchedulerStep {
        if self.started {
            warn!("scheduler already started; ignoring");
            return SchedulerStep::default();
        }
        self.started = true;

        let roots: Vec<TaskId> = self.graph.roots().map(str::to_string).collect();
        let graph = Arc::clone(&self.graph);
        let mut manager = StateManager::new(&graph, &mut self.tasks);
        let newly_ready = manager.promote_ready(roots.iter().map(String::as_str));
        self.ready.extend(newly_ready.iter().cloned());

        info!(
            tasks = self.tasks.len(),
            roots = ?newly_ready,
            "scheduler: starting run"
        );

        SchedulerStep {
            newly_ready,
            newly_skipped: Vec::new(),
            run_just_finished: self.is_finished(),
        }
    }

    /// Pop `Ready` tasks and mark them `Running`, as long as fewer than
    /// `limit` tasks are in flight (`None` means unbounded).
    pub fn next_dispatch(&mut self, limit: Option<usize>) -> Vec<TaskId> {
        let limit = limit.map(|l| l.max(1)).unwrap_or(usize::MAX);
        let mut dispatched = Vec::new();

        while self.in_flight < limit {
            let Some(name) = self.ready.pop_first() else {
                break;
            };
            match self.tasks.get_mut(&name) {
                Some(info) if info.state == TaskState::Ready => {
                    info.state = TaskState::Running;
                    self.in_flight += 1;
                    debug!(task = %info.id, in_flight = self.in_flight, "dispatching task");
                    dispatched.push(name);
                }
                _ => {
                    debug!(task = %name, "dropping stale entry from ready queue");
                }
            }
        }

        dispatched
    }

    /// Record the outcome of a dispatched task.
    pub fn step_completion(&mut self, task: &str, outcome: &TaskOutcome) -> SchedulerStep {
        match self.tasks.get_mut(task) {
            Some(info) if info.state == TaskState::Running => {
                self.in_flight = self.in_flight.saturating_sub(1);
                match outcome {
                    TaskOutcome::Success(_) => {
                        info.state = TaskState::Succeeded;
                        debug!(task = %info.id, "task completed successfully");
                    }
                    TaskOutcome::Failed(err) => {
                        info.state = TaskState::Failed;
                        warn!(
                            task = %info.id,
                            error = %err,
                            "task failed; skipping dependents"
                        );
                    }
                }
            }
            Some(info) => {
                warn!(
                    task = %task,
                    state = ?info.state,
                    "completion for task that is not running; ignoring"
                );
                return SchedulerStep::default();
            }
            None => {
                warn!(task = %task, "completion for unknown task; ignoring");
                return SchedulerStep::default();
            }
        }

        let graph = Arc::clone(&self.graph);
        let mut manager = StateManager::new(&graph, &mut self.tasks);
        let mut step = SchedulerStep::default();

        match outcome {
            TaskOutcome::Success(_) => {
                let dependents = graph.dependents_of(task).iter().map(String::as_str);
                step.newly_ready = manager.promote_ready(dependents);
                self.ready.extend(step.newly_ready.iter().cloned());
            }
            TaskOutcome::Failed(_) => {
                step.newly_skipped = manager.mark_dependents_skipped(task);
            }
        }

        step.run_just_finished = self.is_finished();
        if step.run_just_finished {
            info!("scheduler: all tasks terminal; run finished");
        }
        step
    }

    /// `true` once every task is `Succeeded`, `Failed` or `Skipped`.
    pub fn is_finished(&self) -> bool {
        ReadOnlyStateManager::new(&self.tasks).all_tasks_terminal()
    }

    pub fn in_flight(&self) -> usize {
        self.in_flight
    }

    pub fn ready_len(&self) -> usize {
        self.ready.len()
    }

    pub fn state_of(&self, task: &str) -> Option<TaskState> {
        self.tasks.get(task).map(|info| info.state)
    }

    /// The failed task that caused `task` to be skipped, if any.
    pub fn blocked_by(&self, task: &str) -> Option<&str> {
        self.tasks.get(task)?.blocked_by.as_deref()
    }

    /// Whether all dependencies of `task` have succeeded.
    ///
    /// Returns `None` if the task is unknown.
    pub fn deps_satisfied(&self, task: &str) -> Option<bool> {
        let info = self.tasks.get(task)?;
        Some(ReadOnlyStateManager::new(&self.tasks).deps_satisfied_for_info(info))
    }

    pub fn task_names(&self) -> impl Iterator<Item = &str> {
        self.graph.tasks()
    }
}
