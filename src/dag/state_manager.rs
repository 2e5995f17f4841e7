// src/dag/state_manager.rs

//! Per-run state transitions for tasks in the scheduler.

use std::collections::{BTreeMap, HashSet};

use tracing::{debug, warn};

use crate::dag::task_info::{TaskInfo, TaskState};
use crate::dag::DagGraph;
use crate::engine::TaskId;

/// Applies state transitions to the scheduler's task table.
pub struct StateManager<'a> {
    graph: &'a DagGraph,
    tasks: &'a mut BTreeMap<TaskId, TaskInfo>,
}

impl<'a> StateManager<'a> {
    pub fn new(graph: &'a DagGraph, tasks: &'a mut BTreeMap<TaskId, TaskInfo>) -> Self {
        Self { graph, tasks }
    }

    /// Move every `Pending` task whose dependencies all succeeded to `Ready`.
    ///
    /// Only the given candidates are examined; the caller passes the roots
    /// at start and the dependents of a finished task afterwards.
    pub fn promote_ready<'c>(&mut self, candidates: impl IntoIterator<Item = &'c str>) -> Vec<TaskId> {
        let mut promoted = Vec::new();

        for name in candidates {
            let satisfied = match self.tasks.get(name) {
                Some(info) if info.state == TaskState::Pending => {
                    ReadOnlyStateManager::new(self.tasks).deps_satisfied_for_info(info)
                }
                Some(_) => false,
                None => {
                    warn!(task = %name, "node in DAG not present in tasks map");
                    false
                }
            };

            if satisfied && let Some(info) = self.tasks.get_mut(name) {
                info.state = TaskState::Ready;
                debug!(task = %info.id, "dependencies satisfied; marking Ready");
                promoted.push(info.id.clone());
            }
        }

        promoted
    }

    /// Mark every transitive dependent of `failed_task` as `Skipped`.
    ///
    /// Returns the newly skipped tasks in ascending id order.
    pub fn mark_dependents_skipped(&mut self, failed_task: &str) -> Vec<TaskId> {
        let mut stack: Vec<TaskId> = self.graph.dependents_of(failed_task).to_vec();
        let mut visited: HashSet<TaskId> = HashSet::new();
        let mut newly_skipped = Vec::new();

        while let Some(name) = stack.pop() {
            if !visited.insert(name.clone()) {
                continue;
            }

            if let Some(info) = self.tasks.get_mut(&name) {
                match info.state {
                    TaskState::Pending | TaskState::Ready => {
                        info.state = TaskState::Skipped;
                        info.blocked_by = Some(failed_task.to_string());
                        debug!(
                            task = %info.id,
                            blocked_by = %failed_task,
                            "marking dependent as Skipped due to upstream failure"
                        );
                        newly_skipped.push(info.id.clone());
                        stack.extend(self.graph.dependents_of(&name).iter().cloned());
                    }
                    TaskState::Skipped => {
                        // Already blocked by an earlier failure; its subtree
                        // was handled then.
                    }
                    TaskState::Running | TaskState::Succeeded | TaskState::Failed => {
                        warn!(
                            task = %info.id,
                            state = ?info.state,
                            "dependent of a failed task was already dispatched"
                        );
                    }
                }
            }
        }

        newly_skipped.sort();
        newly_skipped
    }
}

/// A read-only view for checking dependency satisfaction.
pub struct ReadOnlyStateManager<'a> {
    tasks: &'a BTreeMap<TaskId, TaskInfo>,
}

impl<'a> ReadOnlyStateManager<'a> {
    pub fn new(tasks: &'a BTreeMap<TaskId, TaskInfo>) -> Self {
        Self { tasks }
    }

    /// A task may run only once every one of its dependencies has succeeded.
    pub fn deps_satisfied_for_info(&self, info: &TaskInfo) -> bool {
        info.deps.iter().all(|dep_name| match self.tasks.get(dep_name) {
            Some(dep) => dep.state == TaskState::Succeeded,
            None => {
                warn!(
                    task = %info.id,
                    dep = %dep_name,
                    "dependency missing from tasks map"
                );
                false
            }
        })
    }

    /// Check if all tasks are in a terminal state.
    pub fn all_tasks_terminal(&self) -> bool {
        self.tasks.values().all(|info| info.state.is_terminal())
    }
}
