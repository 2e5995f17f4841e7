// src/dag/graph.rs

use std::collections::BTreeMap;

use petgraph::algo::toposort;
use petgraph::graphmap::DiGraphMap;
use tracing::debug;

use crate::dag::task::Task;
use crate::dag::validate::check_structure;
use crate::engine::TaskId;
use crate::errors::BuildError;

/// Internal node structure: the task plus immediate deps and dependents.
#[derive(Debug, Clone)]
struct DagNode {
    task: Task,
    /// Direct dependencies, ascending.
    deps: Vec<TaskId>,
    /// Direct dependents: tasks that list this one in their `depends_on`.
    dependents: Vec<TaskId>,
}

/// Validated, immutable dependency graph keyed by task id.
///
/// Only obtainable through [`DagGraph::build`], so holding one means the
/// task set has unique ids, known dependencies, and no cycles.
#[derive(Debug, Clone)]
pub struct DagGraph {
    nodes: BTreeMap<TaskId, DagNode>,
    topo_order: Vec<TaskId>,
}

impl DagGraph {
    /// Validate `tasks` and build the graph.
    ///
    /// Fails with the first of [`BuildError::DuplicateId`],
    /// [`BuildError::UnknownDependency`] or [`BuildError::Cycle`].
    pub fn build(tasks: impl IntoIterator<Item = Task>) -> Result<Self, BuildError> {
        let tasks: Vec<Task> = tasks.into_iter().collect();

        check_structure(tasks.iter().map(|t| {
            (
                t.id(),
                t.dependencies().iter().map(String::as_str),
            )
        }))?;

        let mut nodes: BTreeMap<TaskId, DagNode> = tasks
            .into_iter()
            .map(|task| {
                let deps = task.dependencies().iter().cloned().collect();
                (
                    task.id().to_string(),
                    DagNode {
                        task,
                        deps,
                        dependents: Vec::new(),
                    },
                )
            })
            .collect();

        // Second pass: populate dependents based on deps. Iterating in key
        // order keeps every dependents list sorted.
        let edges: Vec<(TaskId, TaskId)> = nodes
            .iter()
            .flat_map(|(name, node)| node.deps.iter().map(|dep| (dep.clone(), name.clone())))
            .collect();
        for (dep, dependent) in edges {
            if let Some(dep_node) = nodes.get_mut(&dep) {
                dep_node.dependents.push(dependent);
            }
        }

        let topo_order = topological_order(&nodes)?;
        debug!(tasks = nodes.len(), ?topo_order, "task graph built");

        Ok(Self { nodes, topo_order })
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn contains(&self, id: &str) -> bool {
        self.nodes.contains_key(id)
    }

    /// All task ids, ascending.
    pub fn tasks(&self) -> impl Iterator<Item = &str> {
        self.nodes.keys().map(|s| s.as_str())
    }

    pub fn task(&self, id: &str) -> Option<&Task> {
        self.nodes.get(id).map(|n| &n.task)
    }

    /// Immediate dependencies of a task.
    pub fn dependencies_of(&self, id: &str) -> &[TaskId] {
        self.nodes
            .get(id)
            .map(|n| n.deps.as_slice())
            .unwrap_or(&[])
    }

    /// Immediate dependents of a task (tasks that list this one as a dependency).
    pub fn dependents_of(&self, id: &str) -> &[TaskId] {
        self.nodes
            .get(id)
            .map(|n| n.dependents.as_slice())
            .unwrap_or(&[])
    }

    /// Tasks with no dependencies.
    pub fn roots(&self) -> impl Iterator<Item = &str> {
        self.nodes
            .iter()
            .filter(|(_, n)| n.deps.is_empty())
            .map(|(id, _)| id.as_str())
    }

    /// A dependency-respecting order over every task.
    pub fn topological_order(&self) -> &[TaskId] {
        &self.topo_order
    }
}

fn topological_order(nodes: &BTreeMap<TaskId, DagNode>) -> Result<Vec<TaskId>, BuildError> {
    // Edge direction: dep -> task.
    let mut graph: DiGraphMap<&str, ()> = DiGraphMap::new();

    for name in nodes.keys() {
        graph.add_node(name.as_str());
    }
    for (name, node) in nodes.iter() {
        for dep in node.deps.iter() {
            graph.add_edge(dep.as_str(), name.as_str(), ());
        }
    }

    match toposort(&graph, None) {
        Ok(order) => Ok(order.into_iter().map(str::to_string).collect()),
        // Unreachable after `check_structure`, but keep the error typed.
        Err(cycle) => {
            let node = cycle.node_id().to_string();
            Err(BuildError::Cycle {
                cycle: vec![node.clone(), node],
            })
        }
    }
}
