// src/dag/validate.rs

//! Structural checks shared by the graph builder and the config loader.
//!
//! Checks run in a fixed order and the first failure is reported:
//! duplicate ids, unknown dependencies, cycles.

use std::collections::{BTreeMap, BTreeSet};

use crate::engine::TaskId;
use crate::errors::BuildError;

/// Validate a set of `(id, dependencies)` pairs.
pub fn check_structure<'a, I, D>(nodes: I) -> Result<(), BuildError>
where
    I: IntoIterator<Item = (&'a str, D)>,
    D: IntoIterator<Item = &'a str>,
{
    let mut deps_of: BTreeMap<&'a str, BTreeSet<&'a str>> = BTreeMap::new();

    for (id, deps) in nodes {
        if deps_of.contains_key(id) {
            return Err(BuildError::DuplicateId { id: id.to_string() });
        }
        deps_of.insert(id, deps.into_iter().collect());
    }

    for (id, deps) in deps_of.iter() {
        for dep in deps {
            if !deps_of.contains_key(dep) {
                return Err(BuildError::UnknownDependency {
                    task: id.to_string(),
                    dependency: dep.to_string(),
                });
            }
        }
    }

    match find_cycle(&deps_of) {
        Some(cycle) => Err(BuildError::Cycle { cycle }),
        None => Ok(()),
    }
}

#[derive(Clone, Copy, PartialEq, Eq)]
enum Mark {
    Visiting,
    Done,
}

/// Depth-first search over the dependency relation.
///
/// Returns the first cycle found (roots visited in ascending id order), as
/// the sequence of ids along the dependency edges with the first id repeated
/// at the end, e.g. `["a", "b", "a"]` for `a -> b -> a`.
fn find_cycle(deps_of: &BTreeMap<&str, BTreeSet<&str>>) -> Option<Vec<TaskId>> {
    let mut marks: BTreeMap<&str, Mark> = BTreeMap::new();

    for &root in deps_of.keys() {
        if marks.contains_key(root) {
            continue;
        }

        // Explicit stack of (node, remaining deps) so deep chains don't
        // overflow the call stack.
        let mut path: Vec<&str> = Vec::new();
        let mut stack: Vec<(&str, Vec<&str>)> = Vec::new();

        marks.insert(root, Mark::Visiting);
        path.push(root);
        stack.push((root, children(deps_of, root)));

        while let Some((node, pending)) = stack.last_mut() {
            let node = *node;
            let Some(next) = pending.pop() else {
                marks.insert(node, Mark::Done);
                stack.pop();
                path.pop();
                continue;
            };

            match marks.get(next) {
                Some(Mark::Done) => {}
                Some(Mark::Visiting) => {
                    let start = path.iter().position(|n| *n == next).unwrap_or(0);
                    let mut cycle: Vec<TaskId> =
                        path[start..].iter().map(|n| n.to_string()).collect();
                    cycle.push(next.to_string());
                    return Some(cycle);
                }
                None => {
                    marks.insert(next, Mark::Visiting);
                    path.push(next);
                    stack.push((next, children(deps_of, next)));
                }
            }
        }
    }

    None
}

/// Dependencies of `node`, reversed so that popping yields ascending order.
fn children<'a>(deps_of: &BTreeMap<&'a str, BTreeSet<&'a str>>, node: &str) -> Vec<&'a str> {
    deps_of
        .get(node)
        .map(|deps| deps.iter().rev().copied().collect())
        .unwrap_or_default()
}
