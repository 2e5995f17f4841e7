use serde::Deserialize;

/// What happens to the rest of the graph when a task fails.
///
/// - `StopDependents`: every transitive dependent of the failed task is
///   marked `Skipped` and never executed. Tasks with no path to the failed
///   task keep running to completion.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OnFailure {
    #[default]
    #[serde(alias = "stopDependents")]
    StopDependents,
}
