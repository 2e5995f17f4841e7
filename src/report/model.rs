// src/report/model.rs

use std::collections::BTreeMap;
use std::time::Duration;

use serde::{Serialize, Serializer};
use serde_json::Value;

use crate::dag::TaskState;
use crate::engine::TaskId;
use crate::errors::TaskError;

/// Final record for one task.
///
/// Offsets are measured from the start of the run.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TaskRecord {
    pub state: TaskState,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub result: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<TaskError>,
    /// For skipped tasks: the failed task that blocked them.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub blocked_by: Option<TaskId>,
    #[serde(rename = "started_at_ms", serialize_with = "opt_millis")]
    pub started_at: Option<Duration>,
    #[serde(rename = "finished_at_ms", serialize_with = "opt_millis")]
    pub finished_at: Option<Duration>,
}

impl TaskRecord {
    pub fn pending() -> Self {
        Self {
            state: TaskState::Pending,
            result: None,
            error: None,
            blocked_by: None,
            started_at: None,
            finished_at: None,
        }
    }

    /// Wall time between dispatch and settlement, if the task ran.
    pub fn elapsed(&self) -> Option<Duration> {
        Some(self.finished_at?.saturating_sub(self.started_at?))
    }
}

/// Consolidated outcome of one run. Immutable once returned.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RunReport {
    pub outcomes: BTreeMap<TaskId, TaskRecord>,
    /// Executed tasks ordered by finish offset, ties broken by ascending id.
    /// Skipped tasks never finish and are not listed.
    pub finish_order: Vec<TaskId>,
    #[serde(rename = "total_duration_ms", serialize_with = "millis")]
    pub total_duration: Duration,
    /// `true` iff no task ended `Failed`.
    pub overall_succeeded: bool,
}

impl RunReport {
    pub fn outcome(&self, id: &str) -> Option<&TaskRecord> {
        self.outcomes.get(id)
    }

    pub fn state_of(&self, id: &str) -> Option<TaskState> {
        self.outcomes.get(id).map(|r| r.state)
    }

    pub fn total_duration_ms(&self) -> u128 {
        self.total_duration.as_millis()
    }

    /// Ids in the given state, ascending.
    pub fn ids_in_state(&self, state: TaskState) -> Vec<&str> {
        self.outcomes
            .iter()
            .filter(|(_, r)| r.state == state)
            .map(|(id, _)| id.as_str())
            .collect()
    }
}

fn millis<S: Serializer>(d: &Duration, s: S) -> Result<S::Ok, S::Error> {
    s.serialize_f64(d.as_secs_f64() * 1000.0)
}

fn opt_millis<S: Serializer>(d: &Option<Duration>, s: S) -> Result<S::Ok, S::Error> {
    match d {
        Some(d) => millis(d, s),
        None => s.serialize_none(),
    }
}
