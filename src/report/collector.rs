// src/report/collector.rs

//! Folds the runner's event stream into a [`RunReport`].
//!
//! This is the only place that derives `finish_order` and `total_duration`.

use std::collections::BTreeMap;
use std::time::Duration;

use tokio::sync::mpsc;
use tracing::{debug, warn};

use crate::dag::TaskState;
use crate::engine::{EventDetail, TaskEvent, TaskId};
use crate::report::model::{RunReport, TaskRecord};

#[derive(Debug, Default)]
pub struct ResultCollector {
    records: BTreeMap<TaskId, TaskRecord>,
    events_seen: usize,
}

impl ResultCollector {
    pub fn new() -> Self {
        Self::default()
    }

    /// Fold a complete event sequence into a report.
    pub fn collect(events: impl IntoIterator<Item = TaskEvent>) -> RunReport {
        let mut collector = Self::new();
        for event in events {
            collector.record(event);
        }
        collector.finish()
    }

    /// Consume events until every sender is dropped, then build the report.
    pub async fn collect_stream(mut rx: mpsc::UnboundedReceiver<TaskEvent>) -> RunReport {
        let mut collector = Self::new();
        while let Some(event) = rx.recv().await {
            collector.record(event);
        }
        debug!(events = collector.events_seen, "event stream closed");
        collector.finish()
    }

    pub fn record(&mut self, event: TaskEvent) {
        self.events_seen += 1;

        let TaskEvent {
            id,
            state,
            at,
            detail,
        } = event;
        let record = self.records.entry(id).or_insert_with(TaskRecord::pending);

        if record.state.is_terminal() {
            warn!(?state, previous = ?record.state, "event after terminal state; ignoring");
            return;
        }
        record.state = state;

        match (state, detail) {
            (TaskState::Running, _) => record.started_at = Some(at),
            (TaskState::Succeeded, EventDetail::Result(value)) => {
                record.result = Some(value);
                record.finished_at = Some(at);
            }
            (TaskState::Failed, EventDetail::Error(err)) => {
                record.error = Some(err);
                record.finished_at = Some(at);
            }
            (TaskState::Succeeded | TaskState::Failed, _) => record.finished_at = Some(at),
            (TaskState::Skipped, EventDetail::BlockedBy(cause)) => record.blocked_by = Some(cause),
            _ => {}
        }
    }

    pub fn finish(self) -> RunReport {
        let mut finished: Vec<(Duration, &TaskId)> = self
            .records
            .iter()
            .filter_map(|(id, r)| r.finished_at.map(|at| (at, id)))
            .collect();
        finished.sort();
        let finish_order: Vec<TaskId> = finished.iter().map(|(_, id)| (*id).clone()).collect();

        let first_start = self.records.values().filter_map(|r| r.started_at).min();
        let last_finish = finished.last().map(|(at, _)| *at);
        let total_duration = match (first_start, last_finish) {
            (Some(start), Some(end)) => end.saturating_sub(start),
            _ => Duration::ZERO,
        };

        let overall_succeeded = !self
            .records
            .values()
            .any(|r| r.state == TaskState::Failed);

        RunReport {
            outcomes: self.records,
            finish_order,
            total_duration,
            overall_succeeded,
        }
    }
}
