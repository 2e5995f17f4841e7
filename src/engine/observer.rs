// src/engine/observer.rs

//! Lifecycle observers.
//!
//! Observers see every [`TaskEvent`] as the runner emits it. They are
//! advisory: nothing they do affects scheduling or the final report.

use tracing::{debug, info, warn};

use crate::dag::TaskState;
use crate::engine::{EventDetail, TaskEvent};

pub trait RunObserver: Send + Sync {
    fn on_event(&self, event: &TaskEvent);
}

/// Logs task start, finish, failure and skip through `tracing`.
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingObserver;

impl RunObserver for TracingObserver {
    fn on_event(&self, event: &TaskEvent) {
        let at_ms = event.at.as_millis();
        match (&event.state, &event.detail) {
            (TaskState::Running, _) => {
                info!(task = %event.id, at_ms, "task started");
            }
            (TaskState::Succeeded, _) => {
                info!(task = %event.id, at_ms, "task succeeded");
            }
            (TaskState::Failed, EventDetail::Error(err)) => {
                warn!(task = %event.id, at_ms, error = %err, "task failed");
            }
            (TaskState::Skipped, EventDetail::BlockedBy(cause)) => {
                warn!(task = %event.id, at_ms, blocked_by = %cause, "task skipped");
            }
            (state, _) => {
                debug!(task = %event.id, at_ms, ?state, "task state changed");
            }
        }
    }
}
