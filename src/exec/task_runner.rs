// src/exec/task_runner.rs

//! Runs a single dispatched task.

use std::sync::Arc;
use std::time::Duration;

use tokio::time::Instant;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, warn};

use crate::dag::{TaskContext, TaskExecutor, TaskInputs};
use crate::engine::{Settled, TaskId, TaskOutcome};
use crate::errors::TaskError;

/// Everything needed to launch one task.
pub struct Dispatch {
    pub id: TaskId,
    pub executor: Arc<dyn TaskExecutor>,
    pub inputs: TaskInputs,
    pub timeout: Option<Duration>,
}

/// Run a task's executor to completion (or timeout) and report how it settled.
///
/// The executor future is spawned as its own Tokio task. When the timeout
/// elapses first, the task's cancellation token is cancelled and the spawned
/// work is detached, not aborted: it keeps running until it notices the
/// token or finishes on its own, and its eventual result is discarded.
///
/// Finish offsets are measured against `origin`, the run's start instant.
pub async fn run_task(dispatch: Dispatch, origin: Instant) -> Settled {
    let Dispatch {
        id,
        executor,
        inputs,
        timeout,
    } = dispatch;

    let cancel = CancellationToken::new();
    let ctx = TaskContext {
        id: id.clone(),
        inputs,
        cancel: cancel.clone(),
    };

    debug!(
        task = %id,
        timeout_ms = timeout.map(|t| u64::try_from(t.as_millis()).unwrap_or(u64::MAX)),
        "starting task executor"
    );

    let work = tokio::spawn(executor.execute(ctx));

    let joined = match timeout {
        Some(limit) => match tokio::time::timeout(limit, work).await {
            Ok(joined) => joined,
            Err(_) => {
                cancel.cancel();
                let after_ms = u64::try_from(limit.as_millis()).unwrap_or(u64::MAX);
                warn!(
                    task = %id,
                    after_ms,
                    "task exceeded its timeout; cancellation signalled, work detached"
                );
                return Settled {
                    id,
                    outcome: TaskOutcome::Failed(TaskError::Timeout { after_ms }),
                    finished_at: origin.elapsed(),
                };
            }
        },
        None => work.await,
    };

    let outcome = match joined {
        Ok(Ok(value)) => TaskOutcome::Success(value),
        Ok(Err(err)) => {
            debug!(task = %id, error = %format!("{err:#}"), "executor returned an error");
            TaskOutcome::Failed(TaskError::execution(&err))
        }
        Err(join_err) => {
            error!(task = %id, error = %join_err, "executor did not complete");
            let message = if join_err.is_panic() {
                format!("executor panicked: {join_err}")
            } else {
                format!("executor was cancelled: {join_err}")
            };
            TaskOutcome::Failed(TaskError::Execution { message })
        }
    };

    Settled {
        id,
        outcome,
        finished_at: origin.elapsed(),
    }
}
