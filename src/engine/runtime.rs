use std::collections::HashMap;
use std::fmt;
use std::panic::{self, AssertUnwindSafe};
use std::sync::Arc;

use tokio::sync::mpsc;
use tokio::task::JoinSet;
use tokio::time::Instant;
use tracing::{debug, error, info, warn};

use crate::dag::{DagGraph, Scheduler, TaskInputs};
use crate::engine::event_handlers::{Settled, handle_settled, inputs_for, start_run};
use crate::engine::{RunOptions, TaskEvent, TaskOutcome};
use crate::errors::TaskError;
use crate::exec::{Dispatch, run_task};
use crate::report::{ResultCollector, RunReport};

/// Runs a validated graph to completion.
///
/// This is the async IO shell around the pure [`Scheduler`]: it launches
/// every dispatched task as its own Tokio task, waits for the next one to
/// settle, and feeds the outcome back into the scheduler. The loop is the
/// single writer of task state; tasks only ever see the results of their own
/// dependencies.
///
/// Every state transition is published as a [`TaskEvent`] to the
/// [`ResultCollector`] (and to the optional observer), which turns the
/// stream into the returned [`RunReport`].
pub struct Runner {
    graph: Arc<DagGraph>,
    options: RunOptions,
}

impl fmt::Debug for Runner {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Runner")
            .field("tasks", &self.graph.len())
            .field("options", &self.options)
            .finish()
    }
}

impl Runner {
    pub fn new(graph: impl Into<Arc<DagGraph>>, options: RunOptions) -> Self {
        Self {
            graph: graph.into(),
            options,
        }
    }

    /// Execute the graph.
    ///
    /// Never fails: task errors and timeouts end up in the report.
    pub async fn run(self) -> RunReport {
        let (event_tx, event_rx) = mpsc::unbounded_channel::<TaskEvent>();

        let (report, ()) = tokio::join!(
            ResultCollector::collect_stream(event_rx),
            self.drive(event_tx),
        );

        info!(
            succeeded = report.overall_succeeded,
            total_ms = report.total_duration_ms(),
            finish_order = ?report.finish_order,
            "run finished"
        );
        report
    }

    /// Main scheduling loop. Dropping `event_tx` at the end closes the event
    /// stream and lets the collector finish.
    async fn drive(self, event_tx: mpsc::UnboundedSender<TaskEvent>) {
        let origin = Instant::now();
        let emitter = EventEmitter {
            tx: event_tx,
            options: &self.options,
        };

        let mut scheduler = Scheduler::new(Arc::clone(&self.graph));
        let mut outputs = TaskInputs::new();
        let mut join_set: JoinSet<Settled> = JoinSet::new();
        let mut running: HashMap<tokio::task::Id, String> = HashMap::new();

        info!(
            tasks = self.graph.len(),
            concurrency_limit = ?self.options.concurrency_limit,
            on_failure = ?self.options.on_failure,
            "run starting"
        );
        emitter.emit_all(start_run(&mut scheduler, origin.elapsed()));

        loop {
            for id in scheduler.next_dispatch(self.options.concurrency_limit) {
                let Some(task) = self.graph.task(&id) else {
                    error!(task = %id, "dispatched task missing from graph");
                    continue;
                };

                let dispatch = Dispatch {
                    id: id.clone(),
                    executor: task.executor(),
                    inputs: inputs_for(&scheduler, &outputs, &id),
                    timeout: task.timeout(),
                };

                emitter.emit(TaskEvent::running(id.clone(), origin.elapsed()));
                let handle = join_set.spawn(run_task(dispatch, origin));
                running.insert(handle.id(), id);
            }

            if scheduler.is_finished() {
                break;
            }

            let settled = match join_set.join_next_with_id().await {
                Some(Ok((task_id, settled))) => {
                    running.remove(&task_id);
                    settled
                }
                Some(Err(join_err)) => {
                    let Some(id) = running.remove(&join_err.id()) else {
                        error!(error = %join_err, "unknown task runner failed");
                        continue;
                    };
                    error!(task = %id, error = %join_err, "task runner failed");
                    Settled {
                        id,
                        outcome: TaskOutcome::Failed(TaskError::Execution {
                            message: format!("task runner failed: {join_err}"),
                        }),
                        finished_at: origin.elapsed(),
                    }
                }
                None => {
                    // Nothing in flight yet tasks remain: cannot happen with
                    // a validated graph, but never spin forever.
                    error!(
                        ready = scheduler.ready_len(),
                        "no tasks in flight but run not finished; stopping"
                    );
                    break;
                }
            };

            debug!(task = %settled.id, success = settled.outcome.is_success(), "task settled");
            emitter.emit_all(handle_settled(&mut scheduler, &mut outputs, settled));
        }
    }
}

/// Convenience wrapper: `Runner::new(graph, options).run()`.
pub async fn run(graph: impl Into<Arc<DagGraph>>, options: RunOptions) -> RunReport {
    Runner::new(graph, options).run().await
}

/// Publishes events to the collector and the optional observer.
struct EventEmitter<'a> {
    tx: mpsc::UnboundedSender<TaskEvent>,
    options: &'a RunOptions,
}

impl EventEmitter<'_> {
    fn emit(&self, event: TaskEvent) {
        if let Some(observer) = &self.options.observer {
            let notified = panic::catch_unwind(AssertUnwindSafe(|| observer.on_event(&event)));
            if notified.is_err() {
                warn!(task = %event.id, state = %event.state, "run observer panicked; event still recorded");
            }
        }
        if self.tx.send(event).is_err() {
            debug!("result collector dropped; event discarded");
        }
    }

    fn emit_all(&self, events: impl IntoIterator<Item = TaskEvent>) {
        for event in events {
            self.emit(event);
        }
    }
}
