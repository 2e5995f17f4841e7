// src/dag/task.rs

//! Task descriptors handed to the graph builder.

use std::collections::{BTreeMap, BTreeSet};
use std::fmt;
use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;
use std::time::Duration;

use serde_json::Value;
use tokio_util::sync::CancellationToken;

use crate::engine::TaskId;

/// Results of a task's declared dependencies, keyed by dependency id.
pub type TaskInputs = BTreeMap<TaskId, Value>;

/// Future returned by a [`TaskExecutor`].
pub type ExecFuture = Pin<Box<dyn Future<Output = anyhow::Result<Value>> + Send + 'static>>;

/// Everything an executor gets to see when it is invoked.
///
/// A task never observes sibling state: `inputs` holds only the results of
/// the tasks listed in its own `depends_on`.
#[derive(Debug, Clone)]
pub struct TaskContext {
    pub id: TaskId,
    pub inputs: TaskInputs,
    /// Cancelled when the task's timeout expires. Honouring it is up to the
    /// executor; the scheduler does not abort running work.
    pub cancel: CancellationToken,
}

impl TaskContext {
    pub fn input(&self, dep: &str) -> Option<&Value> {
        self.inputs.get(dep)
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancel.is_cancelled()
    }

    /// Resolves once the scheduler has given up on this task.
    pub async fn cancelled(&self) {
        self.cancel.cancelled().await
    }
}

/// The unit of work behind a task.
///
/// Any error is treated the same way: the task ends `Failed` and its
/// dependents are skipped.
pub trait TaskExecutor: Send + Sync + 'static {
    fn execute(&self, ctx: TaskContext) -> ExecFuture;
}

/// Adapter so plain async closures can be used as executors.
struct FnExecutor<F>(F);

impl<F, Fut> TaskExecutor for FnExecutor<F>
where
    F: Fn(TaskContext) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = anyhow::Result<Value>> + Send + 'static,
{
    fn execute(&self, ctx: TaskContext) -> ExecFuture {
        Box::pin((self.0)(ctx))
    }
}

/// A named unit of work with declared dependencies.
#[derive(Clone)]
pub struct Task {
    id: TaskId,
    depends_on: BTreeSet<TaskId>,
    executor: Arc<dyn TaskExecutor>,
    timeout: Option<Duration>,
}

impl Task {
    pub fn new(id: impl Into<TaskId>, executor: impl TaskExecutor) -> Self {
        Self {
            id: id.into(),
            depends_on: BTreeSet::new(),
            executor: Arc::new(executor),
            timeout: None,
        }
    }

    /// Build a task from an async closure.
    ///
    /// ```
    /// use dagrun::dag::Task;
    ///
    /// let task = Task::from_fn("fetch", |_ctx| async { Ok(serde_json::json!(42)) });
    /// assert_eq!(task.id(), "fetch");
    /// ```
    pub fn from_fn<F, Fut>(id: impl Into<TaskId>, f: F) -> Self
    where
        F: Fn(TaskContext) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = anyhow::Result<Value>> + Send + 'static,
    {
        Self::new(id, FnExecutor(f))
    }

    /// Add a single dependency.
    pub fn after(mut self, dep: impl Into<TaskId>) -> Self {
        self.depends_on.insert(dep.into());
        self
    }

    /// Add several dependencies at once.
    pub fn depends_on<I, S>(mut self, deps: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<TaskId>,
    {
        self.depends_on.extend(deps.into_iter().map(Into::into));
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn dependencies(&self) -> &BTreeSet<TaskId> {
        &self.depends_on
    }

    pub fn timeout(&self) -> Option<Duration> {
        self.timeout
    }

    pub fn executor(&self) -> Arc<dyn TaskExecutor> {
        Arc::clone(&self.executor)
    }
}

impl fmt::Debug for Task {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Task")
            .field("id", &self.id)
            .field("depends_on", &self.depends_on)
            .field("timeout", &self.timeout)
            .finish_non_exhaustive()
    }
}
