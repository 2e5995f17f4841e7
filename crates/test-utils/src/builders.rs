#![allow(dead_code)]

use std::time::Duration;

use anyhow::anyhow;
use dagrun::dag::Task;
use serde_json::{Value, json};

use crate::recording::InvocationLog;

/// Builder for closure-backed [`Task`]s to simplify test setup.
///
/// The built executor records its invocation (if a log is attached), sleeps
/// for the configured duration, then either fails or returns a value. The
/// default value is `{"task": <id>, "inputs": {<dep>: <result>}}` so tests
/// can check exactly what was passed in.
#[derive(Debug, Clone)]
pub struct TaskSpecBuilder {
    id: String,
    deps: Vec<String>,
    duration: Duration,
    timeout: Option<Duration>,
    failure: Option<String>,
    output: Option<Value>,
    log: Option<InvocationLog>,
}

impl TaskSpecBuilder {
    pub fn new(id: &str) -> Self {
        Self {
            id: id.to_string(),
            deps: Vec::new(),
            duration: Duration::ZERO,
            timeout: None,
            failure: None,
            output: None,
            log: None,
        }
    }

    pub fn after(mut self, dep: &str) -> Self {
        self.deps.push(dep.to_string());
        self
    }

    pub fn after_all(mut self, deps: &[&str]) -> Self {
        self.deps.extend(deps.iter().map(|d| d.to_string()));
        self
    }

    pub fn sleep_ms(mut self, ms: u64) -> Self {
        self.duration = Duration::from_millis(ms);
        self
    }

    pub fn timeout_ms(mut self, ms: u64) -> Self {
        self.timeout = Some(Duration::from_millis(ms));
        self
    }

    pub fn fails_with(mut self, message: &str) -> Self {
        self.failure = Some(message.to_string());
        self
    }

    pub fn returns(mut self, value: Value) -> Self {
        self.output = Some(value);
        self
    }

    pub fn logged_to(mut self, log: &InvocationLog) -> Self {
        self.log = Some(log.clone());
        self
    }

    pub fn build(self) -> Task {
        let Self {
            id,
            deps,
            duration,
            timeout,
            failure,
            output,
            log,
        } = self;

        let mut task = Task::from_fn(id, move |ctx| {
            let failure = failure.clone();
            let output = output.clone();
            let log = log.clone();
            async move {
                if let Some(log) = &log {
                    log.record(&ctx.id);
                }
                tokio::time::sleep(duration).await;
                if let Some(message) = failure {
                    return Err(anyhow!(message));
                }
                Ok(output.unwrap_or_else(|| json!({ "task": ctx.id, "inputs": ctx.inputs })))
            }
        })
        .depends_on(deps);

        if let Some(timeout) = timeout {
            task = task.with_timeout(timeout);
        }
        task
    }
}

/// Task that sleeps for `ms` and then succeeds.
pub fn sleeper(id: &str, ms: u64, deps: &[&str]) -> Task {
    TaskSpecBuilder::new(id).sleep_ms(ms).after_all(deps).build()
}

/// Task that fails immediately.
pub fn failing(id: &str, deps: &[&str]) -> Task {
    TaskSpecBuilder::new(id)
        .after_all(deps)
        .fails_with(&format!("{id} failed"))
        .build()
}
