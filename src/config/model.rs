// src/config/model.rs

use std::collections::{BTreeMap, BTreeSet};
use std::time::Duration;

use serde::Deserialize;

use crate::dag::Task;
use crate::errors::{DagrunError, Result};
use crate::exec::{FaultInjector, FaultPolicy, SimulatedStep};
use crate::types::OnFailure;

/// Pipeline file as read from TOML, before validation.
///
/// ```toml
/// [config]
/// concurrency_limit = 2
/// on_failure = "stop_dependents"
///
/// [task.stock]
/// duration_ms = 700
/// fail_probability = 0.1
/// error = "insufficient stock"
/// output = { units = 23 }
///
/// [task.invoice]
/// after = ["stock"]
/// duration_ms = 500
/// timeout_ms = 2000
/// ```
///
/// All sections are optional and have reasonable defaults.
#[derive(Debug, Clone, Deserialize)]
pub struct RawPipelineFile {
    /// Run options from `[config]`.
    #[serde(default)]
    pub config: ConfigSection,

    /// All tasks from `[task.<id>]`.
    #[serde(default)]
    pub task: BTreeMap<String, TaskConfig>,
}

/// Validated pipeline file.
///
/// The only way to obtain one is via `TryFrom<RawPipelineFile>`, which runs
/// the checks in [`crate::config::validate`].
#[derive(Debug, Clone)]
pub struct PipelineFile {
    pub config: ConfigSection,
    pub task: BTreeMap<String, TaskConfig>,
}

impl PipelineFile {
    pub(crate) fn new_unchecked(config: ConfigSection, task: BTreeMap<String, TaskConfig>) -> Self {
        Self { config, task }
    }

    /// Turn every `[task.<id>]` into a [`Task`] backed by a [`SimulatedStep`].
    pub fn to_tasks(&self, faults: &FaultOverrides) -> Result<Vec<Task>> {
        for forced in &faults.forced_failures {
            if !self.task.contains_key(forced) {
                return Err(DagrunError::ConfigError(format!(
                    "cannot force failure of unknown task '{forced}'"
                )));
            }
        }

        let injector = FaultInjector::new(faults.seed);

        self.task
            .iter()
            .map(|(name, tc)| -> Result<Task> {
                let fault = if faults.forced_failures.contains(name) {
                    FaultPolicy::Always
                } else {
                    tc.fault_policy()
                };

                let output = match &tc.output {
                    Some(value) => serde_json::to_value(value).map_err(|e| {
                        DagrunError::ConfigError(format!(
                            "task '{name}' has an output that cannot be converted: {e}"
                        ))
                    })?,
                    None => serde_json::Value::Null,
                };

                let mut step = SimulatedStep::new(tc.duration(), injector.clone())
                    .with_fault(fault)
                    .with_output(output);
                if let Some(ref message) = tc.error {
                    step = step.with_error_message(message.clone());
                }

                let mut task = Task::new(name.clone(), step).depends_on(tc.after.iter().cloned());
                if let Some(timeout) = tc.timeout() {
                    task = task.with_timeout(timeout);
                }
                Ok(task)
            })
            .collect()
    }
}

/// Fault injection requested by the caller rather than by the file.
#[derive(Debug, Clone, Default)]
pub struct FaultOverrides {
    /// Tasks that must fail regardless of their own settings.
    pub forced_failures: BTreeSet<String>,
    /// Seed for probabilistic failures.
    pub seed: Option<u64>,
}

/// `[config]` section.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ConfigSection {
    /// Maximum number of tasks running at once. Unbounded if absent.
    #[serde(default)]
    pub concurrency_limit: Option<usize>,

    /// Only `"stop_dependents"` is supported.
    #[serde(default)]
    pub on_failure: OnFailure,
}

/// `[task.<id>]` section.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct TaskConfig {
    /// Dependency list: this task waits for all tasks listed here.
    #[serde(default)]
    pub after: Vec<String>,

    /// How long the simulated work takes.
    #[serde(default)]
    pub duration_ms: u64,

    /// Fail the task if it has not finished after this long.
    #[serde(default)]
    pub timeout_ms: Option<u64>,

    /// Always fail.
    #[serde(default)]
    pub fail: bool,

    /// Fail with this probability (`0.0..=1.0`). Ignored when `fail = true`.
    #[serde(default)]
    pub fail_probability: Option<f64>,

    /// Error message reported when the task fails.
    #[serde(default)]
    pub error: Option<String>,

    /// Value returned on success.
    #[serde(default)]
    pub output: Option<toml::Value>,
}

impl TaskConfig {
    pub fn duration(&self) -> Duration {
        Duration::from_millis(self.duration_ms)
    }

    pub fn timeout(&self) -> Option<Duration> {
        self.timeout_ms.map(Duration::from_millis)
    }

    pub fn fault_policy(&self) -> FaultPolicy {
        match (self.fail, self.fail_probability) {
            (true, _) => FaultPolicy::Always,
            (false, Some(p)) => FaultPolicy::Probability(p),
            (false, None) => FaultPolicy::Never,
        }
    }
}
