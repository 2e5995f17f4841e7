// src/errors.rs

//! Crate-wide error types.
//!
//! - [`BuildError`] is returned by the graph builder; a graph that fails
//!   validation is never usable.
//! - [`TaskError`] describes why a single task ended `Failed`. It is recorded
//!   in the run report and never aborts the run.
//! - [`DagrunError`] covers config loading and the CLI glue.

use serde::Serialize;
use thiserror::Error;

use crate::engine::TaskId;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum BuildError {
    #[error("duplicate task id '{id}'")]
    DuplicateId { id: TaskId },

    #[error("task '{task}' has unknown dependency '{dependency}'")]
    UnknownDependency { task: TaskId, dependency: TaskId },

    #[error("cycle detected in task graph: {}", cycle.join(" -> "))]
    Cycle {
        /// Ids along the cycle, with the first id repeated at the end.
        cycle: Vec<TaskId>,
    },
}

#[derive(Error, Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum TaskError {
    /// The executor returned an error (or panicked).
    #[error("task execution failed: {message}")]
    Execution { message: String },

    /// The executor did not settle within the task's timeout.
    #[error("task timed out after {after_ms}ms")]
    Timeout { after_ms: u64 },
}

impl TaskError {
    pub fn execution(err: &anyhow::Error) -> Self {
        TaskError::Execution {
            message: format!("{err:#}"),
        }
    }

    pub fn is_timeout(&self) -> bool {
        matches!(self, TaskError::Timeout { .. })
    }
}

#[derive(Error, Debug)]
pub enum DagrunError {
    #[error("Configuration error: {0}")]
    ConfigError(String),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("TOML parsing error: {0}")]
    TomlError(#[from] toml::de::Error),

    #[error("Invalid task graph: {0}")]
    Build(#[from] BuildError),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

pub use anyhow::Error;
pub type Result<T> = std::result::Result<T, DagrunError>;
