// src/config/validate.rs

use crate::config::model::{PipelineFile, RawPipelineFile};
use crate::dag::validate::check_structure;
use crate::errors::{DagrunError, Result};

impl TryFrom<RawPipelineFile> for PipelineFile {
    type Error = DagrunError;

    fn try_from(raw: RawPipelineFile) -> std::result::Result<Self, Self::Error> {
        validate_raw_config(&raw)?;
        Ok(PipelineFile::new_unchecked(raw.config, raw.task))
    }
}

fn validate_raw_config(cfg: &RawPipelineFile) -> Result<()> {
    ensure_has_tasks(cfg)?;
    validate_global_config(cfg)?;
    validate_fault_settings(cfg)?;
    validate_dag(cfg)?;
    Ok(())
}

fn ensure_has_tasks(cfg: &RawPipelineFile) -> Result<()> {
    if cfg.task.is_empty() {
        return Err(DagrunError::ConfigError(
            "config must contain at least one [task.<id>] section".to_string(),
        ));
    }
    Ok(())
}

fn validate_global_config(cfg: &RawPipelineFile) -> Result<()> {
    if cfg.config.concurrency_limit == Some(0) {
        return Err(DagrunError::ConfigError(
            "[config].concurrency_limit must be >= 1 (got 0)".to_string(),
        ));
    }
    Ok(())
}

fn validate_fault_settings(cfg: &RawPipelineFile) -> Result<()> {
    for (name, task) in cfg.task.iter() {
        if let Some(p) = task.fail_probability
            && !(0.0..=1.0).contains(&p)
        {
            return Err(DagrunError::ConfigError(format!(
                "task '{name}' has fail_probability {p}; expected a value in 0.0..=1.0"
            )));
        }
        if task.timeout_ms == Some(0) {
            return Err(DagrunError::ConfigError(format!(
                "task '{name}' has timeout_ms = 0; omit it to disable the timeout"
            )));
        }
    }
    Ok(())
}

/// Unknown `after` references and cycles are reported with the same
/// [`BuildError`](crate::errors::BuildError) the graph builder uses.
fn validate_dag(cfg: &RawPipelineFile) -> Result<()> {
    check_structure(
        cfg.task
            .iter()
            .map(|(name, task)| (name.as_str(), task.after.iter().map(String::as_str))),
    )?;
    Ok(())
}
