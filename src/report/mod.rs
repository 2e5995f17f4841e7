// src/report/mod.rs

//! Run reports.
//!
//! - [`model`] defines [`RunReport`] and the per-task [`TaskRecord`].
//! - [`collector`] builds a report from the runner's lifecycle events.

pub mod collector;
pub mod model;

pub use collector::ResultCollector;
pub use model::{RunReport, TaskRecord};
