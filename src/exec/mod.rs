// src/exec/mod.rs

//! Task execution layer.
//!
//! - [`task_runner`] launches one dispatched task, enforcing its timeout and
//!   turning executor errors and panics into [`TaskError`](crate::errors::TaskError)s.
//! - [`simulated`] provides the timed, fault-injectable executor used by
//!   pipeline files and the CLI.

pub mod simulated;
pub mod task_runner;

pub use simulated::{FaultInjector, FaultPolicy, SimulatedStep};
pub use task_runner::{Dispatch, run_task};
