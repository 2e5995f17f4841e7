// src/exec/simulated.rs

//! Simulated work with explicit fault injection.
//!
//! Pipeline files describe steps by how long they take, what they return,
//! and whether they fail. There is no global "force failure" switch: every
//! step carries its own [`FaultPolicy`], and probabilistic failures draw from
//! a [`FaultInjector`] that can be seeded for reproducible runs.

use std::sync::{Arc, Mutex};
use std::time::Duration;

use anyhow::anyhow;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde_json::{Value, json};

use crate::dag::{ExecFuture, TaskContext, TaskExecutor};

/// When a simulated step fails.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum FaultPolicy {
    Never,
    Always,
    /// Fail with the given probability in `0.0..=1.0`.
    Probability(f64),
}

/// Shared source of randomness for probabilistic faults.
#[derive(Debug, Clone)]
pub struct FaultInjector {
    rng: Arc<Mutex<StdRng>>,
}

impl FaultInjector {
    /// `Some(seed)` makes every probabilistic decision reproducible.
    pub fn new(seed: Option<u64>) -> Self {
        let rng = match seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };
        Self {
            rng: Arc::new(Mutex::new(rng)),
        }
    }

    pub fn should_fail(&self, policy: FaultPolicy) -> bool {
        match policy {
            FaultPolicy::Never => false,
            FaultPolicy::Always => true,
            FaultPolicy::Probability(p) if p.is_nan() => false,
            FaultPolicy::Probability(p) => {
                let mut rng = self.rng.lock().unwrap_or_else(|poisoned| poisoned.into_inner());
                rng.gen_bool(p.clamp(0.0, 1.0))
            }
        }
    }
}

impl Default for FaultInjector {
    fn default() -> Self {
        Self::new(None)
    }
}

/// A step that waits for `duration`, then succeeds or fails per its policy.
///
/// On success the result is
/// `{ "task": <id>, "output": <output>, "inputs": [<dependency ids>] }`.
#[derive(Debug, Clone)]
pub struct SimulatedStep {
    pub duration: Duration,
    pub fault: FaultPolicy,
    pub error_message: String,
    pub output: Value,
    injector: FaultInjector,
}

impl SimulatedStep {
    pub fn new(duration: Duration, injector: FaultInjector) -> Self {
        Self {
            duration,
            fault: FaultPolicy::Never,
            error_message: "simulated failure".to_string(),
            output: Value::Null,
            injector,
        }
    }

    pub fn with_fault(mut self, fault: FaultPolicy) -> Self {
        self.fault = fault;
        self
    }

    pub fn with_error_message(mut self, message: impl Into<String>) -> Self {
        self.error_message = message.into();
        self
    }

    pub fn with_output(mut self, output: Value) -> Self {
        self.output = output;
        self
    }
}

impl TaskExecutor for SimulatedStep {
    fn execute(&self, ctx: TaskContext) -> ExecFuture {
        let step = self.clone();

        Box::pin(async move {
            tokio::select! {
                _ = tokio::time::sleep(step.duration) => {}
                _ = ctx.cancelled() => {
                    return Err(anyhow!("step '{}' cancelled before completing", ctx.id));
                }
            }

            if step.injector.should_fail(step.fault) {
                return Err(anyhow!("{}", step.error_message));
            }

            let inputs: Vec<&String> = ctx.inputs.keys().collect();
            Ok(json!({
                "task": ctx.id,
                "output": step.output,
                "inputs": inputs,
            }))
        })
    }
}
