// src/lib.rs

pub mod cli;
pub mod config;
pub mod dag;
pub mod engine;
pub mod errors;
pub mod exec;
pub mod logging;
pub mod report;
pub mod types;

use std::sync::Arc;

use anyhow::{Context, Result};
use tracing::{debug, info};

use crate::cli::CliArgs;
use crate::config::{FaultOverrides, PipelineFile, load_and_validate};
use crate::dag::{DagGraph, TaskState};
use crate::engine::{RunOptions, Runner, TracingObserver};
use crate::report::RunReport;

/// High-level entry point used by `main.rs`.
///
/// This wires together:
/// - pipeline loading and validation
/// - fault overrides from the command line
/// - graph building
/// - the runner, with a logging observer
/// - the summary (or JSON report) on stdout
///
/// Returns whether the run succeeded.
pub async fn run(args: CliArgs) -> Result<bool> {
    let config_path = args.config.clone();
    let pipeline = load_and_validate(&config_path)?;

    let faults = FaultOverrides {
        forced_failures: args.fail.iter().cloned().collect(),
        seed: args.seed,
    };
    let tasks = pipeline.to_tasks(&faults)?;
    let graph = DagGraph::build(tasks).context("building task graph")?;

    if args.dry_run {
        print_dry_run(&pipeline, &graph);
        return Ok(true);
    }

    let options = run_options(&pipeline, &args);
    info!(
        tasks = graph.len(),
        concurrency_limit = ?options.concurrency_limit,
        config = %config_path.display(),
        "starting run"
    );

    let report = Runner::new(graph, options).run().await;

    if args.json {
        let json = serde_json::to_string_pretty(&report).context("serializing run report")?;
        println!("{json}");
    } else {
        print_summary(&report);
    }

    Ok(report.overall_succeeded)
}

/// `[config]` values, with `--concurrency` taking precedence.
fn run_options(pipeline: &PipelineFile, args: &CliArgs) -> RunOptions {
    let concurrency_limit = args
        .concurrency
        .map(|n| usize::try_from(n).unwrap_or(usize::MAX))
        .or(pipeline.config.concurrency_limit);

    RunOptions {
        concurrency_limit,
        on_failure: pipeline.config.on_failure,
        observer: Some(Arc::new(TracingObserver)),
    }
}

/// Simple dry-run output: tasks in topological order with deps and timeouts.
fn print_dry_run(pipeline: &PipelineFile, graph: &DagGraph) {
    println!("dagrun dry-run");
    match pipeline.config.concurrency_limit {
        Some(n) => println!("  config.concurrency_limit = {n}"),
        None => println!("  config.concurrency_limit = unbounded"),
    }
    println!("  config.on_failure = {:?}", pipeline.config.on_failure);
    println!();

    println!("tasks ({}), in execution order:", graph.len());
    for id in graph.topological_order() {
        println!("  - {id}");
        let deps = graph.dependencies_of(id);
        if !deps.is_empty() {
            println!("      after: {deps:?}");
        }
        if let Some(tc) = pipeline.task.get(id) {
            println!("      duration: {}ms", tc.duration_ms);
            if let Some(ms) = tc.timeout_ms {
                println!("      timeout: {ms}ms");
            }
            if tc.fail {
                println!("      fail: true");
            } else if let Some(p) = tc.fail_probability {
                println!("      fail_probability: {p}");
            }
        }
    }

    debug!("dry-run complete (no execution)");
}

fn print_summary(report: &RunReport) {
    println!("tasks:");
    for (id, record) in &report.outcomes {
        match record.state {
            TaskState::Succeeded => match record.elapsed() {
                Some(elapsed) => println!("  {id}: succeeded in {}ms", elapsed.as_millis()),
                None => println!("  {id}: succeeded"),
            },
            TaskState::Failed => match &record.error {
                Some(err) => println!("  {id}: failed ({err})"),
                None => println!("  {id}: failed"),
            },
            TaskState::Skipped => match &record.blocked_by {
                Some(cause) => println!("  {id}: skipped (blocked by {cause})"),
                None => println!("  {id}: skipped"),
            },
            other => println!("  {id}: {other}"),
        }
    }

    println!();
    println!("finish order: {}", report.finish_order.join(" -> "));
    println!("total duration: {}ms", report.total_duration_ms());
    if report.overall_succeeded {
        println!("result: success");
    } else {
        println!("result: FAILED");
    }
}
