// tests/config_loading.rs

use std::io::Write;
use std::path::PathBuf;

use dagrun::config::{FaultOverrides, default_config_path, load_and_validate, load_from_str};
use dagrun::dag::{DagGraph, TaskState};
use dagrun::engine::{OnFailure, RunOptions, Runner};
use dagrun::errors::{BuildError, DagrunError};
use dagrun::exec::FaultPolicy;
use dagrun_test_utils::with_timeout;
use serde_json::json;
use tempfile::NamedTempFile;

fn write_config(contents: &str) -> NamedTempFile {
    let mut file = NamedTempFile::new().unwrap();
    write!(file, "{contents}").unwrap();
    file
}

fn demo(name: &str) -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("demos").join(name)
}

#[test]
fn loads_tasks_and_defaults() {
    let file = write_config(
        r#"
[config]
concurrency_limit = 2

[task.stock]
duration_ms = 700
fail_probability = 0.1
error = "insufficient stock"
output = { units = 23 }

[task.invoice]
after = ["stock"]
duration_ms = 500
timeout_ms = 2000
"#,
    );

    let cfg = load_and_validate(file.path()).unwrap();
    assert_eq!(cfg.config.concurrency_limit, Some(2));
    assert_eq!(cfg.config.on_failure, OnFailure::StopDependents);

    let stock = &cfg.task["stock"];
    assert_eq!(stock.duration_ms, 700);
    assert_eq!(stock.fault_policy(), FaultPolicy::Probability(0.1));
    assert_eq!(stock.error.as_deref(), Some("insufficient stock"));

    let invoice = &cfg.task["invoice"];
    assert_eq!(invoice.after, vec!["stock"]);
    assert_eq!(invoice.timeout_ms, Some(2000));
    assert_eq!(invoice.fault_policy(), FaultPolicy::Never);
}

#[test]
fn accepts_camel_case_failure_policy() {
    let raw = load_from_str(
        r#"
[config]
on_failure = "stopDependents"

[task.a]
"#,
    )
    .unwrap();
    assert_eq!(raw.config.on_failure, OnFailure::StopDependents);
}

#[test]
fn failure_policy_defaults_to_stop_dependents() {
    assert_eq!(OnFailure::default(), OnFailure::StopDependents);

    let raw = load_from_str("[task.a]\n").unwrap();
    assert_eq!(raw.config.on_failure, OnFailure::StopDependents);
    assert_eq!(RunOptions::default().on_failure, OnFailure::StopDependents);
}

#[test]
fn rejects_unsupported_failure_policy() {
    let result = load_from_str(
        r#"
[config]
on_failure = "continue"

[task.a]
"#,
    );
    assert!(matches!(result, Err(DagrunError::TomlError(_))));
}

#[test]
fn cycle_returns_structured_error() {
    let file = write_config(
        r#"
[task.A]
after = ["B"]

[task.B]
after = ["A"]
"#,
    );

    match load_and_validate(file.path()) {
        Err(DagrunError::Build(BuildError::Cycle { cycle })) => {
            assert_eq!(cycle, vec!["A", "B", "A"]);
        }
        Err(e) => panic!("expected cycle error, got: {e:?}"),
        Ok(_) => panic!("expected error, got Ok"),
    }
}

#[test]
fn unknown_dependency_returns_build_error() {
    let file = write_config(
        r#"
[task.A]
after = ["NonExistent"]
"#,
    );

    match load_and_validate(file.path()) {
        Err(DagrunError::Build(BuildError::UnknownDependency { task, dependency })) => {
            assert_eq!(task, "A");
            assert_eq!(dependency, "NonExistent");
        }
        other => panic!("expected unknown dependency, got: {other:?}"),
    }
}

#[test]
fn empty_pipeline_is_rejected() {
    let file = write_config("[config]\nconcurrency_limit = 1\n");
    match load_and_validate(file.path()) {
        Err(DagrunError::ConfigError(msg)) => assert!(msg.contains("at least one")),
        other => panic!("expected config error, got: {other:?}"),
    }
}

#[test]
fn zero_concurrency_is_rejected() {
    let file = write_config("[config]\nconcurrency_limit = 0\n\n[task.a]\n");
    match load_and_validate(file.path()) {
        Err(DagrunError::ConfigError(msg)) => assert!(msg.contains("concurrency_limit")),
        other => panic!("expected config error, got: {other:?}"),
    }
}

#[test]
fn out_of_range_probability_is_rejected() {
    let file = write_config("[task.a]\nfail_probability = 1.5\n");
    match load_and_validate(file.path()) {
        Err(DagrunError::ConfigError(msg)) => {
            assert!(msg.contains("'a'"));
            assert!(msg.contains("fail_probability"));
        }
        other => panic!("expected config error, got: {other:?}"),
    }
}

#[test]
fn zero_timeout_is_rejected() {
    let file = write_config("[task.a]\ntimeout_ms = 0\n");
    assert!(matches!(
        load_and_validate(file.path()),
        Err(DagrunError::ConfigError(_))
    ));
}

#[test]
fn missing_file_is_an_io_error() {
    let result = load_and_validate("/definitely/not/here/Dagrun.toml");
    assert!(matches!(result, Err(DagrunError::IoError(_))));
}

#[test]
fn malformed_toml_is_a_toml_error() {
    let file = write_config("[task.a\nduration_ms = 1\n");
    assert!(matches!(
        load_and_validate(file.path()),
        Err(DagrunError::TomlError(_))
    ));
}

#[test]
fn default_path_is_dagrun_toml() {
    assert_eq!(default_config_path(), PathBuf::from("Dagrun.toml"));
}

#[test]
fn forcing_an_unknown_task_is_rejected() {
    let cfg = load_and_validate(demo("sequential_queue.toml")).unwrap();
    let faults = FaultOverrides {
        forced_failures: ["request_9".to_string()].into(),
        seed: None,
    };
    match cfg.to_tasks(&faults) {
        Err(DagrunError::ConfigError(msg)) => assert!(msg.contains("request_9")),
        other => panic!("expected config error, got: {other:?}"),
    }
}

#[test]
fn every_demo_pipeline_is_valid() {
    for name in [
        "sequential_queue.toml",
        "parallel_deliveries.toml",
        "parallel_validation.toml",
        "order_pipeline.toml",
        "service_fan_in.toml",
    ] {
        let cfg = load_and_validate(demo(name))
            .unwrap_or_else(|e| panic!("{name} failed to load: {e}"));
        let tasks = cfg.to_tasks(&FaultOverrides::default()).unwrap();
        DagGraph::build(tasks).unwrap_or_else(|e| panic!("{name} failed to build: {e}"));
    }
}

#[tokio::test(start_paused = true)]
async fn order_pipeline_runs_with_seeded_faults_disabled() {
    let cfg = load_and_validate(demo("order_pipeline.toml")).unwrap();

    // Seed 0 may or may not trip the 10% stock failure; forcing a different
    // task keeps the expectation independent of the draw.
    let faults = FaultOverrides {
        forced_failures: ["invoice".to_string()].into(),
        seed: Some(0),
    };
    let graph = DagGraph::build(cfg.to_tasks(&faults).unwrap()).unwrap();
    let report = with_timeout(Runner::new(graph, RunOptions::default()).run()).await;

    assert!(!report.overall_succeeded);
    if report.state_of("stock") == Some(TaskState::Succeeded) {
        assert_eq!(report.state_of("invoice"), Some(TaskState::Failed));
        assert_eq!(report.state_of("recommendations"), Some(TaskState::Succeeded));

        let costs = report.outcome("costs").unwrap().result.clone().unwrap();
        assert_eq!(costs["task"], json!("costs"));
        assert_eq!(costs["inputs"], json!(["stock"]));
        assert_eq!(costs["output"]["shipping"], json!(4.5));
    } else {
        assert_eq!(report.state_of("costs"), Some(TaskState::Skipped));
        assert_eq!(report.state_of("invoice"), Some(TaskState::Skipped));
    }
}

#[tokio::test(start_paused = true)]
async fn service_fan_in_finishes_when_slowest_branch_does() {
    let cfg = load_and_validate(demo("service_fan_in.toml")).unwrap();
    let graph = DagGraph::build(cfg.to_tasks(&FaultOverrides::default()).unwrap()).unwrap();
    let report = with_timeout(Runner::new(graph, RunOptions::default()).run()).await;

    assert!(report.overall_succeeded);
    // D starts when C (800ms) finishes and takes 400ms; A ends at 1000ms.
    let total = report.total_duration.as_millis();
    assert!((1200..1205).contains(&total), "total was {total}ms");
    assert_eq!(
        report.finish_order,
        vec!["service_b", "service_c", "service_a", "service_d"]
    );
}

#[tokio::test(start_paused = true)]
async fn forced_validation_failure_blocks_submit() {
    let cfg = load_and_validate(demo("parallel_validation.toml")).unwrap();
    let faults = FaultOverrides {
        forced_failures: ["check_email".to_string()].into(),
        seed: None,
    };
    let graph = DagGraph::build(cfg.to_tasks(&faults).unwrap()).unwrap();
    let options = RunOptions {
        concurrency_limit: cfg.config.concurrency_limit,
        ..RunOptions::default()
    };
    let report = with_timeout(Runner::new(graph, options).run()).await;

    let email = report.outcome("check_email").unwrap();
    assert_eq!(email.state, TaskState::Failed);
    assert_eq!(
        email.error.as_ref().unwrap().to_string(),
        "task execution failed: email address is malformed"
    );
    assert_eq!(report.state_of("check_name"), Some(TaskState::Succeeded));
    assert_eq!(report.state_of("check_age"), Some(TaskState::Succeeded));
    assert_eq!(report.state_of("submit"), Some(TaskState::Skipped));
}
