// tests/scheduler_steps.rs

//! Drives the pure scheduler by hand, without Tokio.

use std::sync::Arc;

use dagrun::dag::{DagGraph, Scheduler, SchedulerStep, TaskState};
use dagrun::engine::TaskOutcome;
use dagrun::errors::TaskError;
use dagrun_test_utils::sleeper;
use serde_json::json;

fn scheduler(tasks: Vec<dagrun::dag::Task>) -> Scheduler {
    Scheduler::new(Arc::new(DagGraph::build(tasks).unwrap()))
}

fn ok() -> TaskOutcome {
    TaskOutcome::Success(json!(null))
}

fn boom() -> TaskOutcome {
    TaskOutcome::Failed(TaskError::Execution {
        message: "boom".into(),
    })
}

#[test]
fn start_marks_only_roots_ready() {
    let mut s = scheduler(vec![
        sleeper("a", 1, &[]),
        sleeper("b", 1, &[]),
        sleeper("c", 1, &["a", "b"]),
    ]);

    let step = s.start();
    assert_eq!(step.newly_ready, vec!["a", "b"]);
    assert!(!step.run_just_finished);
    assert_eq!(s.state_of("c"), Some(TaskState::Pending));
    assert_eq!(s.ready_len(), 2);

    // A second start is ignored.
    assert_eq!(s.start(), SchedulerStep::default());
}

#[test]
fn dependent_waits_for_all_dependencies() {
    let mut s = scheduler(vec![
        sleeper("a", 1, &[]),
        sleeper("b", 1, &[]),
        sleeper("c", 1, &["a", "b"]),
    ]);
    s.start();
    assert_eq!(s.next_dispatch(None), vec!["a", "b"]);
    assert_eq!(s.in_flight(), 2);

    let step = s.step_completion("a", &ok());
    assert!(step.newly_ready.is_empty());
    assert_eq!(s.deps_satisfied("c"), Some(false));

    let step = s.step_completion("b", &ok());
    assert_eq!(step.newly_ready, vec!["c"]);
    assert_eq!(s.deps_satisfied("c"), Some(true));
    assert_eq!(s.state_of("c"), Some(TaskState::Ready));

    assert_eq!(s.next_dispatch(None), vec!["c"]);
    let step = s.step_completion("c", &ok());
    assert!(step.run_just_finished);
    assert!(s.is_finished());
}

#[test]
fn failure_skips_transitive_dependents_only() {
    // a -> b -> d, c independent
    let mut s = scheduler(vec![
        sleeper("a", 1, &[]),
        sleeper("b", 1, &["a"]),
        sleeper("c", 1, &[]),
        sleeper("d", 1, &["b"]),
    ]);
    s.start();
    assert_eq!(s.next_dispatch(None), vec!["a", "c"]);

    let step = s.step_completion("a", &boom());
    assert_eq!(step.newly_skipped, vec!["b", "d"]);
    assert!(step.newly_ready.is_empty());
    assert!(!step.run_just_finished);

    assert_eq!(s.state_of("a"), Some(TaskState::Failed));
    assert_eq!(s.state_of("b"), Some(TaskState::Skipped));
    assert_eq!(s.state_of("d"), Some(TaskState::Skipped));
    assert_eq!(s.blocked_by("d"), Some("a"));
    assert_eq!(s.state_of("c"), Some(TaskState::Running));

    let step = s.step_completion("c", &ok());
    assert!(step.run_just_finished);
}

#[test]
fn skipped_task_is_never_dispatched_even_if_another_dependency_succeeds() {
    // c depends on a (fails) and b (succeeds later)
    let mut s = scheduler(vec![
        sleeper("a", 1, &[]),
        sleeper("b", 1, &[]),
        sleeper("c", 1, &["a", "b"]),
    ]);
    s.start();
    s.next_dispatch(None);

    s.step_completion("a", &boom());
    assert_eq!(s.state_of("c"), Some(TaskState::Skipped));

    let step = s.step_completion("b", &ok());
    assert!(step.newly_ready.is_empty());
    assert!(s.next_dispatch(None).is_empty());
    assert!(s.is_finished());
}

#[test]
fn dispatch_respects_limit_and_ascending_id_order() {
    let mut s = scheduler(vec![
        sleeper("c", 1, &[]),
        sleeper("a", 1, &[]),
        sleeper("b", 1, &[]),
    ]);
    s.start();

    assert_eq!(s.next_dispatch(Some(2)), vec!["a", "b"]);
    assert!(s.next_dispatch(Some(2)).is_empty());

    s.step_completion("b", &ok());
    assert_eq!(s.next_dispatch(Some(2)), vec!["c"]);
}

#[test]
fn zero_limit_behaves_like_one() {
    let mut s = scheduler(vec![sleeper("a", 1, &[]), sleeper("b", 1, &[])]);
    s.start();
    assert_eq!(s.next_dispatch(Some(0)), vec!["a"]);
    assert!(s.next_dispatch(Some(0)).is_empty());
}

#[test]
fn completion_for_task_not_running_is_ignored() {
    let mut s = scheduler(vec![sleeper("a", 1, &[]), sleeper("b", 1, &["a"])]);
    s.start();

    // "a" is Ready, not Running.
    assert_eq!(s.step_completion("a", &ok()), SchedulerStep::default());
    assert_eq!(s.state_of("a"), Some(TaskState::Ready));

    assert_eq!(s.step_completion("ghost", &ok()), SchedulerStep::default());

    s.next_dispatch(None);
    s.step_completion("a", &ok());
    // Duplicate settlement does nothing.
    assert_eq!(s.step_completion("a", &boom()), SchedulerStep::default());
    assert_eq!(s.state_of("a"), Some(TaskState::Succeeded));
    assert_eq!(s.state_of("b"), Some(TaskState::Ready));
}

#[test]
fn empty_graph_is_finished_immediately() {
    let mut s = scheduler(Vec::new());
    let step = s.start();
    assert!(step.run_just_finished);
    assert!(s.is_finished());
}
