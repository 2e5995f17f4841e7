// tests/result_collector.rs

use std::time::Duration;

use dagrun::dag::TaskState;
use dagrun::engine::TaskEvent;
use dagrun::errors::TaskError;
use dagrun::report::ResultCollector;
use serde_json::json;

fn ms(n: u64) -> Duration {
    Duration::from_millis(n)
}

#[test]
fn folds_events_into_report() {
    let events = vec![
        TaskEvent::pending("a", ms(0)),
        TaskEvent::pending("b", ms(0)),
        TaskEvent::pending("c", ms(0)),
        TaskEvent::ready("a", ms(0)),
        TaskEvent::running("a", ms(5)),
        TaskEvent::failed(
            "a",
            ms(25),
            TaskError::Execution {
                message: "nope".into(),
            },
        ),
        TaskEvent::skipped("b", ms(25), "a"),
        TaskEvent::ready("c", ms(0)),
        TaskEvent::running("c", ms(5)),
        TaskEvent::succeeded("c", ms(40), json!(7)),
    ];

    let report = ResultCollector::collect(events);

    assert!(!report.overall_succeeded);
    assert_eq!(report.finish_order, vec!["a", "c"]);
    assert_eq!(report.total_duration, ms(35));

    let a = report.outcome("a").unwrap();
    assert_eq!(a.state, TaskState::Failed);
    assert_eq!(a.elapsed(), Some(ms(20)));

    let b = report.outcome("b").unwrap();
    assert_eq!(b.state, TaskState::Skipped);
    assert_eq!(b.blocked_by.as_deref(), Some("a"));
    assert_eq!(b.elapsed(), None);

    assert_eq!(report.outcome("c").unwrap().result, Some(json!(7)));
}

#[test]
fn ties_in_finish_time_break_by_id() {
    let report = ResultCollector::collect(vec![
        TaskEvent::running("y", ms(0)),
        TaskEvent::running("x", ms(0)),
        TaskEvent::succeeded("y", ms(10), json!(null)),
        TaskEvent::succeeded("x", ms(10), json!(null)),
    ]);
    assert_eq!(report.finish_order, vec!["x", "y"]);
    assert!(report.overall_succeeded);
}

#[test]
fn nothing_started_means_zero_duration() {
    let report = ResultCollector::collect(vec![
        TaskEvent::pending("a", ms(0)),
        TaskEvent::skipped("a", ms(3), "ghost"),
    ]);
    assert_eq!(report.total_duration, Duration::ZERO);
    assert!(report.finish_order.is_empty());
    assert!(report.overall_succeeded);
}

#[test]
fn events_after_terminal_state_are_ignored() {
    let mut collector = ResultCollector::new();
    collector.record(TaskEvent::running("a", ms(0)));
    collector.record(TaskEvent::succeeded("a", ms(10), json!("first")));
    collector.record(TaskEvent::failed("a", ms(20), TaskError::Timeout { after_ms: 20 }));

    let report = collector.finish();
    let a = report.outcome("a").unwrap();
    assert_eq!(a.state, TaskState::Succeeded);
    assert_eq!(a.result, Some(json!("first")));
    assert_eq!(a.error, None);
    assert_eq!(a.finished_at, Some(ms(10)));
    assert!(report.overall_succeeded);
}

#[tokio::test]
async fn stream_completes_when_sender_drops() {
    let (tx, rx) = tokio::sync::mpsc::unbounded_channel();
    tx.send(TaskEvent::running("a", ms(1))).unwrap();
    tx.send(TaskEvent::succeeded("a", ms(4), json!({"ok": true}))).unwrap();
    drop(tx);

    let report = ResultCollector::collect_stream(rx).await;
    assert_eq!(report.finish_order, vec!["a"]);
    assert_eq!(report.total_duration, ms(3));
    assert_eq!(report.ids_in_state(TaskState::Succeeded), vec!["a"]);
}
