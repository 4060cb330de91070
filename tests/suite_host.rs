//! End-to-end: an in-process suite driving a mock page, polling for UI changes.

use std::cell::RefCell;
use std::fs;
use std::time::Duration;

use wp_test_report::harness::{StageFailure, TestCase, TestContext, run_suite};
use wp_test_report::report::{RunReporter, Status};
use wp_test_report::runs::latest_run;
use wp_test_report::snapshot::MockPage;
use wp_test_report::wait::{PollConfig, WaitOutcome, act_and_wait, wait_until_changed};

fn poll() -> PollConfig {
    PollConfig::new(Duration::from_millis(200), Duration::from_millis(5))
}

#[test]
fn test_suite_produces_browsable_run() {
    let root = tempfile::tempdir().unwrap();
    let mut reporter = RunReporter::new(root.path()).unwrap().with_title("Workout log");

    let cases = vec![
        TestCase::new("tests/test_simple_workout_log.py::test_log_set", |ctx: &mut TestContext<MockPage>| {
            let page = RefCell::new(ctx.require_session()?);
            let outcome = act_and_wait(
                || page.borrow_mut().push_line("Squat 5x5 100kg"),
                || page.borrow().text(),
                || false,
                poll(),
            );
            match outcome {
                WaitOutcome::Changed(text) if text.contains("Squat") => Ok(()),
                other => Err(StageFailure::failed(format!("unexpected: {:?}", other))),
            }
        }),
        TestCase::new("tests/test_simple_workout_log.py::test_history", |ctx: &mut TestContext<MockPage>| {
            let page = ctx.require_session()?;
            let before = page.url().to_string();
            // nothing navigates, so this must time out rather than report a change
            if wait_until_changed(&before, || page.url().to_string(), Duration::from_millis(30), Duration::from_millis(5)) {
                Ok(())
            } else {
                Err(StageFailure::failed("history page never loaded"))
            }
        }),
        TestCase::new("tests/test_api_endpoints.py::test_rest_ping", |_: &mut TestContext<MockPage>| Ok(()))
            .without_session(),
    ];

    let summary = run_suite(&mut reporter, cases, || {
        Some(MockPage::at(400, 240, "https://example.test/workouts/"))
    })
    .unwrap();

    assert_eq!(summary.counts.passed, 2);
    assert_eq!(summary.counts.failed, 1);
    assert!(!summary.success());

    let records = reporter.records();
    assert_eq!(records[1].outcome, Status::Failed);
    assert_eq!(records[1].message.as_deref(), Some("history page never loaded"));
    assert!(records[0].screenshot.is_some());
    assert!(records[1].screenshot.is_some());
    assert!(records[2].screenshot.is_none());

    let run = latest_run(root.path()).unwrap().unwrap();
    assert_eq!(run.dir, reporter.run_dir());
    assert_eq!(run.summary().unwrap(), summary.counts);

    let html = fs::read_to_string(&summary.report_path).unwrap();
    assert!(html.contains("<h1>Workout log</h1>"));
    assert!(html.contains("Failed: 1"));
    assert!(html.contains("Total: 3"));
}
