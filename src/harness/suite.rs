use std::any::Any;
use std::panic::{self, AssertUnwindSafe};
use std::time::Instant;

use tracing::{error, info, warn};

use super::types::{StageFailure, StageResult, SuiteSummary, TestContext};
use crate::report::{ReportResult, RunReporter, Stage, StageObservation, StageOutcome, Status};
use crate::snapshot::BrowserSession;

type StageFn<S> = Box<dyn FnMut(&mut TestContext<S>) -> StageResult>;

/// A single test: optional setup and teardown around a call body
pub struct TestCase<S> {
    nodeid: String,
    setup: Option<StageFn<S>>,
    call: StageFn<S>,
    teardown: Option<StageFn<S>>,
    expected_failure: Option<String>,
    skip: Option<String>,
    uses_session: bool,
}

impl<S> TestCase<S> {
    /// Create a test with the given identifier and call body
    pub fn new(
        nodeid: impl Into<String>,
        call: impl FnMut(&mut TestContext<S>) -> StageResult + 'static,
    ) -> Self {
        Self {
            nodeid: nodeid.into(),
            setup: None,
            call: Box::new(call),
            teardown: None,
            expected_failure: None,
            skip: None,
            uses_session: true,
        }
    }

    pub fn setup(mut self, f: impl FnMut(&mut TestContext<S>) -> StageResult + 'static) -> Self {
        self.setup = Some(Box::new(f));
        self
    }

    pub fn teardown(mut self, f: impl FnMut(&mut TestContext<S>) -> StageResult + 'static) -> Self {
        self.teardown = Some(Box::new(f));
        self
    }

    /// Mark the test as expected to fail
    pub fn xfail(mut self, reason: impl Into<String>) -> Self {
        self.expected_failure = Some(reason.into());
        self
    }

    /// Skip the test unconditionally
    pub fn skip(mut self, reason: impl Into<String>) -> Self {
        self.skip = Some(reason.into());
        self
    }

    /// Run without asking the session factory for a browser (API-only tests)
    pub fn without_session(mut self) -> Self {
        self.uses_session = false;
        self
    }

    pub fn nodeid(&self) -> &str {
        &self.nodeid
    }
}

/// Run every case in order, reporting each stage, then finalize the run.
///
/// `session_factory` is called once per test that wants a browser; the
/// session lives until that test's teardown has been reported.
pub fn run_suite<S, F>(
    reporter: &mut RunReporter,
    cases: Vec<TestCase<S>>,
    mut session_factory: F,
) -> ReportResult<SuiteSummary>
where
    S: BrowserSession,
    F: FnMut() -> Option<S>,
{
    info!("running {} test(s)", cases.len());

    for mut case in cases {
        let session = if case.uses_session {
            session_factory()
        } else {
            None
        };
        if case.uses_session && session.is_none() {
            warn!("{}: no browser session, screenshots disabled", case.nodeid);
        }
        let mut ctx = TestContext::new(session);

        let setup_ok = match case.skip.clone() {
            Some(reason) => {
                let result = Err(StageFailure::Skipped(format!("Skipped: {}", reason)));
                report_stage(reporter, &case, &mut ctx, Stage::Setup, result, 0.0);
                false
            }
            None => match case.setup.as_mut() {
                Some(setup) => {
                    let (result, secs) = timed(setup, &mut ctx);
                    let ok = result.is_ok();
                    report_stage(reporter, &case, &mut ctx, Stage::Setup, result, secs);
                    ok
                }
                None => true,
            },
        };

        if setup_ok {
            let (result, secs) = timed(&mut case.call, &mut ctx);
            report_stage(reporter, &case, &mut ctx, Stage::Call, result, secs);
        }

        if let Some(teardown) = case.teardown.as_mut() {
            let (result, secs) = timed(teardown, &mut ctx);
            report_stage(reporter, &case, &mut ctx, Stage::Teardown, result, secs);
        }

        log_final_status(reporter, &case.nodeid);
        // ctx drops here, closing the session
    }

    let report_path = reporter.finalize()?;
    Ok(SuiteSummary {
        counts: reporter.counts(),
        report_path,
    })
}

fn report_stage<S: BrowserSession>(
    reporter: &mut RunReporter,
    case: &TestCase<S>,
    ctx: &mut TestContext<S>,
    stage: Stage,
    result: StageResult,
    duration: f64,
) {
    let (outcome, message) = match &result {
        Ok(()) => (StageOutcome::Passed, None),
        Err(failure) => (failure.outcome(), Some(failure.message().to_string())),
    };

    let mut observation = StageObservation::new(case.nodeid.clone(), stage, outcome)
        .duration(duration)
        .expected_failure(stage == Stage::Call && case.expected_failure.is_some());
    observation.long_message = message;

    let (session, annotations) = ctx.parts();
    observation.annotations = annotations.to_vec();
    if let (Some(reason), Stage::Call) = (&case.expected_failure, stage) {
        if outcome != StageOutcome::Passed {
            observation = observation.annotate("xfail", reason.clone());
        }
    }

    let session = session.map(|s| s as &mut dyn BrowserSession);
    reporter.record(&observation, session);
}

fn log_final_status(reporter: &RunReporter, nodeid: &str) {
    let Some(record) = reporter.records().iter().find(|r| r.nodeid == nodeid) else {
        return;
    };
    match record.outcome {
        Status::Failed | Status::UnexpectedlyPassed => {
            error!("✗ {} {} ({:.2}s)", record.outcome, nodeid, record.duration)
        }
        _ => info!("✓ {} {} ({:.2}s)", record.outcome, nodeid, record.duration),
    }
}

/// Run a stage body, converting panics into failures, and time it in seconds
fn timed<S>(
    body: &mut StageFn<S>,
    ctx: &mut TestContext<S>,
) -> (StageResult, f64) {
    let start = Instant::now();
    let result = panic::catch_unwind(AssertUnwindSafe(|| body(ctx)))
        .unwrap_or_else(|payload| Err(StageFailure::Failed(panic_message(payload.as_ref()))));
    (result, start.elapsed().as_secs_f64())
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        format!("panicked: {}", s)
    } else if let Some(s) = payload.downcast_ref::<String>() {
        format!("panicked: {}", s)
    } else {
        "panicked".to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::snapshot::MockPage;
    use std::cell::Cell;
    use std::rc::Rc;

    fn page() -> Option<MockPage> {
        Some(MockPage::at(200, 120, "https://example.test/"))
    }

    #[test]
    fn test_passing_test_records_once_with_screenshot() {
        let root = tempfile::tempdir().unwrap();
        let mut reporter = RunReporter::new(root.path()).unwrap();

        let cases = vec![
            TestCase::new("tests/test_menu.py::test_home", |ctx: &mut TestContext<MockPage>| {
                let page = ctx.require_session()?;
                page.set_heading("Home");
                Ok(())
            })
            .setup(|_| Ok(()))
            .teardown(|_| Ok(())),
        ];

        let summary = run_suite(&mut reporter, cases, page).unwrap();
        assert_eq!(summary.counts.passed, 1);
        assert!(summary.success());

        let records = reporter.records();
        assert_eq!(records.len(), 1);
        assert_eq!(
            records[0].screenshot.as_deref(),
            Some("screenshots/tests_test_menu.py__test_home.png")
        );
        assert!(summary.report_path.exists());
    }

    #[test]
    fn test_setup_failure_skips_call_but_runs_teardown() {
        let root = tempfile::tempdir().unwrap();
        let mut reporter = RunReporter::new(root.path()).unwrap();
        let called = Rc::new(Cell::new(false));
        let torn_down = Rc::new(Cell::new(false));

        let (c, t) = (called.clone(), torn_down.clone());
        let cases = vec![
            TestCase::new("t_setup", move |_: &mut TestContext<MockPage>| {
                c.set(true);
                Ok(())
            })
            .setup(|_| Err(StageFailure::failed("login page did not load")))
            .teardown(move |_| {
                t.set(true);
                Ok(())
            }),
        ];

        run_suite(&mut reporter, cases, page).unwrap();
        assert!(!called.get());
        assert!(torn_down.get());

        let record = &reporter.records()[0];
        assert_eq!(record.outcome, Status::Failed);
        assert_eq!(record.screenshot, None);
        assert_eq!(record.message.as_deref(), Some("login page did not load"));
    }

    #[test]
    fn test_skip_marker() {
        let root = tempfile::tempdir().unwrap();
        let mut reporter = RunReporter::new(root.path()).unwrap();

        let cases = vec![
            TestCase::new("t_skip", |_: &mut TestContext<MockPage>| Ok(())).skip("needs WP_ADMIN_USER"),
        ];
        let summary = run_suite(&mut reporter, cases, page).unwrap();

        assert_eq!(summary.counts.skipped, 1);
        assert_eq!(
            reporter.records()[0].message.as_deref(),
            Some("Skipped: needs WP_ADMIN_USER")
        );
    }

    #[test]
    fn test_xfail_and_xpass() {
        let root = tempfile::tempdir().unwrap();
        let mut reporter = RunReporter::new(root.path()).unwrap();

        let cases = vec![
            TestCase::new("t_xfail", |_: &mut TestContext<MockPage>| {
                Err(StageFailure::failed("known bug"))
            })
            .xfail("issue 12"),
            TestCase::new("t_xpass", |_: &mut TestContext<MockPage>| Ok(())).xfail("issue 13"),
        ];
        let summary = run_suite(&mut reporter, cases, page).unwrap();

        assert_eq!(summary.counts.xfailed, 1);
        assert_eq!(summary.counts.xpassed, 1);
        assert!(!summary.success());
        assert_eq!(
            reporter.records()[0].message.as_deref(),
            Some("known bug\nxfail: issue 12")
        );
    }

    #[test]
    fn test_panic_becomes_failure_with_annotations() {
        let root = tempfile::tempdir().unwrap();
        let mut reporter = RunReporter::new(root.path()).unwrap();

        let cases = vec![
            TestCase::new("t_panic", |ctx: &mut TestContext<MockPage>| {
                ctx.annotate("request_id", "abc123");
                panic!("boom");
            })
            .without_session(),
        ];
        let summary = run_suite(&mut reporter, cases, || -> Option<MockPage> {
            panic!("factory must not be called")
        })
        .unwrap();

        assert_eq!(summary.counts.failed, 1);
        let record = &reporter.records()[0];
        assert_eq!(record.message.as_deref(), Some("panicked: boom\nrequest_id: abc123"));
        assert_eq!(record.screenshot, None);
    }

    #[test]
    fn test_teardown_failure_updates_passed_call() {
        let root = tempfile::tempdir().unwrap();
        let mut reporter = RunReporter::new(root.path()).unwrap();

        let cases = vec![
            TestCase::new("t_teardown", |_: &mut TestContext<MockPage>| Ok(()))
                .teardown(|_| Err(StageFailure::failed("could not delete fixture post"))),
        ];
        run_suite(&mut reporter, cases, page).unwrap();

        let records = reporter.records();
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].outcome, Status::Failed);
        assert!(records[0].screenshot.is_some());
    }
}
