//! WP Test Report - result collection and reporting for browser test suites.
//!
//! This crate provides:
//! - An outcome sink that merges setup/call/teardown reports into one record per test
//! - Best-effort screenshots of the browser session on the call stage
//! - A run reporter that writes `report.json` and `report.html` exactly once per run
//! - Bounded polling helpers for waiting on UI state changes
//! - An in-process suite host and a launcher for external test commands
//!
//! # Example
//!
//! ```rust,no_run
//! use wp_test_report::report::{RunReporter, Stage, StageObservation, StageOutcome};
//! use wp_test_report::snapshot::MockPage;
//!
//! let mut reporter = RunReporter::new("./reports").unwrap();
//! let mut page = MockPage::at(800, 600, "https://example.test/");
//!
//! let call = StageObservation::new("tests/test_menu.py::test_home", Stage::Call, StageOutcome::Passed)
//!     .duration(1.25);
//! reporter.record(&call, Some(&mut page));
//!
//! let html = reporter.finalize().unwrap();
//! println!("report: {}", html.display());
//! ```

pub mod config;
pub mod harness;
pub mod report;
pub mod runner;
pub mod runs;
pub mod snapshot;
pub mod wait;

// Re-export reporting types
pub use report::{
    OutcomeRecord, OutcomeSink, ReportError, ReportResult, RunDocument, RunReporter, Stage,
    StageObservation, StageOutcome, Status, StatusCounts,
};

// Re-export harness types
pub use harness::{StageFailure, StageResult, SuiteSummary, TestCase, TestContext, run_suite};

// Re-export snapshot types
pub use snapshot::{BrowserSession, MockPage, ScreenshotError, SnapshotError, SnapshotResult};

// Re-export polling helpers
pub use wait::{PollConfig, WaitOutcome, wait_for, wait_until_changed, wait_until_changed_or};

// Re-export runner and run browsing
pub use runner::{RunOutput, RunnerError, TestCommand, discover_tests, run_tests};
pub use runs::{RunEntry, latest_run, list_runs, load_summary};
