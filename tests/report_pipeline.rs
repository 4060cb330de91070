//! Integration tests for the reporting pipeline: record, screenshot, finalize.

use std::fs;
use std::path::Path;

use pretty_assertions::assert_eq;
use wp_test_report::report::{
    HTML_REPORT, JSON_REPORT, RunDocument, RunReporter, Stage, StageObservation, StageOutcome,
    Status,
};
use wp_test_report::snapshot::{BrowserSession, MockPage, SnapshotError, SnapshotResult};

struct CrashingDriver;

impl BrowserSession for CrashingDriver {
    fn screenshot_png(&mut self) -> SnapshotResult<Vec<u8>> {
        Err(SnapshotError::Capture("invalid session id".to_string()))
    }

    fn source_type(&self) -> &str {
        "chrome"
    }
}

fn load_json(run_dir: &Path) -> serde_json::Value {
    let text = fs::read_to_string(run_dir.join(JSON_REPORT)).expect("report.json missing");
    serde_json::from_str(&text).expect("report.json is not JSON")
}

#[test]
fn test_zero_tests_report() {
    let root = tempfile::tempdir().unwrap();
    let mut reporter = RunReporter::new(root.path()).unwrap();

    let html_path = reporter.finalize().unwrap();
    assert_eq!(html_path, reporter.run_dir().join(HTML_REPORT));

    let html = fs::read_to_string(&html_path).unwrap();
    assert!(html.contains("No tests collected."));

    let json = load_json(reporter.run_dir());
    assert_eq!(json["results"], serde_json::json!([]));
    assert!(json["started_at"].is_string());
    assert!(json["finished_at"].is_string());
}

#[test]
fn test_full_lifecycle_single_record_per_test() {
    let root = tempfile::tempdir().unwrap();
    let mut reporter = RunReporter::new(root.path()).unwrap();
    let mut page = MockPage::at(320, 200, "https://example.test/meal-planner/");
    let id = "tests/test_meal_planner.py::test_add_recipe[chili con carne]";

    let setup = StageObservation::new(id, Stage::Setup, StageOutcome::Passed).duration(0.3);
    let call = StageObservation::new(id, Stage::Call, StageOutcome::Passed).duration(4.2);
    let teardown = StageObservation::new(id, Stage::Teardown, StageOutcome::Passed).duration(0.9);

    assert!(!reporter.record(&setup, None));
    assert!(reporter.records().is_empty());
    assert!(reporter.record(&call, Some(&mut page)));
    assert!(!reporter.record(&teardown, None));

    let path = reporter.finalize().unwrap();
    let json = load_json(reporter.run_dir());
    let results = json["results"].as_array().unwrap();
    assert_eq!(results.len(), 1);

    let entry = &results[0];
    assert_eq!(entry["nodeid"], id);
    assert_eq!(entry["outcome"], "passed");
    assert_eq!(entry["duration"], 4.2);
    assert!(entry["message"].is_null());

    let shot = entry["screenshot"].as_str().unwrap();
    assert!(!Path::new(shot).is_absolute());
    let file_name = shot.rsplit('/').next().unwrap();
    assert!(
        file_name
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || matches!(c, '.' | '_' | '-'))
    );
    assert!(reporter.run_dir().join(shot).exists());

    let html = fs::read_to_string(path).unwrap();
    assert!(html.contains(&format!("<img src='{}'", shot)));
}

#[test]
fn test_call_duration_dominates_all_stages() {
    let root = tempfile::tempdir().unwrap();
    let mut reporter = RunReporter::new(root.path()).unwrap();
    let id = "tests/test_house_log.py::test_issue";

    for (stage, secs) in [(Stage::Setup, 0.11), (Stage::Call, 2.22), (Stage::Teardown, 0.33)] {
        let obs = StageObservation::new(id, stage, StageOutcome::Failed)
            .duration(secs)
            .message(format!("{} broke", stage));
        reporter.record(&obs, None);
    }

    let records = reporter.records();
    assert_eq!(records.len(), 1);
    assert_eq!(records[0].duration, 2.22);
    assert_eq!(
        records[0].message.as_deref(),
        Some("setup broke\ncall broke\nteardown broke")
    );
}

#[test]
fn test_teardown_failure_keeps_call_message() {
    let root = tempfile::tempdir().unwrap();
    let mut reporter = RunReporter::new(root.path()).unwrap();

    reporter.record(
        &StageObservation::new("T", Stage::Call, StageOutcome::Failed).message("M1"),
        None,
    );
    reporter.record(
        &StageObservation::new("T", Stage::Teardown, StageOutcome::Failed).message("M2"),
        None,
    );

    let message = reporter.records()[0].message.clone().unwrap();
    assert!(message.contains("M1"));
    assert!(message.contains("M2"));
}

#[test]
fn test_screenshot_exception_does_not_change_outcome() {
    let root = tempfile::tempdir().unwrap();
    let mut reporter = RunReporter::new(root.path()).unwrap();

    let call = StageObservation::new("tests/test_sudoku_helper.py::test_solve", Stage::Call, StageOutcome::Passed);
    reporter.record(&call, Some(&mut CrashingDriver));
    reporter.finalize().unwrap();

    let json = load_json(reporter.run_dir());
    let entry = &json["results"][0];
    assert_eq!(entry["outcome"], "passed");
    assert!(entry["screenshot"].is_null());
    assert!(entry["message"].as_str().unwrap().contains("Screenshot error"));
}

#[test]
fn test_finalize_twice_writes_once() {
    let root = tempfile::tempdir().unwrap();
    let mut reporter = RunReporter::new(root.path()).unwrap();
    reporter.record(
        &StageObservation::new("a", Stage::Call, StageOutcome::Passed).expected_failure(true),
        None,
    );

    let first = reporter.finalize().unwrap();
    let json_path = reporter.run_dir().join(JSON_REPORT);
    let before = fs::read_to_string(&json_path).unwrap();
    let modified = fs::metadata(&json_path).unwrap().modified().unwrap();

    // records added after finalize do not reach the sealed artifacts
    reporter.record(&StageObservation::new("b", Stage::Call, StageOutcome::Failed), None);
    let second = reporter.finalize().unwrap();

    assert_eq!(first, second);
    assert_eq!(before, fs::read_to_string(&json_path).unwrap());
    assert_eq!(modified, fs::metadata(&json_path).unwrap().modified().unwrap());

    let doc = RunDocument::load(&json_path).unwrap();
    assert_eq!(doc.results.len(), 1);
    assert_eq!(doc.results[0].outcome, Status::UnexpectedlyPassed);
    assert!(doc.finished_at >= doc.started_at);
}
