//! One test run's lifecycle: directory creation, accumulation, finalization.

use chrono::{DateTime, FixedOffset, Local};
use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use tracing::{debug, info};

use super::sink::OutcomeSink;
use super::types::{
    OutcomeRecord, ReportError, ReportResult, Stage, StageObservation, StageOutcome, StatusCounts,
};
use super::writers::{HTML_REPORT, HtmlContext, RunDocument, write_html, write_json};
use crate::config::{self, DEFAULT_REPORT_TITLE, ReportSettings};
use crate::snapshot::{BrowserSession, run_dir_name};

/// Name of the screenshot subdirectory inside a run directory
pub const SCREENSHOTS_DIR: &str = "screenshots";

/// Collects per-test results for one run and writes `report.json` and
/// `report.html` into a timestamped directory under the reports root.
///
/// The host constructs one reporter per session and passes it explicitly to
/// whichever hooks need it.
#[derive(Debug)]
pub struct RunReporter {
    run_dir: PathBuf,
    screenshots_dir: PathBuf,
    started_at: DateTime<Local>,
    finished_at: Option<DateTime<Local>>,
    title: String,
    sink: OutcomeSink,
    report_path: Option<PathBuf>,
}

impl RunReporter {
    /// Start a run under `root`, creating `<root>/<YYYY-MM-DD_HH-MM-SS>/screenshots`
    pub fn new(root: impl AsRef<Path>) -> ReportResult<Self> {
        Self::starting_at(root, Local::now())
    }

    /// Start a run using the reports directory and title from settings
    pub fn from_config(settings: &ReportSettings) -> ReportResult<Self> {
        Ok(Self::new(&settings.root)?.with_title(settings.title.clone()))
    }

    /// Start a run using the global configuration
    pub fn from_env() -> ReportResult<Self> {
        Self::from_config(&config::get().report)
    }

    /// Start a run with an explicit start time.
    ///
    /// Runs started within the same second get `-2`, `-3`, ... appended to
    /// the directory name so no two runs share a directory.
    pub fn starting_at(root: impl AsRef<Path>, started_at: DateTime<Local>) -> ReportResult<Self> {
        let root = root.as_ref();
        fs::create_dir_all(root).map_err(|source| ReportError::CreateDir {
            path: root.display().to_string(),
            source,
        })?;

        let run_dir = create_unique_run_dir(root, &run_dir_name(&started_at))?;
        let screenshots_dir = run_dir.join(SCREENSHOTS_DIR);
        fs::create_dir(&screenshots_dir).map_err(|source| ReportError::CreateDir {
            path: screenshots_dir.display().to_string(),
            source,
        })?;
        info!("test run reporting to {}", run_dir.display());

        Ok(Self {
            run_dir,
            screenshots_dir,
            started_at,
            finished_at: None,
            title: DEFAULT_REPORT_TITLE.to_string(),
            sink: OutcomeSink::new(),
            report_path: None,
        })
    }

    /// Set the report heading
    pub fn with_title(mut self, title: impl Into<String>) -> Self {
        self.title = title.into();
        self
    }

    /// Fold a stage observation into the run.
    ///
    /// Returns `true` if the observation created or updated a record.
    pub fn record(
        &mut self,
        observation: &StageObservation,
        session: Option<&mut dyn BrowserSession>,
    ) -> bool {
        self.sink
            .record(observation, session, &self.screenshots_dir, &self.run_dir)
    }

    /// Host adapter taking the stage as a name.
    ///
    /// Stage names other than `setup`, `call` and `teardown` are ignored.
    pub fn record_named(
        &mut self,
        nodeid: &str,
        stage: &str,
        outcome: StageOutcome,
        duration: f64,
        long_message: Option<&str>,
        session: Option<&mut dyn BrowserSession>,
    ) -> bool {
        let Some(stage) = Stage::from_name(stage) else {
            debug!("ignoring unknown stage {:?} for {}", stage, nodeid);
            return false;
        };
        let mut observation = StageObservation::new(nodeid, stage, outcome).duration(duration);
        observation.long_message = long_message.map(str::to_string);
        self.record(&observation, session)
    }

    /// Write `report.json` and `report.html` once and return the HTML path.
    ///
    /// Later calls return the same path without touching the files, as long
    /// as the HTML report still exists on disk.
    pub fn finalize(&mut self) -> ReportResult<PathBuf> {
        if let Some(path) = &self.report_path {
            if path.exists() {
                return Ok(path.clone());
            }
        }

        let report_path = self.run_dir.join(HTML_REPORT);
        let finished_local = self.finished_at.unwrap_or_else(Local::now);
        let started_at: DateTime<FixedOffset> = self.started_at.into();
        let finished_at: DateTime<FixedOffset> = finished_local.into();

        let document = RunDocument {
            started_at,
            finished_at,
            results: self.sink.records().to_vec(),
        };
        write_json(&self.run_dir, &document)?;

        let run_label = self
            .run_dir
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or_else(|| self.run_dir.display().to_string());
        write_html(
            &report_path,
            &HtmlContext {
                title: &self.title,
                started_at,
                finished_at,
                run_label: &run_label,
                results: self.sink.records(),
            },
        )?;

        self.finished_at = Some(finished_local);
        self.report_path = Some(report_path.clone());

        let counts = self.counts();
        info!(
            "wrote report {} ({} passed, {} failed, {} total)",
            report_path.display(),
            counts.passed,
            counts.failed,
            counts.total()
        );
        Ok(report_path)
    }

    pub fn run_dir(&self) -> &Path {
        &self.run_dir
    }

    pub fn screenshots_dir(&self) -> &Path {
        &self.screenshots_dir
    }

    pub fn started_at(&self) -> DateTime<Local> {
        self.started_at
    }

    pub fn finished_at(&self) -> Option<DateTime<Local>> {
        self.finished_at
    }

    pub fn report_path(&self) -> Option<&Path> {
        self.report_path.as_deref()
    }

    pub fn records(&self) -> &[OutcomeRecord] {
        self.sink.records()
    }

    pub fn counts(&self) -> StatusCounts {
        self.sink.counts()
    }
}

/// Create `<root>/<base>`, or the first free `<root>/<base>-<n>` for n >= 2
fn create_unique_run_dir(root: &Path, base: &str) -> ReportResult<PathBuf> {
    let mut attempt = 1u32;
    loop {
        let name = if attempt == 1 {
            base.to_string()
        } else {
            format!("{}-{}", base, attempt)
        };
        let dir = root.join(name);
        match fs::create_dir(&dir) {
            Ok(()) => return Ok(dir),
            Err(err) if err.kind() == ErrorKind::AlreadyExists => {
                debug!("run directory {} taken", dir.display());
                attempt += 1;
            }
            Err(source) => {
                return Err(ReportError::CreateDir {
                    path: dir.display().to_string(),
                    source,
                });
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::report::writers::JSON_REPORT;

    #[test]
    fn test_new_creates_run_and_screenshot_dirs() {
        let root = tempfile::tempdir().unwrap();
        let reporter = RunReporter::new(root.path()).unwrap();

        assert!(reporter.run_dir().is_dir());
        assert!(reporter.screenshots_dir().is_dir());
        assert_eq!(reporter.screenshots_dir(), reporter.run_dir().join(SCREENSHOTS_DIR));
        assert_eq!(
            reporter.run_dir().file_name().unwrap().to_string_lossy(),
            run_dir_name(&reporter.started_at())
        );
    }

    #[test]
    fn test_new_fails_when_root_is_a_file() {
        let tmp = tempfile::tempdir().unwrap();
        let file = tmp.path().join("not_a_dir");
        fs::write(&file, b"x").unwrap();

        let err = RunReporter::new(&file).unwrap_err();
        assert!(matches!(err, ReportError::CreateDir { .. }));
    }

    #[test]
    fn test_record_named_skips_unknown_stage() {
        let root = tempfile::tempdir().unwrap();
        let mut reporter = RunReporter::new(root.path()).unwrap();

        assert!(!reporter.record_named("t", "collect", StageOutcome::Failed, 0.1, Some("x"), None));
        assert!(reporter.records().is_empty());

        assert!(reporter.record_named("t", "call", StageOutcome::Failed, 0.1, Some("x"), None));
        assert_eq!(reporter.records().len(), 1);
    }

    #[test]
    fn test_finalize_is_idempotent() {
        let root = tempfile::tempdir().unwrap();
        let mut reporter = RunReporter::new(root.path()).unwrap();
        reporter.record(
            &StageObservation::new("t", Stage::Call, StageOutcome::Passed).duration(0.5),
            None,
        );

        let first = reporter.finalize().unwrap();
        let json_before = fs::read_to_string(reporter.run_dir().join(JSON_REPORT)).unwrap();
        let finished = reporter.finished_at();

        let second = reporter.finalize().unwrap();
        let json_after = fs::read_to_string(reporter.run_dir().join(JSON_REPORT)).unwrap();

        assert_eq!(first, second);
        assert_eq!(json_before, json_after);
        assert_eq!(finished, reporter.finished_at());
        assert_eq!(reporter.report_path(), Some(first.as_path()));
    }

    #[test]
    fn test_finalize_rewrites_missing_report_with_same_finish_time() {
        let root = tempfile::tempdir().unwrap();
        let mut reporter = RunReporter::new(root.path()).unwrap();

        let path = reporter.finalize().unwrap();
        let json_before = fs::read_to_string(reporter.run_dir().join(JSON_REPORT)).unwrap();
        fs::remove_file(&path).unwrap();

        let again = reporter.finalize().unwrap();
        assert_eq!(path, again);
        assert!(again.exists());
        let json_after = fs::read_to_string(reporter.run_dir().join(JSON_REPORT)).unwrap();
        assert_eq!(json_before, json_after);
    }

    #[test]
    fn test_runs_started_in_same_second_get_separate_dirs() {
        let root = tempfile::tempdir().unwrap();
        let now = Local::now();

        let mut first = RunReporter::starting_at(root.path(), now).unwrap();
        let mut second = RunReporter::starting_at(root.path(), now).unwrap();
        let third = RunReporter::starting_at(root.path(), now).unwrap();
        assert_ne!(first.run_dir(), second.run_dir());
        assert_eq!(
            second.run_dir().file_name().unwrap().to_string_lossy(),
            format!("{}-2", run_dir_name(&now))
        );
        assert_eq!(
            third.run_dir().file_name().unwrap().to_string_lossy(),
            format!("{}-3", run_dir_name(&now))
        );

        first.record(&StageObservation::new("first_run_test", Stage::Call, StageOutcome::Passed), None);
        second.record(&StageObservation::new("second_run_test", Stage::Call, StageOutcome::Passed), None);
        first.finalize().unwrap();
        second.finalize().unwrap();

        let first_json = fs::read_to_string(first.run_dir().join(JSON_REPORT)).unwrap();
        assert!(first_json.contains("first_run_test"));
        assert!(!first_json.contains("second_run_test"));
    }

    #[test]
    fn test_finalize_propagates_write_error_then_recovers() {
        let root = tempfile::tempdir().unwrap();
        let mut reporter = RunReporter::new(root.path()).unwrap();
        reporter.record(&StageObservation::new("t", Stage::Call, StageOutcome::Failed), None);

        let run_dir = reporter.run_dir().to_path_buf();
        fs::remove_dir_all(&run_dir).unwrap();
        fs::write(&run_dir, b"in the way").unwrap();

        let err = reporter.finalize().unwrap_err();
        assert!(matches!(err, ReportError::Io(_)));
        assert_eq!(reporter.report_path(), None);
        assert_eq!(reporter.finished_at(), None);

        fs::remove_file(&run_dir).unwrap();
        fs::create_dir(&run_dir).unwrap();
        let path = reporter.finalize().unwrap();
        assert!(path.exists());
        assert!(run_dir.join(JSON_REPORT).exists());
        assert!(reporter.finished_at().is_some());
        assert_eq!(reporter.report_path(), Some(path.as_path()));
    }

    #[test]
    fn test_custom_title() {
        let root = tempfile::tempdir().unwrap();
        let mut reporter = RunReporter::new(root.path()).unwrap().with_title("Nightly <smoke>");
        let path = reporter.finalize().unwrap();
        let html = fs::read_to_string(path).unwrap();
        assert!(html.contains("<h1>Nightly &lt;smoke&gt;</h1>"));
    }
}
