//! Types for stage observations and per-test outcome records.

use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

/// One of the three points at which a test framework reports status
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Stage {
    Setup,
    Call,
    Teardown,
}

impl Stage {
    /// Parse a stage name as reported by a host framework
    pub fn from_name(name: &str) -> Option<Self> {
        match name {
            "setup" => Some(Stage::Setup),
            "call" => Some(Stage::Call),
            "teardown" => Some(Stage::Teardown),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Stage::Setup => "setup",
            Stage::Call => "call",
            Stage::Teardown => "teardown",
        }
    }

    /// Whether an observation of this stage with `outcome` changes the run.
    ///
    /// Setup counts only when it failed or skipped, teardown only when it
    /// failed; the call stage always counts.
    pub fn should_record(&self, outcome: StageOutcome) -> bool {
        match self {
            Stage::Setup => matches!(outcome, StageOutcome::Failed | StageOutcome::Skipped),
            Stage::Call => true,
            Stage::Teardown => outcome == StageOutcome::Failed,
        }
    }
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Raw outcome of a single stage
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StageOutcome {
    Passed,
    Failed,
    Skipped,
}

/// Final status of a test as shown in reports
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Status {
    #[serde(rename = "passed")]
    Passed,
    #[serde(rename = "failed")]
    Failed,
    #[serde(rename = "skipped")]
    Skipped,
    #[serde(rename = "xfailed")]
    ExpectedFailure,
    #[serde(rename = "xpassed")]
    UnexpectedlyPassed,
}

impl Status {
    /// All statuses in summary display order
    pub const ALL: [Status; 5] = [
        Status::Passed,
        Status::Failed,
        Status::Skipped,
        Status::ExpectedFailure,
        Status::UnexpectedlyPassed,
    ];

    /// Resolve the reported status from a stage outcome.
    ///
    /// A test marked as expected-to-fail becomes `ExpectedFailure` when it
    /// failed (or was skipped by the xfail machinery) and
    /// `UnexpectedlyPassed` when it passed.
    pub fn resolve(outcome: StageOutcome, was_expected_failure: bool) -> Self {
        match (outcome, was_expected_failure) {
            (StageOutcome::Passed, true) => Status::UnexpectedlyPassed,
            (StageOutcome::Failed | StageOutcome::Skipped, true) => Status::ExpectedFailure,
            (StageOutcome::Passed, false) => Status::Passed,
            (StageOutcome::Failed, false) => Status::Failed,
            (StageOutcome::Skipped, false) => Status::Skipped,
        }
    }

    /// Machine-readable name, as written to `report.json`
    pub fn as_str(&self) -> &'static str {
        match self {
            Status::Passed => "passed",
            Status::Failed => "failed",
            Status::Skipped => "skipped",
            Status::ExpectedFailure => "xfailed",
            Status::UnexpectedlyPassed => "xpassed",
        }
    }

    /// Human-readable label for summary badges
    pub fn label(&self) -> &'static str {
        match self {
            Status::Passed => "Passed",
            Status::Failed => "Failed",
            Status::Skipped => "Skipped",
            Status::ExpectedFailure => "XFailed",
            Status::UnexpectedlyPassed => "XPassed",
        }
    }
}

impl fmt::Display for Status {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A structured key/value annotation attached to a test (e.g. a request id)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Annotation {
    pub key: String,
    pub value: serde_json::Value,
}

impl Annotation {
    pub fn new(key: impl Into<String>, value: impl Into<serde_json::Value>) -> Self {
        Self {
            key: key.into(),
            value: value.into(),
        }
    }

    /// Render as `"<key>: <value>"`.
    ///
    /// Arrays and objects are pretty-printed; scalars use their plain form.
    pub fn render(&self) -> String {
        let value = match &self.value {
            serde_json::Value::String(s) => s.clone(),
            serde_json::Value::Array(_) | serde_json::Value::Object(_) => {
                serde_json::to_string_pretty(&self.value).unwrap_or_else(|_| self.value.to_string())
            }
            other => other.to_string(),
        };
        format!("{}: {}", self.key, value)
    }
}

/// One stage report for one test, as handed over by the host framework
#[derive(Debug, Clone, PartialEq)]
pub struct StageObservation {
    /// Stable test identifier (fully-qualified test name)
    pub nodeid: String,
    pub stage: Stage,
    pub outcome: StageOutcome,
    /// Whether the test carries an expected-failure marker
    pub was_expected_failure: bool,
    /// Elapsed time of this stage in seconds
    pub duration: f64,
    /// Full failure/skip text, if the framework produced one
    pub long_message: Option<String>,
    /// Annotations in insertion order
    pub annotations: Vec<Annotation>,
}

impl StageObservation {
    pub fn new(nodeid: impl Into<String>, stage: Stage, outcome: StageOutcome) -> Self {
        Self {
            nodeid: nodeid.into(),
            stage,
            outcome,
            was_expected_failure: false,
            duration: 0.0,
            long_message: None,
            annotations: Vec::new(),
        }
    }

    pub fn duration(mut self, seconds: f64) -> Self {
        self.duration = seconds;
        self
    }

    pub fn message(mut self, text: impl Into<String>) -> Self {
        self.long_message = Some(text.into());
        self
    }

    pub fn expected_failure(mut self, flag: bool) -> Self {
        self.was_expected_failure = flag;
        self
    }

    pub fn annotate(mut self, key: impl Into<String>, value: impl Into<serde_json::Value>) -> Self {
        self.annotations.push(Annotation::new(key, value));
        self
    }

    /// Diagnostic text for a failed or skipped stage, trimmed; `None` otherwise
    pub fn diagnostic(&self) -> Option<String> {
        if self.outcome == StageOutcome::Passed {
            return None;
        }
        self.long_message
            .as_deref()
            .map(str::trim)
            .filter(|text| !text.is_empty())
            .map(str::to_string)
    }
}

/// The durable, single-per-test summary of a test's result
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OutcomeRecord {
    pub nodeid: String,
    pub outcome: Status,
    /// Seconds
    pub duration: f64,
    /// Path relative to the run directory
    pub screenshot: Option<String>,
    pub message: Option<String>,
}

/// Per-status tallies for a set of records
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatusCounts {
    pub passed: usize,
    pub failed: usize,
    pub skipped: usize,
    pub xfailed: usize,
    pub xpassed: usize,
}

impl StatusCounts {
    pub fn from_records<'a>(records: impl IntoIterator<Item = &'a OutcomeRecord>) -> Self {
        let mut counts = Self::default();
        for record in records {
            counts.add(record.outcome);
        }
        counts
    }

    pub fn add(&mut self, status: Status) {
        match status {
            Status::Passed => self.passed += 1,
            Status::Failed => self.failed += 1,
            Status::Skipped => self.skipped += 1,
            Status::ExpectedFailure => self.xfailed += 1,
            Status::UnexpectedlyPassed => self.xpassed += 1,
        }
    }

    pub fn get(&self, status: Status) -> usize {
        match status {
            Status::Passed => self.passed,
            Status::Failed => self.failed,
            Status::Skipped => self.skipped,
            Status::ExpectedFailure => self.xfailed,
            Status::UnexpectedlyPassed => self.xpassed,
        }
    }

    pub fn total(&self) -> usize {
        self.passed + self.failed + self.skipped + self.xfailed + self.xpassed
    }
}

/// Result type for report operations
pub type ReportResult<T> = Result<T, ReportError>;

/// Error types for run lifecycle and artifact writing
#[derive(Debug, Error)]
pub enum ReportError {
    #[error("failed to create run directory {path}: {source}")]
    CreateDir {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}
