use std::fmt;
use std::path::PathBuf;

use crate::report::{Annotation, StageOutcome, StatusCounts};

/// Why a stage did not pass
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StageFailure {
    /// Assertion or runtime failure, with the full failure text
    Failed(String),

    /// The stage decided the test cannot run here (missing credentials, etc.)
    Skipped(String),
}

impl StageFailure {
    pub fn failed(msg: impl Into<String>) -> Self {
        StageFailure::Failed(msg.into())
    }

    pub fn skipped(msg: impl Into<String>) -> Self {
        StageFailure::Skipped(msg.into())
    }

    pub fn outcome(&self) -> StageOutcome {
        match self {
            StageFailure::Failed(_) => StageOutcome::Failed,
            StageFailure::Skipped(_) => StageOutcome::Skipped,
        }
    }

    pub fn message(&self) -> &str {
        match self {
            StageFailure::Failed(msg) | StageFailure::Skipped(msg) => msg,
        }
    }
}

impl fmt::Display for StageFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StageFailure::Failed(msg) => write!(f, "failed: {}", msg),
            StageFailure::Skipped(msg) => write!(f, "skipped: {}", msg),
        }
    }
}

/// Result of one setup/call/teardown body
pub type StageResult = Result<(), StageFailure>;

/// Per-test state handed to every stage body
pub struct TestContext<S> {
    session: Option<S>,
    annotations: Vec<Annotation>,
}

impl<S> TestContext<S> {
    pub fn new(session: Option<S>) -> Self {
        Self {
            session,
            annotations: Vec::new(),
        }
    }

    /// The browser session, if the test was given one
    pub fn session(&mut self) -> Option<&mut S> {
        self.session.as_mut()
    }

    /// The browser session, or a failure suitable for `?` inside a stage body
    pub fn require_session(&mut self) -> Result<&mut S, StageFailure> {
        self.session
            .as_mut()
            .ok_or_else(|| StageFailure::failed("no browser session available"))
    }

    /// Attach a key/value annotation; it is reported with every later stage
    pub fn annotate(&mut self, key: impl Into<String>, value: impl Into<serde_json::Value>) {
        self.annotations.push(Annotation::new(key, value));
    }

    pub fn annotations(&self) -> &[Annotation] {
        &self.annotations
    }

    pub(crate) fn parts(&mut self) -> (Option<&mut S>, &[Annotation]) {
        (self.session.as_mut(), &self.annotations)
    }
}

/// Outcome of a whole suite run
#[derive(Debug, Clone)]
pub struct SuiteSummary {
    pub counts: StatusCounts,
    /// Path of the finalized `report.html`
    pub report_path: PathBuf,
}

impl SuiteSummary {
    /// Whether the run should be treated as green (no failures, no xpasses)
    pub fn success(&self) -> bool {
        self.counts.failed == 0 && self.counts.xpassed == 0
    }
}
