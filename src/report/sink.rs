//! Folds stage observations into one outcome record per test.

use std::path::Path;

use tracing::debug;

use super::types::{OutcomeRecord, Stage, StageObservation, Status, StatusCounts};
use crate::snapshot::{BrowserSession, capture_for_test};

/// Ordered store of outcome records, keyed by test identifier.
///
/// Records stay in first-observed order; updates replace in place.
#[derive(Debug, Clone, Default)]
pub struct OutcomeSink {
    records: Vec<OutcomeRecord>,
}

impl OutcomeSink {
    pub fn new() -> Self {
        Self::default()
    }

    /// Fold one stage observation into the store.
    ///
    /// Successful setup and non-failing teardown observations are ignored.
    /// On the call stage a screenshot is attempted when `session` is given;
    /// any capture problem ends up as a `(Screenshot error: ...)` line in the
    /// record's message instead of an error.
    ///
    /// Returns `true` if a record was created or updated.
    pub fn record(
        &mut self,
        observation: &StageObservation,
        session: Option<&mut dyn BrowserSession>,
        screenshots_dir: &Path,
        run_dir: &Path,
    ) -> bool {
        if !observation.stage.should_record(observation.outcome) {
            return false;
        }

        let index = self.index_of(&observation.nodeid);
        let existing = index.map(|i| &self.records[i]);

        let outcome = Status::resolve(observation.outcome, observation.was_expected_failure);

        let mut screenshot = existing.and_then(|r| r.screenshot.clone());
        let mut screenshot_error = None;
        if observation.stage == Stage::Call {
            if let Some(session) = session {
                match capture_for_test(session, screenshots_dir, run_dir, &observation.nodeid) {
                    Ok(path) => screenshot = Some(path),
                    Err(err) => screenshot_error = Some(format!("(Screenshot error: {})", err)),
                }
            }
        }

        let mut message = existing.and_then(|r| r.message.clone());
        if let Some(text) = observation.diagnostic() {
            append_piece(&mut message, &text);
        }
        if let Some(line) = screenshot_error {
            append_unique(&mut message, &line);
        }
        for annotation in &observation.annotations {
            append_unique(&mut message, &annotation.render());
        }

        let duration = match existing {
            Some(prev) if observation.stage != Stage::Call && prev.duration > 0.0 => prev.duration,
            _ => observation.duration,
        };

        let record = OutcomeRecord {
            nodeid: observation.nodeid.clone(),
            outcome,
            duration,
            screenshot,
            message,
        };

        debug!(
            "{} {} -> {} ({:.2}s)",
            observation.nodeid, observation.stage, record.outcome, record.duration
        );

        match index {
            Some(i) => self.records[i] = record,
            None => self.records.push(record),
        }
        true
    }

    /// Records in first-observed order
    pub fn records(&self) -> &[OutcomeRecord] {
        &self.records
    }

    pub fn get(&self, nodeid: &str) -> Option<&OutcomeRecord> {
        self.index_of(nodeid).map(|i| &self.records[i])
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn counts(&self) -> StatusCounts {
        StatusCounts::from_records(&self.records)
    }

    fn index_of(&self, nodeid: &str) -> Option<usize> {
        self.records.iter().position(|r| r.nodeid == nodeid)
    }
}

/// Append `piece` on its own line.
fn append_piece(message: &mut Option<String>, piece: &str) {
    let piece = piece.trim();
    if piece.is_empty() {
        return;
    }
    match message {
        Some(text) => {
            text.push('\n');
            text.push_str(piece);
        }
        None => *message = Some(piece.to_string()),
    }
}

/// Append `piece` unless its lines already appear, whole and in sequence,
/// in the message. Hosts re-send the same annotations with every stage.
fn append_unique(message: &mut Option<String>, piece: &str) {
    let piece = piece.trim();
    if let Some(text) = message {
        if contains_lines(text, piece) {
            return;
        }
    }
    append_piece(message, piece);
}

fn contains_lines(text: &str, piece: &str) -> bool {
    let needle: Vec<&str> = piece.lines().collect();
    if needle.is_empty() {
        return false;
    }
    let haystack: Vec<&str> = text.lines().collect();
    haystack.windows(needle.len()).any(|window| window == needle.as_slice())
}
