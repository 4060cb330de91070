//! Browsing run directories under the reports root.
//!
//! Each run lives in a timestamp-named directory, optionally suffixed with
//! `-<n>` when several runs started in the same second. Provides:
//! - Listing runs and finding the latest one
//! - Reading a run's summary back from `report.json`
//! - Removing runs older than a given age

use chrono::NaiveDateTime;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::{Duration, SystemTime};

use tracing::{debug, warn};

use crate::report::{HTML_REPORT, JSON_REPORT, ReportResult, RunDocument, StatusCounts};
use crate::snapshot::RUN_DIR_FORMAT;

/// A run directory found under the reports root
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunEntry {
    /// Directory name, e.g. `2026-10-17_09-00-00`
    pub name: String,
    pub dir: PathBuf,
}

impl RunEntry {
    pub fn json_path(&self) -> PathBuf {
        self.dir.join(JSON_REPORT)
    }

    pub fn html_path(&self) -> PathBuf {
        self.dir.join(HTML_REPORT)
    }

    /// Whether the run was finalized
    pub fn is_finalized(&self) -> bool {
        self.html_path().exists()
    }

    /// Per-status counts from `report.json`
    pub fn summary(&self) -> ReportResult<StatusCounts> {
        load_summary(&self.dir)
    }
}

/// Per-status counts from the `report.json` inside `run_dir`
pub fn load_summary(run_dir: &Path) -> ReportResult<StatusCounts> {
    Ok(RunDocument::load(&run_dir.join(JSON_REPORT))?.counts())
}

/// Chronological sort key of a run directory name, `None` for other names
fn run_sort_key(name: &str) -> Option<(NaiveDateTime, u32)> {
    if let Ok(started) = NaiveDateTime::parse_from_str(name, RUN_DIR_FORMAT) {
        return Some((started, 1));
    }
    let (base, suffix) = name.rsplit_once('-')?;
    let n: u32 = suffix.parse().ok().filter(|n| *n >= 2)?;
    let started = NaiveDateTime::parse_from_str(base, RUN_DIR_FORMAT).ok()?;
    Some((started, n))
}

/// List all run directories under `root`, oldest first
pub fn list_runs(root: &Path) -> std::io::Result<Vec<RunEntry>> {
    if !root.exists() {
        return Ok(Vec::new());
    }

    let mut runs = Vec::new();
    for entry in fs::read_dir(root)? {
        let entry = entry?;
        let path = entry.path();
        if !path.is_dir() {
            continue;
        }
        let name = entry.file_name().to_string_lossy().into_owned();
        if let Some(key) = run_sort_key(&name) {
            runs.push((key, RunEntry { name, dir: path }));
        }
    }
    runs.sort_by(|a, b| a.0.cmp(&b.0));
    Ok(runs.into_iter().map(|(_, run)| run).collect())
}

/// The most recent run under `root`, if any
pub fn latest_run(root: &Path) -> std::io::Result<Option<RunEntry>> {
    Ok(list_runs(root)?.pop())
}

/// Remove run directories whose modification time is older than `max_age`
pub fn cleanup_old_runs(root: &Path, max_age: Duration) -> std::io::Result<usize> {
    let now = SystemTime::now();
    let mut cleaned = 0;

    for run in list_runs(root)? {
        let modified = match fs::metadata(&run.dir).and_then(|m| m.modified()) {
            Ok(modified) => modified,
            Err(err) => {
                warn!("cannot stat {}: {}", run.dir.display(), err);
                continue;
            }
        };
        let age = now.duration_since(modified).unwrap_or(Duration::ZERO);
        if age > max_age {
            match fs::remove_dir_all(&run.dir) {
                Ok(()) => {
                    debug!("removed old run {}", run.name);
                    cleaned += 1;
                }
                Err(err) => warn!("failed to remove {}: {}", run.dir.display(), err),
            }
        }
    }

    Ok(cleaned)
}
