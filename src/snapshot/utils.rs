use chrono::{DateTime, TimeZone};

/// Directory-name format for a run; lexicographic order is chronological order
pub const RUN_DIR_FORMAT: &str = "%Y-%m-%d_%H-%M-%S";

/// Generate a run directory name from its start time
pub fn run_dir_name<Tz: TimeZone>(started_at: &DateTime<Tz>) -> String
where
    Tz::Offset: std::fmt::Display,
{
    started_at.format(RUN_DIR_FORMAT).to_string()
}

/// Convert a test identifier into a filename-safe slug
///
/// Every character outside `[A-Za-z0-9._-]` becomes `_`.
pub fn sanitize_name(nodeid: &str) -> String {
    nodeid
        .chars()
        .map(|c| match c {
            'a'..='z' | 'A'..='Z' | '0'..='9' | '.' | '_' | '-' => c,
            _ => '_',
        })
        .collect()
}

/// Generate the screenshot filename for a test
pub fn screenshot_filename(nodeid: &str) -> String {
    format!("{}.png", sanitize_name(nodeid))
}
