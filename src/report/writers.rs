//! Machine-readable (`report.json`) and human-readable (`report.html`) artifacts.

use chrono::{DateTime, FixedOffset};
use serde::{Deserialize, Serialize};
use std::fmt::Write as _;
use std::fs;
use std::path::Path;

use super::types::{OutcomeRecord, ReportResult, Status, StatusCounts};

/// File name of the machine-readable artifact inside a run directory
pub const JSON_REPORT: &str = "report.json";

/// File name of the human-readable artifact inside a run directory
pub const HTML_REPORT: &str = "report.html";

/// Contents of `report.json`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RunDocument {
    pub started_at: DateTime<FixedOffset>,
    pub finished_at: DateTime<FixedOffset>,
    pub results: Vec<OutcomeRecord>,
}

impl RunDocument {
    /// Read a previously written `report.json`
    pub fn load(path: &Path) -> ReportResult<Self> {
        let text = fs::read_to_string(path)?;
        Ok(serde_json::from_str(&text)?)
    }

    pub fn counts(&self) -> StatusCounts {
        StatusCounts::from_records(&self.results)
    }
}

/// Write `report.json` into `run_dir`, replacing any previous file
pub fn write_json(run_dir: &Path, document: &RunDocument) -> ReportResult<()> {
    let json_path = run_dir.join(JSON_REPORT);
    fs::write(json_path, serde_json::to_string_pretty(document)?)?;
    Ok(())
}

/// Everything the HTML page shows
#[derive(Debug, Clone)]
pub struct HtmlContext<'a> {
    pub title: &'a str,
    pub started_at: DateTime<FixedOffset>,
    pub finished_at: DateTime<FixedOffset>,
    /// Run folder as shown in the header (usually the directory name)
    pub run_label: &'a str,
    pub results: &'a [OutcomeRecord],
}

/// Write `report.html` to `path`
pub fn write_html(path: &Path, context: &HtmlContext<'_>) -> ReportResult<()> {
    fs::write(path, render_html(context))?;
    Ok(())
}

/// Escape text for safe embedding in HTML element content and attributes
pub fn escape_html(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#x27;"),
            _ => out.push(c),
        }
    }
    out
}

const STYLESHEET: &str = r#"    body { font-family: Arial, sans-serif; margin: 24px; color: #111; }
    h1 { margin-bottom: 0; }
    .meta { color: #666; margin-top: 4px; }
    .summary { display: flex; gap: 12px; margin: 16px 0; flex-wrap: wrap; }
    .pill { padding: 6px 10px; border-radius: 14px; font-weight: 600; font-size: 14px; }
    .passed { background: #e6ffed; color: #18794e; }
    .failed { background: #ffe8e6; color: #c52727; }
    .skipped { background: #f5f5f5; color: #444; }
    .xfailed { background: #f5f5f5; color: #444; }
    .xpassed { background: #fff4db; color: #946200; }
    .total { background: #eef2ff; color: #1f3a93; }
    table { border-collapse: collapse; width: 100%; margin-top: 8px; }
    th, td { border: 1px solid #ddd; padding: 8px; vertical-align: top; }
    th { background: #f8f8f8; text-align: left; }
    tr:nth-child(even) { background: #fafafa; }
    tr.status-failed { background: #fff4f4; }
    tr.status-passed { background: #f7fffa; }
    td.status { font-weight: 700; width: 90px; }
    td.duration { width: 90px; white-space: nowrap; }
    td.screenshot img { max-width: 320px; border: 1px solid #ccc; border-radius: 4px; }
    pre { white-space: pre-wrap; margin: 0; font-family: SFMono-Regular, Consolas, 'Liberation Mono', Menlo, monospace; }
    .muted { color: #777; }
"#;

fn render_row(out: &mut String, record: &OutcomeRecord) {
    let status = record.outcome.as_str();
    let test = escape_html(&record.nodeid);

    let shot = match &record.screenshot {
        Some(path) => {
            let href = escape_html(path);
            format!(
                "<a href='{href}' target='_blank'><img src='{href}' alt='screenshot for {test}' /></a>"
            )
        }
        None => "<span class='muted'>n/a</span>".to_string(),
    };

    let message = match &record.message {
        Some(text) => format!("<pre>{}</pre>", escape_html(text)),
        None => "<span class='muted'>&mdash;</span>".to_string(),
    };

    let _ = writeln!(
        out,
        "      <tr class='status-{status}'><td class='test'>{test}</td><td class='status'>{status}</td>\
         <td class='duration'>{:.2}s</td><td class='screenshot'>{shot}</td><td class='message'>{message}</td></tr>",
        record.duration
    );
}

/// Render the full self-contained HTML report
pub fn render_html(context: &HtmlContext<'_>) -> String {
    let counts = StatusCounts::from_records(context.results);

    let mut rows = String::new();
    if context.results.is_empty() {
        rows.push_str("      <tr><td colspan='5' class='muted'>No tests collected.</td></tr>\n");
    } else {
        for record in context.results {
            render_row(&mut rows, record);
        }
    }

    let mut pills = String::new();
    for status in Status::ALL {
        let _ = writeln!(
            pills,
            "    <div class=\"pill {}\">{}: {}</div>",
            status.as_str(),
            status.label(),
            counts.get(status)
        );
    }
    let _ = writeln!(pills, "    <div class=\"pill total\">Total: {}</div>", counts.total());

    let title = escape_html(context.title);
    let started = context.started_at.format("%Y-%m-%d %H:%M:%S");
    let finished = context.finished_at.format("%Y-%m-%d %H:%M:%S");

    format!(
        r#"<!doctype html>
<html lang="en">
<head>
  <meta charset="utf-8" />
  <title>{title} - {started}</title>
  <style>
{STYLESHEET}  </style>
</head>
<body>
  <h1>{title}</h1>
  <div class="meta">
    Started: {started} &middot;
    Finished: {finished} &middot;
    Run folder: {run_label}
  </div>

  <div class="summary">
{pills}  </div>

  <table>
    <thead>
      <tr>
        <th>Test</th>
        <th>Status</th>
        <th>Duration</th>
        <th>Screenshot</th>
        <th>Details</th>
      </tr>
    </thead>
    <tbody>
{rows}    </tbody>
  </table>
</body>
</html>
"#,
        run_label = escape_html(context.run_label),
    )
}
