pub mod reporter;
pub mod sink;
pub mod types;
pub mod writers;

pub use reporter::{RunReporter, SCREENSHOTS_DIR};
pub use sink::OutcomeSink;
pub use types::{
    Annotation, OutcomeRecord, ReportError, ReportResult, Stage, StageObservation, StageOutcome,
    Status, StatusCounts,
};
pub use writers::{
    HTML_REPORT, HtmlContext, JSON_REPORT, RunDocument, escape_html, render_html, write_html,
    write_json,
};
