// Core error types for screenshot capture

use std::path::PathBuf;
use thiserror::Error;

/// Result type for snapshot operations
pub type SnapshotResult<T> = Result<T, SnapshotError>;

/// Error types raised by a capture backend
#[derive(Debug, Error)]
pub enum SnapshotError {
    /// Error during capture process
    #[error("Capture error: {0}")]
    Capture(String),

    /// I/O error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Image encoding/decoding error
    #[error("Image error: {0}")]
    Image(#[from] image::ImageError),
}

/// Why a best-effort screenshot for a test did not produce a file.
///
/// Never propagated out of the outcome sink: its `Display` form becomes the
/// `(Screenshot error: ...)` line of the test's message.
#[derive(Debug, Error)]
pub enum ScreenshotError {
    /// The session accepted the call but reported that nothing was saved
    #[error("save_screenshot returned false")]
    Rejected,

    /// The session raised an error while capturing or writing
    #[error("Screenshot failed: {0}")]
    Capture(#[from] SnapshotError),

    /// The screenshot landed somewhere that cannot be expressed relative to the run
    #[error("screenshot path {} is outside run directory {}", path.display(), run_dir.display())]
    OutsideRunDir { path: PathBuf, run_dir: PathBuf },
}
