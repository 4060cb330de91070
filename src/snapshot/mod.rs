pub mod backend;
pub mod capture;
pub mod types;
pub mod utils;

pub use backend::{BrowserSession, MockPage};
pub use capture::capture_for_test;
pub use types::{ScreenshotError, SnapshotError, SnapshotResult};
pub use utils::{RUN_DIR_FORMAT, run_dir_name, sanitize_name, screenshot_filename};
