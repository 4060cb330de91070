//! Best-effort screenshot capture tied to a test identifier.

use std::path::Path;

use tracing::{debug, warn};

use super::backend::BrowserSession;
use super::types::ScreenshotError;
use super::utils::screenshot_filename;

/// Capture the session's viewport for `nodeid` into `screenshots_dir`.
///
/// Returns the written file's path relative to `run_dir`, using `/` as the
/// separator so the value can be embedded in HTML and JSON unchanged.
pub fn capture_for_test(
    session: &mut dyn BrowserSession,
    screenshots_dir: &Path,
    run_dir: &Path,
    nodeid: &str,
) -> Result<String, ScreenshotError> {
    let path = screenshots_dir.join(screenshot_filename(nodeid));

    let saved = match session.save_screenshot(&path) {
        Ok(saved) => saved,
        Err(err) => {
            warn!("screenshot for {} failed: {}", nodeid, err);
            return Err(err.into());
        }
    };
    if !saved {
        warn!("screenshot for {} was refused by the {} session", nodeid, session.source_type());
        return Err(ScreenshotError::Rejected);
    }

    let relative = path
        .strip_prefix(run_dir)
        .map_err(|_| ScreenshotError::OutsideRunDir {
            path: path.clone(),
            run_dir: run_dir.to_path_buf(),
        })?;

    let relative = relative
        .components()
        .map(|c| c.as_os_str().to_string_lossy())
        .collect::<Vec<_>>()
        .join("/");
    debug!("saved screenshot {} for {}", relative, nodeid);
    Ok(relative)
}
