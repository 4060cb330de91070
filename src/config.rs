//! Configuration management with environment variable support.
//!
//! This module provides centralized configuration, supporting:
//! - Environment variables for all configurable values
//! - Sensible defaults when a variable is unset or unparsable
//! - A cached global plus `defaults()` for code that must ignore the environment
//!
//! # Environment Variables
//!
//! | Variable | Description | Default |
//! |----------|-------------|---------|
//! | `WP_REPORT_DIR` | Root directory for run reports | `./reports` |
//! | `WP_REPORT_TITLE` | Heading of the HTML report | `WP Selenium Test Report` |
//! | `HEADLESS` | Run the browser without a window | `false` |
//! | `WP_ADMIN_USER` | WordPress admin user for admin-page tests | (empty) |
//! | `WP_ADMIN_PASS` | WordPress admin password | (empty) |
//! | `MP_PASSWORD` | Meal planner page password | (empty) |
//! | `WP_WAIT_TIMEOUT_MS` | Default UI wait timeout (ms) | `10000` |
//! | `WP_POLL_INTERVAL_MS` | Default UI poll interval (ms) | `500` |
//!
//! # Example
//!
//! ```bash
//! export WP_REPORT_DIR="/var/tmp/wp-reports"
//! export HEADLESS=1
//! ```

use std::env;
use std::path::PathBuf;
use std::sync::OnceLock;
use std::time::Duration;

// ============================================================================
// Default Values
// ============================================================================

/// Default root directory for reports
pub const DEFAULT_REPORT_DIR: &str = "./reports";

/// Default report heading
pub const DEFAULT_REPORT_TITLE: &str = "WP Selenium Test Report";

/// Default UI wait timeout (milliseconds)
pub const DEFAULT_WAIT_TIMEOUT_MS: u64 = 10_000;

/// Default UI poll interval (milliseconds)
pub const DEFAULT_POLL_INTERVAL_MS: u64 = 500;

// ============================================================================
// Environment Variable Names
// ============================================================================

pub const ENV_REPORT_DIR: &str = "WP_REPORT_DIR";
pub const ENV_REPORT_TITLE: &str = "WP_REPORT_TITLE";
pub const ENV_HEADLESS: &str = "HEADLESS";
pub const ENV_ADMIN_USER: &str = "WP_ADMIN_USER";
pub const ENV_ADMIN_PASS: &str = "WP_ADMIN_PASS";
pub const ENV_MP_PASSWORD: &str = "MP_PASSWORD";
pub const ENV_WAIT_TIMEOUT: &str = "WP_WAIT_TIMEOUT_MS";
pub const ENV_POLL_INTERVAL: &str = "WP_POLL_INTERVAL_MS";

// ============================================================================
// Global configuration
// ============================================================================

static CONFIG: OnceLock<Config> = OnceLock::new();

/// Get the global configuration (initialized from environment on first access)
pub fn get() -> &'static Config {
    CONFIG.get_or_init(Config::from_env)
}

/// Centralized configuration
#[derive(Debug, Clone)]
pub struct Config {
    pub report: ReportSettings,
    pub site: SiteSettings,
    pub wait: WaitSettings,
}

/// Where and how reports are written
#[derive(Debug, Clone)]
pub struct ReportSettings {
    /// Root directory; each run gets a timestamped subdirectory
    pub root: PathBuf,
    pub title: String,
}

/// Settings forwarded to the browser suite
#[derive(Debug, Clone, Default)]
pub struct SiteSettings {
    pub headless: bool,
    pub admin_user: String,
    pub admin_pass: String,
    pub mp_password: String,
}

/// Defaults for UI-state polling
#[derive(Debug, Clone, Copy)]
pub struct WaitSettings {
    pub timeout: Duration,
    pub interval: Duration,
}

impl Config {
    /// Create configuration from environment variables, falling back to defaults
    pub fn from_env() -> Self {
        Self::from_lookup(|name| env::var(name).ok())
    }

    /// Create configuration with all defaults (ignoring environment)
    pub fn defaults() -> Self {
        Self::from_lookup(|_| None)
    }

    /// Build configuration from an arbitrary variable source
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let millis = |name: &str, default: u64| {
            Duration::from_millis(
                lookup(name)
                    .and_then(|s| s.trim().parse().ok())
                    .unwrap_or(default),
            )
        };

        Self {
            report: ReportSettings {
                root: lookup(ENV_REPORT_DIR)
                    .filter(|s| !s.trim().is_empty())
                    .map(PathBuf::from)
                    .unwrap_or_else(|| PathBuf::from(DEFAULT_REPORT_DIR)),
                title: lookup(ENV_REPORT_TITLE)
                    .filter(|s| !s.trim().is_empty())
                    .unwrap_or_else(|| DEFAULT_REPORT_TITLE.to_string()),
            },
            site: SiteSettings {
                headless: lookup(ENV_HEADLESS)
                    .map(|s| parse_bool(&s))
                    .unwrap_or(false),
                admin_user: lookup(ENV_ADMIN_USER).unwrap_or_default(),
                admin_pass: lookup(ENV_ADMIN_PASS).unwrap_or_default(),
                mp_password: lookup(ENV_MP_PASSWORD).unwrap_or_default(),
            },
            wait: WaitSettings {
                timeout: millis(ENV_WAIT_TIMEOUT, DEFAULT_WAIT_TIMEOUT_MS),
                interval: millis(ENV_POLL_INTERVAL, DEFAULT_POLL_INTERVAL_MS),
            },
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self::from_env()
    }
}

// ============================================================================
// Helper Functions
// ============================================================================

/// Interpret a flag value: `1`, `true`, `yes`, `y`, `on` (any case) are true
pub fn parse_bool(value: &str) -> bool {
    matches!(
        value.trim().to_lowercase().as_str(),
        "1" | "true" | "yes" | "y" | "on"
    )
}

/// Get the reports root directory (convenience function)
pub fn report_dir() -> PathBuf {
    get().report.root.clone()
}

/// Get the default wait settings (convenience function)
pub fn wait_settings() -> WaitSettings {
    get().wait
}
