//! Launching an external browser suite and discovering its test files.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::process::{Command, Stdio};

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, info};
use walkdir::WalkDir;

use crate::config::{
    ENV_ADMIN_PASS, ENV_ADMIN_USER, ENV_HEADLESS, ENV_MP_PASSWORD, SiteSettings,
};

/// Result type for runner operations
pub type RunnerResult<T> = Result<T, RunnerError>;

#[derive(Debug, Error)]
pub enum RunnerError {
    #[error("failed to launch {program}: {source}")]
    Spawn {
        program: String,
        #[source]
        source: std::io::Error,
    },

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Captured result of one suite invocation
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunOutput {
    /// Process exit code; `None` if it was killed by a signal
    pub exit_code: Option<i32>,

    /// Combined stdout followed by stderr
    pub output: String,
}

impl RunOutput {
    pub fn success(&self) -> bool {
        self.exit_code == Some(0)
    }
}

/// A test command line plus the environment it runs in
#[derive(Debug, Clone)]
pub struct TestCommand {
    pub program: String,
    pub args: Vec<String>,
    /// Test files or node ids appended after `args`; empty means "everything"
    pub targets: Vec<String>,
    pub env_overrides: BTreeMap<String, String>,
    /// Variables removed from the inherited environment
    pub env_removed: Vec<String>,
    pub cwd: PathBuf,
}

impl TestCommand {
    pub fn new(program: impl Into<String>, cwd: impl Into<PathBuf>) -> Self {
        Self {
            program: program.into(),
            args: Vec::new(),
            targets: Vec::new(),
            env_overrides: BTreeMap::new(),
            env_removed: Vec::new(),
            cwd: cwd.into(),
        }
    }

    /// `pytest -q` in `repo_root`
    pub fn pytest(repo_root: impl Into<PathBuf>) -> Self {
        Self::new("pytest", repo_root).arg("-q")
    }

    pub fn arg(mut self, arg: impl Into<String>) -> Self {
        self.args.push(arg.into());
        self
    }

    pub fn args(mut self, args: impl IntoIterator<Item = impl Into<String>>) -> Self {
        self.args.extend(args.into_iter().map(Into::into));
        self
    }

    pub fn targets(mut self, targets: impl IntoIterator<Item = impl Into<String>>) -> Self {
        self.targets.extend(targets.into_iter().map(Into::into));
        self
    }

    pub fn env(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.env_overrides.insert(key.into(), value.into());
        self
    }

    /// Apply the site settings the browser suite reads from its environment
    pub fn site_env(mut self, site: &SiteSettings) -> Self {
        let env = SuiteEnv::from_settings(site);
        self.env_overrides.extend(env.set);
        self.env_removed.extend(env.removed);
        self
    }

    /// Full argument vector after the program name
    pub fn argv(&self) -> Vec<String> {
        self.args.iter().chain(self.targets.iter()).cloned().collect()
    }

    /// Human-readable command line, e.g. for logging
    pub fn display(&self) -> String {
        std::iter::once(self.program.clone())
            .chain(self.argv())
            .collect::<Vec<_>>()
            .join(" ")
    }
}

/// Environment overrides for a suite run
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SuiteEnv {
    pub set: BTreeMap<String, String>,
    pub removed: Vec<String>,
}

impl SuiteEnv {
    /// `HEADLESS` is always set; credentials only when non-empty.
    /// An empty meal planner password is removed so a stale value cannot leak in.
    pub fn from_settings(site: &SiteSettings) -> Self {
        let mut env = Self::default();
        env.set.insert(
            ENV_HEADLESS.to_string(),
            if site.headless { "true" } else { "false" }.to_string(),
        );

        let user = site.admin_user.trim();
        if !user.is_empty() {
            env.set.insert(ENV_ADMIN_USER.to_string(), user.to_string());
        }
        let pass = site.admin_pass.trim();
        if !pass.is_empty() {
            env.set.insert(ENV_ADMIN_PASS.to_string(), pass.to_string());
        }

        let mp = site.mp_password.trim();
        if mp.is_empty() {
            env.removed.push(ENV_MP_PASSWORD.to_string());
        } else {
            env.set.insert(ENV_MP_PASSWORD.to_string(), mp.to_string());
        }
        env
    }
}

/// Run the command to completion, capturing its output
pub fn run_tests(command: &TestCommand) -> RunnerResult<RunOutput> {
    info!("$ {}", command.display());

    let mut cmd = Command::new(&command.program);
    cmd.args(command.argv())
        .current_dir(&command.cwd)
        .stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped());
    for key in &command.env_removed {
        cmd.env_remove(key);
    }
    cmd.envs(&command.env_overrides);

    let output = cmd.output().map_err(|source| RunnerError::Spawn {
        program: command.program.clone(),
        source,
    })?;

    let mut text = String::from_utf8_lossy(&output.stdout).into_owned();
    text.push_str(&String::from_utf8_lossy(&output.stderr));

    let result = RunOutput {
        exit_code: output.status.code(),
        output: text,
    };
    debug!("{} exited with {:?}", command.program, result.exit_code);
    Ok(result)
}

/// Find `test_*` files under `tests_dir`, sorted, relative to its parent.
///
/// Only files with `extension` (e.g. `"py"`) are returned. A missing
/// directory yields an empty list.
pub fn discover_tests(tests_dir: &Path, extension: &str) -> Vec<String> {
    if !tests_dir.is_dir() {
        return Vec::new();
    }
    let base = tests_dir.parent().unwrap_or(tests_dir);

    let mut found: Vec<String> = WalkDir::new(tests_dir)
        .into_iter()
        .filter_map(Result::ok)
        .filter(|entry| entry.file_type().is_file())
        .filter(|entry| {
            let path = entry.path();
            let name_ok = path
                .file_name()
                .map(|n| n.to_string_lossy().starts_with("test_"))
                .unwrap_or(false);
            let ext_ok = path.extension().map(|e| e == extension).unwrap_or(false);
            name_ok && ext_ok
        })
        .filter_map(|entry| {
            entry.path().strip_prefix(base).ok().map(|rel| {
                rel.components()
                    .map(|c| c.as_os_str().to_string_lossy())
                    .collect::<Vec<_>>()
                    .join("/")
            })
        })
        .collect();
    found.sort();
    found
}
