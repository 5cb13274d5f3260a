//! External toolchain invocation
//!
//! Tools are located through an explicit list of search directories that is
//! handed to each child process as its `PATH`. The server's own environment
//! is left untouched.

use std::ffi::{OsStr, OsString};
use std::path::{Path, PathBuf};
use std::process::{Output, Stdio};
use std::time::Duration;

use tokio::process::Command;

use super::error::ConversionError;

/// Longest stderr excerpt carried in an error message
const MAX_STDERR_CHARS: usize = 2000;

/// How long `--version` checks may take
const VERSION_CHECK_TIMEOUT: Duration = Duration::from_secs(10);

/// Search path and limits for external conversion tools
#[derive(Debug, Clone)]
pub struct Toolchain {
    search_path: Vec<PathBuf>,
    timeout: Duration,
}

impl Toolchain {
    /// Relative search directories are anchored to the current directory,
    /// since tools run with the request workspace as their working directory
    pub fn new(search_path: Vec<PathBuf>, timeout: Duration) -> Self {
        Self {
            search_path: search_path.iter().map(|dir| absolute(dir)).collect(),
            timeout,
        }
    }

    /// Resolve a program name against the search directories.
    ///
    /// Paths with a directory component are used as given. Bare names not
    /// found in any search directory are left for the OS to look up.
    pub fn resolve(&self, program: &str) -> PathBuf {
        let candidate = Path::new(program);
        if candidate.is_absolute() || candidate.components().count() > 1 {
            return absolute(candidate);
        }

        for dir in &self.search_path {
            let path = dir.join(program);
            if path.is_file() {
                return path;
            }
            #[cfg(windows)]
            {
                let exe = path.with_extension("exe");
                if exe.is_file() {
                    return exe;
                }
            }
        }

        candidate.to_path_buf()
    }

    /// `PATH` for child processes: search directories first, then the
    /// inherited value
    fn child_path(&self) -> Option<OsString> {
        if self.search_path.is_empty() {
            return None;
        }

        let inherited = std::env::var_os("PATH");
        let dirs = self
            .search_path
            .iter()
            .cloned()
            .chain(inherited.iter().flat_map(std::env::split_paths));

        match std::env::join_paths(dirs) {
            Ok(path) => Some(path),
            Err(e) => {
                tracing::warn!("Toolchain path cannot be joined: {}", e);
                None
            }
        }
    }

    fn command(&self, program: &str) -> Command {
        let mut cmd = Command::new(self.resolve(program));
        if let Some(path) = self.child_path() {
            cmd.env("PATH", path);
        }
        cmd.stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true);
        cmd
    }

    /// Check whether a tool answers `--version`
    pub async fn is_installed(&self, program: &str) -> bool {
        let output = tokio::time::timeout(
            VERSION_CHECK_TIMEOUT,
            self.command(program).arg("--version").output(),
        )
        .await;

        matches!(output, Ok(Ok(o)) if o.status.success())
    }

    /// Run a tool to completion in `cwd`, killing it after the timeout
    pub async fn run<I, S>(&self, program: &str, args: I, cwd: &Path) -> Result<Output, ConversionError>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<OsStr>,
    {
        let mut cmd = self.command(program);
        cmd.args(args).current_dir(cwd);

        tracing::debug!("Running {:?}", cmd.as_std());

        let child = cmd.spawn().map_err(|e| {
            if e.kind() == std::io::ErrorKind::NotFound {
                ConversionError::ToolchainMissing {
                    program: program.to_string(),
                }
            } else {
                ConversionError::Io(e)
            }
        })?;

        let output = tokio::time::timeout(self.timeout, child.wait_with_output())
            .await
            .map_err(|_| ConversionError::Timeout {
                program: program.to_string(),
                secs: self.timeout.as_secs(),
            })??;

        if !output.status.success() {
            return Err(ConversionError::ToolFailed {
                program: program.to_string(),
                status: output.status.to_string(),
                stderr: stderr_excerpt(&output.stderr),
            });
        }

        Ok(output)
    }
}

/// Anchor a relative path to the current directory
pub(crate) fn absolute(path: &Path) -> PathBuf {
    std::path::absolute(path).unwrap_or_else(|_| path.to_path_buf())
}

/// Last part of a tool's stderr, where the actual error usually is
fn stderr_excerpt(stderr: &[u8]) -> String {
    let text = String::from_utf8_lossy(stderr);
    let text = text.trim();
    let count = text.chars().count();
    if count <= MAX_STDERR_CHARS {
        return text.to_string();
    }
    let tail: String = text.chars().skip(count - MAX_STDERR_CHARS).collect();
    format!("...{}", tail)
}

// ============================================================================
// Tests
// ============================================================================
