//! Per-request scratch directories
//!
//! Every conversion gets its own directory under the staging root. The
//! directory is removed when the request finishes, whichever way it ends.

use std::io;
use std::path::{Path, PathBuf};

use tempfile::TempDir;

/// Prefix shared by every scratch directory name
pub const SCRATCH_PREFIX: &str = "nbpdf-";

/// Creates scratch directories under a fixed root
#[derive(Debug, Clone)]
pub struct StagingArea {
    root: PathBuf,
}

impl StagingArea {
    /// A relative root is anchored to the current directory, so paths
    /// handed to tools running inside a scratch directory stay valid
    pub fn new(root: impl Into<PathBuf>) -> Self {
        let root = root.into();
        let root = std::path::absolute(&root).unwrap_or(root);
        Self { root }
    }

    /// Root that scratch directories are created in
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Make sure the root exists
    pub fn ensure_root(&self) -> io::Result<()> {
        std::fs::create_dir_all(&self.root)
    }

    /// Create a fresh, uniquely named scratch directory
    pub fn acquire(&self) -> io::Result<ScratchDir> {
        let dir = tempfile::Builder::new()
            .prefix(SCRATCH_PREFIX)
            .tempdir_in(&self.root)?;

        tracing::debug!("Created scratch directory: {}", dir.path().display());

        Ok(ScratchDir {
            path: dir.path().to_path_buf(),
            dir: Some(dir),
        })
    }
}

/// A scratch directory owned by exactly one request
///
/// Removed by [`ScratchDir::close`], or on drop if close was never reached.
#[derive(Debug)]
pub struct ScratchDir {
    path: PathBuf,
    dir: Option<TempDir>,
}

impl ScratchDir {
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Write an uploaded file into the directory, returning its path
    pub async fn stage(&self, filename: &str, bytes: &[u8]) -> io::Result<PathBuf> {
        let target = self.path.join(filename);
        tokio::fs::write(&target, bytes).await?;
        tracing::debug!("Saved upload to: {}", target.display());
        Ok(target)
    }

    /// Remove the directory and everything in it
    pub fn close(mut self) {
        if let Some(dir) = self.dir.take() {
            release(dir);
        }
    }
}

impl Drop for ScratchDir {
    fn drop(&mut self) {
        if let Some(dir) = self.dir.take() {
            release(dir);
        }
    }
}

/// Cleanup failures are logged and otherwise ignored
fn release(dir: TempDir) {
    let path = dir.path().to_path_buf();
    match dir.close() {
        Ok(()) => tracing::debug!("Removed scratch directory: {}", path.display()),
        Err(e) => tracing::error!(
            "Failed to clean up scratch directory {}: {}",
            path.display(),
            e
        ),
    }
}

// ============================================================================
// Tests
// ============================================================================
