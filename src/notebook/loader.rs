//! Notebook loading
//!
//! Reads a staged `.ipynb` file and validates it against nbformat 4.
//! nbformat 3 documents are upgraded first.

use std::io;
use std::path::Path;

use serde_json::Value;
use thiserror::Error;

use super::types::{Notebook, NBFORMAT_MAJOR};
use super::upgrade::{upgrade_v3, OLDEST_UPGRADABLE};

/// The uploaded document is not a usable notebook
#[derive(Debug, Error)]
pub enum ParseError {
    #[error("Notebook is not valid UTF-8: {0}")]
    Encoding(#[from] std::str::Utf8Error),

    #[error("Notebook is not valid JSON: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Notebook has no nbformat version")]
    MissingVersion,

    #[error("Unsupported nbformat version {0}, expected 3 or 4")]
    UnsupportedVersion(u64),

    #[error("Notebook does not match nbformat 4: {0}")]
    Schema(String),

    #[error("Failed to read notebook: {0}")]
    Io(#[from] io::Error),
}

/// Read and parse a notebook from disk
pub async fn load_notebook(path: &Path) -> Result<Notebook, ParseError> {
    let bytes = tokio::fs::read(path).await?;
    let notebook = parse_notebook(&bytes)?;

    tracing::debug!(
        "Loaded notebook {} ({} cells, {} code)",
        path.display(),
        notebook.cells.len(),
        notebook.code_cell_count()
    );

    Ok(notebook)
}

/// Parse notebook bytes
pub fn parse_notebook(bytes: &[u8]) -> Result<Notebook, ParseError> {
    let text = std::str::from_utf8(bytes)?;
    // Strip a UTF-8 BOM some editors write
    let text = text.strip_prefix('\u{feff}').unwrap_or(text);

    let value: Value = serde_json::from_str(text)?;

    // Check the version first so old notebooks get a precise error rather
    // than a schema mismatch
    let version = value
        .get("nbformat")
        .and_then(Value::as_u64)
        .ok_or(ParseError::MissingVersion)?;
    let value = match version {
        v if v == u64::from(NBFORMAT_MAJOR) => value,
        OLDEST_UPGRADABLE => {
            tracing::debug!("Upgrading nbformat 3 notebook");
            upgrade_v3(value)?
        }
        other => return Err(ParseError::UnsupportedVersion(other)),
    };

    serde_json::from_value(value).map_err(|e| ParseError::Schema(e.to_string()))
}

// ============================================================================
// Tests
// ============================================================================
