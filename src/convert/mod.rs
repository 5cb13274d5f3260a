//! Conversion backends
//!
//! A notebook becomes a PDF through one of two interchangeable backends:
//!
//! - `typeset`: pandoc exports straight to PDF through a TeX engine
//! - `html`: pandoc exports HTML, which a layout engine renders to PDF
//!
//! The HTML path exists for hosts without a TeX installation. `auto` picks
//! the typeset backend when its toolchain is present and falls back to HTML
//! otherwise.

mod error;
mod html;
mod toolchain;
mod typeset;

pub use error::ConversionError;
pub use html::HtmlBackend;
pub use toolchain::Toolchain;
pub use typeset::TypesetBackend;

use std::fmt;
use std::path::Path;
use std::str::FromStr;
use std::sync::Arc;

use async_trait::async_trait;
use serde::Serialize;

use crate::config::ConversionConfig;
use crate::notebook::Notebook;

/// Every PDF starts with this signature
pub const PDF_MAGIC: &[u8] = b"%PDF-";

/// Name the notebook is written under inside the workspace
pub(crate) const NOTEBOOK_FILE: &str = "notebook.ipynb";

/// Name of the produced PDF inside the workspace
pub(crate) const OUTPUT_FILE: &str = "output.pdf";

/// Which conversion backend to use
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum BackendKind {
    /// pandoc + TeX engine
    Typeset,
    /// pandoc HTML + layout engine
    Html,
    /// Typeset when available, else HTML
    Auto,
}

impl fmt::Display for BackendKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            BackendKind::Typeset => "typeset",
            BackendKind::Html => "html",
            BackendKind::Auto => "auto",
        };
        f.write_str(name)
    }
}

impl FromStr for BackendKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "typeset" | "latex" | "tex" => Ok(BackendKind::Typeset),
            "html" | "weasyprint" => Ok(BackendKind::Html),
            "auto" => Ok(BackendKind::Auto),
            other => Err(format!(
                "unknown conversion backend '{}', expected typeset, html or auto",
                other
            )),
        }
    }
}

/// Everything a backend needs for one conversion
#[derive(Debug)]
pub struct ConversionJob<'a> {
    pub notebook: &'a Notebook,

    /// Document title shown in the PDF
    pub title: &'a str,

    /// Request scratch directory for intermediate files
    pub workspace: &'a Path,
}

/// Notebook to PDF conversion strategy
#[async_trait]
pub trait ConversionBackend: Send + Sync {
    /// Backend identity, never `Auto`
    fn kind(&self) -> BackendKind;

    /// Check that the external tools this backend needs can be run
    async fn is_available(&self) -> bool;

    /// Convert a notebook, returning the PDF bytes
    async fn to_pdf(&self, job: &ConversionJob<'_>) -> Result<Vec<u8>, ConversionError>;
}

/// Build the backend named in the configuration
pub async fn select_backend(config: &ConversionConfig) -> Arc<dyn ConversionBackend> {
    let toolchain = Toolchain::new(config.toolchain_path.clone(), config.timeout());

    let typeset = || {
        TypesetBackend::new(
            toolchain.clone(),
            config.pandoc.clone(),
            config.pdf_engine.clone(),
        )
    };
    let html = || {
        HtmlBackend::new(
            toolchain.clone(),
            config.pandoc.clone(),
            config.layout_engine.clone(),
        )
    };

    let backend: Arc<dyn ConversionBackend> = match config.backend {
        BackendKind::Typeset => Arc::new(typeset()),
        BackendKind::Html => Arc::new(html()),
        BackendKind::Auto => {
            let candidate = typeset();
            if candidate.is_available().await {
                tracing::info!("TeX toolchain found, using typeset backend");
                Arc::new(candidate)
            } else {
                tracing::info!("TeX toolchain not found, falling back to html backend");
                Arc::new(html())
            }
        }
    };

    backend
}

/// Write the notebook into the workspace for the external tools
pub(crate) async fn write_notebook(job: &ConversionJob<'_>) -> Result<std::path::PathBuf, ConversionError> {
    let path = job.workspace.join(NOTEBOOK_FILE);
    tokio::fs::write(&path, job.notebook.to_json()?).await?;
    Ok(path)
}

/// Read a produced PDF and check its signature
pub(crate) async fn read_pdf(path: &Path) -> Result<Vec<u8>, ConversionError> {
    let bytes = match tokio::fs::read(path).await {
        Ok(bytes) => bytes,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            return Err(ConversionError::MissingOutput(path.to_path_buf()))
        }
        Err(e) => return Err(e.into()),
    };

    if !bytes.starts_with(PDF_MAGIC) {
        return Err(ConversionError::InvalidOutput);
    }

    Ok(bytes)
}

// ============================================================================
// Tests
// ============================================================================
