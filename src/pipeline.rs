//! Conversion pipeline
//!
//! Stage the upload, load the notebook, hand it to the backend, clean up.
//! The scratch directory is released before the result is returned, on
//! success and failure alike.

use std::sync::Arc;

use tracing::Instrument;
use uuid::Uuid;

use crate::convert::{ConversionBackend, ConversionJob};
use crate::error::Result;
use crate::notebook::load_notebook;
use crate::staging::{ScratchDir, StagingArea};
use crate::upload::UploadedNotebook;

/// A finished conversion, ready to send
#[derive(Debug, Clone)]
pub struct ConvertedPdf {
    pub bytes: Vec<u8>,
    pub download_name: String,
}

/// Runs uploads through staging and a conversion backend
#[derive(Clone)]
pub struct Converter {
    staging: StagingArea,
    backend: Arc<dyn ConversionBackend>,
}

impl Converter {
    pub fn new(staging: StagingArea, backend: Arc<dyn ConversionBackend>) -> Self {
        Self { staging, backend }
    }

    pub fn backend(&self) -> &dyn ConversionBackend {
        self.backend.as_ref()
    }

    pub fn staging(&self) -> &StagingArea {
        &self.staging
    }

    /// Convert one uploaded notebook
    pub async fn convert(&self, upload: UploadedNotebook) -> Result<ConvertedPdf> {
        let span = tracing::info_span!(
            "convert",
            request_id = %Uuid::new_v4(),
            file = %upload.filename
        );

        async move {
            tracing::info!("Starting conversion with {} backend", self.backend.kind());

            let scratch = self.staging.acquire()?;
            let result = self.run(&scratch, upload).await;
            scratch.close();

            if let Ok(pdf) = &result {
                tracing::info!(
                    size = pdf.bytes.len(),
                    "Converted to {}",
                    pdf.download_name
                );
            }

            result
        }
        .instrument(span)
        .await
    }

    async fn run(&self, scratch: &ScratchDir, upload: UploadedNotebook) -> Result<ConvertedPdf> {
        let download_name = upload.download_name();
        let stem = upload.stem().to_string();

        let path = scratch.stage(&upload.filename, &upload.bytes).await?;
        drop(upload);

        let notebook = load_notebook(&path).await?;
        let title = notebook.title().unwrap_or(&stem).to_string();

        let job = ConversionJob {
            notebook: &notebook,
            title: &title,
            workspace: scratch.path(),
        };
        let bytes = self.backend.to_pdf(&job).await?;

        Ok(ConvertedPdf {
            bytes,
            download_name,
        })
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::convert::{BackendKind, ConversionError};
    use crate::error::AppError;
    use async_trait::async_trait;
    use axum::body::Bytes;
    use std::sync::Mutex;
    use tempfile::TempDir;

    /// Records the job it was given and returns a canned PDF
    #[derive(Default)]
    struct RecordingBackend {
        seen: Mutex<Vec<(String, bool)>>,
    }

    #[async_trait]
    impl ConversionBackend for RecordingBackend {
        fn kind(&self) -> BackendKind {
            BackendKind::Html
        }

        async fn is_available(&self) -> bool {
            true
        }

        async fn to_pdf(&self, job: &ConversionJob<'_>) -> std::result::Result<Vec<u8>, ConversionError> {
            self.seen
                .lock()
                .unwrap()
                .push((job.title.to_string(), job.workspace.is_dir()));
            Ok(b"%PDF-1.7\n%%EOF".to_vec())
        }
    }

    struct BrokenBackend;

    #[async_trait]
    impl ConversionBackend for BrokenBackend {
        fn kind(&self) -> BackendKind {
            BackendKind::Typeset
        }

        async fn is_available(&self) -> bool {
            false
        }

        async fn to_pdf(&self, _job: &ConversionJob<'_>) -> std::result::Result<Vec<u8>, ConversionError> {
            Err(ConversionError::ToolchainMissing {
                program: "xelatex".to_string(),
            })
        }
    }

    const NOTEBOOK: &[u8] = br#"{"cells": [], "metadata": {}, "nbformat": 4, "nbformat_minor": 5}"#;

    fn upload(name: &str, bytes: &'static [u8]) -> UploadedNotebook {
        UploadedNotebook::new(name, Bytes::from_static(bytes)).unwrap()
    }

    fn leftovers(root: &TempDir) -> usize {
        std::fs::read_dir(root.path()).unwrap().count()
    }

    #[tokio::test]
    async fn test_convert_success() {
        let root = TempDir::new().unwrap();
        let backend = Arc::new(RecordingBackend::default());
        let converter = Converter::new(StagingArea::new(root.path()), backend.clone());

        let pdf = converter.convert(upload("report.ipynb", NOTEBOOK)).await.unwrap();

        assert!(pdf.bytes.starts_with(b"%PDF-"));
        assert_eq!(pdf.download_name, "report.pdf");
        assert_eq!(
            backend.seen.lock().unwrap().as_slice(),
            &[("report".to_string(), true)]
        );
        assert_eq!(leftovers(&root), 0);
    }

    #[tokio::test]
    async fn test_metadata_title_wins() {
        let root = TempDir::new().unwrap();
        let backend = Arc::new(RecordingBackend::default());
        let converter = Converter::new(StagingArea::new(root.path()), backend.clone());

        let titled: &'static [u8] =
            br#"{"cells": [], "metadata": {"title": "Week 3"}, "nbformat": 4, "nbformat_minor": 5}"#;
        converter.convert(upload("lab.ipynb", titled)).await.unwrap();

        assert_eq!(backend.seen.lock().unwrap()[0].0, "Week 3");
    }

    #[tokio::test]
    async fn test_parse_failure_cleans_up() {
        let root = TempDir::new().unwrap();
        let converter = Converter::new(
            StagingArea::new(root.path()),
            Arc::new(RecordingBackend::default()),
        );

        let err = converter
            .convert(upload("broken.ipynb", b"{not json"))
            .await
            .unwrap_err();

        assert!(matches!(err, AppError::Parse(_)));
        assert_eq!(leftovers(&root), 0);
    }

    #[tokio::test]
    async fn test_backend_failure_cleans_up() {
        let root = TempDir::new().unwrap();
        let converter = Converter::new(StagingArea::new(root.path()), Arc::new(BrokenBackend));

        let err = converter
            .convert(upload("report.ipynb", NOTEBOOK))
            .await
            .unwrap_err();

        assert!(matches!(err, AppError::Conversion(_)));
        assert_eq!(leftovers(&root), 0);
    }

    #[tokio::test]
    async fn test_missing_staging_root_is_a_staging_error() {
        let root = TempDir::new().unwrap();
        let converter = Converter::new(
            StagingArea::new(root.path().join("does-not-exist")),
            Arc::new(RecordingBackend::default()),
        );

        let err = converter
            .convert(upload("report.ipynb", NOTEBOOK))
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::Staging(_)));
    }

    #[tokio::test]
    async fn test_concurrent_conversions_do_not_collide() {
        let root = TempDir::new().unwrap();
        let converter = Converter::new(
            StagingArea::new(root.path()),
            Arc::new(RecordingBackend::default()),
        );

        let (a, b) = tokio::join!(
            converter.convert(upload("same.ipynb", NOTEBOOK)),
            converter.convert(upload("same.ipynb", NOTEBOOK)),
        );

        assert!(a.is_ok());
        assert!(b.is_ok());
        assert_eq!(leftovers(&root), 0);
    }
}
