//! Direct PDF export through a TeX engine

use async_trait::async_trait;

use super::{
    read_pdf, write_notebook, BackendKind, ConversionBackend, ConversionError, ConversionJob,
    Toolchain, OUTPUT_FILE,
};

/// pandoc reads the notebook and typesets it with a TeX engine.
///
/// Needs both pandoc and the engine (xelatex by default) reachable through
/// the toolchain search path.
#[derive(Debug, Clone)]
pub struct TypesetBackend {
    toolchain: Toolchain,
    pandoc: String,
    pdf_engine: String,
}

impl TypesetBackend {
    pub fn new(toolchain: Toolchain, pandoc: impl Into<String>, pdf_engine: impl Into<String>) -> Self {
        Self {
            toolchain,
            pandoc: pandoc.into(),
            pdf_engine: pdf_engine.into(),
        }
    }
}

#[async_trait]
impl ConversionBackend for TypesetBackend {
    fn kind(&self) -> BackendKind {
        BackendKind::Typeset
    }

    async fn is_available(&self) -> bool {
        self.toolchain.is_installed(&self.pandoc).await
            && self.toolchain.is_installed(&self.pdf_engine).await
    }

    async fn to_pdf(&self, job: &ConversionJob<'_>) -> Result<Vec<u8>, ConversionError> {
        let input = write_notebook(job).await?;
        let output = job.workspace.join(OUTPUT_FILE);
        let engine = self.toolchain.resolve(&self.pdf_engine);

        tracing::info!("Typesetting PDF with {}", engine.display());

        self.toolchain
            .run(
                &self.pandoc,
                [
                    input.into_os_string(),
                    "--from=ipynb".into(),
                    format!("--pdf-engine={}", engine.display()).into(),
                    "--metadata".into(),
                    format!("title={}", job.title).into(),
                    "--output".into(),
                    output.clone().into_os_string(),
                ],
                job.workspace,
            )
            .await?;

        read_pdf(&output).await
    }
}

#[cfg(all(test, unix))]
mod tests {
    use super::*;
    use crate::convert::tests::{install_script, sample_notebook, FIND_OUTPUT};
    use std::time::Duration;
    use tempfile::TempDir;

    fn backend(bin: &TempDir) -> TypesetBackend {
        TypesetBackend::new(
            Toolchain::new(vec![bin.path().to_path_buf()], Duration::from_secs(10)),
            "pandoc",
            "xelatex",
        )
    }

    #[tokio::test]
    async fn test_typeset_runs_pandoc_with_engine() {
        let bin = TempDir::new().unwrap();
        let work = TempDir::new().unwrap();
        install_script(
            bin.path(),
            "pandoc",
            &format!(
                "echo \"$@\" > args.txt\n{}\nprintf '%%PDF-1.5\\n%%%%EOF\\n' > \"$out\"",
                FIND_OUTPUT
            ),
        );

        let notebook = sample_notebook();
        let job = ConversionJob {
            notebook: &notebook,
            title: "report",
            workspace: work.path(),
        };

        let pdf = backend(&bin).to_pdf(&job).await.unwrap();
        assert!(pdf.starts_with(b"%PDF-"));

        let args = std::fs::read_to_string(work.path().join("args.txt")).unwrap();
        assert!(args.contains("--from=ipynb"));
        assert!(args.contains("--pdf-engine=xelatex"));
        assert!(args.contains("title=report"));
        assert!(work.path().join("notebook.ipynb").is_file());
    }

    #[tokio::test]
    async fn test_typeset_surfaces_tool_failure() {
        let bin = TempDir::new().unwrap();
        let work = TempDir::new().unwrap();
        install_script(
            bin.path(),
            "pandoc",
            "echo 'xelatex not found. Please select a different --pdf-engine' >&2; exit 47",
        );

        let notebook = sample_notebook();
        let job = ConversionJob {
            notebook: &notebook,
            title: "report",
            workspace: work.path(),
        };

        let err = backend(&bin).to_pdf(&job).await.unwrap_err();
        assert!(err.to_string().contains("xelatex not found"));
    }

    #[tokio::test]
    async fn test_typeset_availability_needs_engine() {
        let bin = TempDir::new().unwrap();
        install_script(bin.path(), "pandoc", "exit 0");

        let backend = TypesetBackend::new(
            Toolchain::new(vec![bin.path().to_path_buf()], Duration::from_secs(10)),
            "pandoc",
            "nbpdf-missing-engine",
        );
        assert!(!backend.is_available().await);
    }
}
