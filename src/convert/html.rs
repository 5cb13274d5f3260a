//! HTML export rendered to PDF by a layout engine

use async_trait::async_trait;

use super::{
    read_pdf, write_notebook, BackendKind, ConversionBackend, ConversionError, ConversionJob,
    Toolchain, OUTPUT_FILE,
};

/// Intermediate HTML file inside the workspace
const HTML_FILE: &str = "notebook.html";

/// pandoc exports a standalone HTML page, then the layout engine paginates
/// it. The layout engine is called as `<engine> <input.html> <output.pdf>`,
/// which is the weasyprint command line.
#[derive(Debug, Clone)]
pub struct HtmlBackend {
    toolchain: Toolchain,
    pandoc: String,
    layout_engine: String,
}

impl HtmlBackend {
    pub fn new(toolchain: Toolchain, pandoc: impl Into<String>, layout_engine: impl Into<String>) -> Self {
        Self {
            toolchain,
            pandoc: pandoc.into(),
            layout_engine: layout_engine.into(),
        }
    }
}

#[async_trait]
impl ConversionBackend for HtmlBackend {
    fn kind(&self) -> BackendKind {
        BackendKind::Html
    }

    async fn is_available(&self) -> bool {
        self.toolchain.is_installed(&self.pandoc).await
            && self.toolchain.is_installed(&self.layout_engine).await
    }

    async fn to_pdf(&self, job: &ConversionJob<'_>) -> Result<Vec<u8>, ConversionError> {
        let input = write_notebook(job).await?;
        let html = job.workspace.join(HTML_FILE);
        let output = job.workspace.join(OUTPUT_FILE);

        tracing::info!("Exporting notebook to HTML");

        self.toolchain
            .run(
                &self.pandoc,
                [
                    input.into_os_string(),
                    "--from=ipynb".into(),
                    "--to=html5".into(),
                    "--standalone".into(),
                    "--embed-resources".into(),
                    "--metadata".into(),
                    format!("title={}", job.title).into(),
                    "--output".into(),
                    html.clone().into_os_string(),
                ],
                job.workspace,
            )
            .await?;

        if !html.is_file() {
            return Err(ConversionError::MissingOutput(html));
        }

        tracing::info!("Rendering HTML to PDF with {}", self.layout_engine);

        self.toolchain
            .run(&self.layout_engine, [&html, &output], job.workspace)
            .await?;

        read_pdf(&output).await
    }
}
