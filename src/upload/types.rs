//! Upload types and filename rules

use axum::body::Bytes;
use axum::http::StatusCode;
use thiserror::Error;

// ============================================================================
// Constants
// ============================================================================

/// Multipart field carrying the notebook
pub const FILE_FIELD: &str = "file";

/// Extension every uploaded notebook must carry
pub const NOTEBOOK_EXTENSION: &str = ".ipynb";

/// Extension of the produced artifact
pub const PDF_EXTENSION: &str = ".pdf";

// ============================================================================
// Types
// ============================================================================

/// A validated notebook upload, held only until it is staged
#[derive(Debug, Clone)]
pub struct UploadedNotebook {
    /// Final path component of the client-supplied filename
    pub filename: String,

    /// Raw file contents
    pub bytes: Bytes,
}

impl UploadedNotebook {
    /// Validate a filename and wrap the uploaded bytes
    pub fn new(filename: &str, bytes: Bytes) -> Result<Self, UploadError> {
        let filename = validate_filename(filename)?;
        Ok(Self { filename, bytes })
    }

    /// Name offered to the client for the converted PDF
    pub fn download_name(&self) -> String {
        download_name(&self.filename)
    }

    /// Filename without the notebook extension
    pub fn stem(&self) -> &str {
        self.filename
            .strip_suffix(NOTEBOOK_EXTENSION)
            .unwrap_or(&self.filename)
    }
}

/// Client-side upload failures
#[derive(Debug, Error)]
pub enum UploadError {
    #[error("No file uploaded")]
    MissingFile,

    #[error("No file selected")]
    EmptyFilename,

    #[error("Invalid file format. Please upload a Jupyter notebook (.ipynb)")]
    InvalidExtension(String),

    #[error("Malformed upload: {0}")]
    Malformed(String),

    #[error("Upload exceeds the size limit")]
    TooLarge,
}

impl UploadError {
    pub fn status_code(&self) -> StatusCode {
        match self {
            UploadError::TooLarge => StatusCode::PAYLOAD_TOO_LARGE,
            _ => StatusCode::BAD_REQUEST,
        }
    }
}

impl From<axum::extract::multipart::MultipartError> for UploadError {
    fn from(err: axum::extract::multipart::MultipartError) -> Self {
        if err.status() == StatusCode::PAYLOAD_TOO_LARGE {
            UploadError::TooLarge
        } else {
            UploadError::Malformed(err.body_text())
        }
    }
}

// ============================================================================
// Helpers
// ============================================================================

/// Check a client-supplied filename and reduce it to its final component.
///
/// Browsers on some platforms send full paths, and a hostile client can send
/// `../` segments; only the last component is ever used on disk.
pub fn validate_filename(raw: &str) -> Result<String, UploadError> {
    let name = raw.rsplit(['/', '\\']).next().unwrap_or(raw);

    if name.is_empty() {
        return Err(UploadError::EmptyFilename);
    }

    if !name.ends_with(NOTEBOOK_EXTENSION) || name == NOTEBOOK_EXTENSION {
        return Err(UploadError::InvalidExtension(name.to_string()));
    }

    Ok(name.to_string())
}

/// Derive the PDF download name: `report.ipynb` becomes `report.pdf`
pub fn download_name(filename: &str) -> String {
    let stem = filename.strip_suffix(NOTEBOOK_EXTENSION).unwrap_or(filename);
    format!("{}{}", stem, PDF_EXTENSION)
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_download_name_replaces_extension() {
        assert_eq!(download_name("report.ipynb"), "report.pdf");
        assert_eq!(download_name("a.ipynb.ipynb"), "a.ipynb.pdf");
        assert_eq!(download_name("my notes.v2.ipynb"), "my notes.v2.pdf");
    }

    #[test]
    fn test_validate_filename_accepts_notebooks() {
        assert_eq!(validate_filename("report.ipynb").unwrap(), "report.ipynb");
    }

    #[test]
    fn test_validate_filename_strips_directories() {
        assert_eq!(validate_filename("../../etc/x.ipynb").unwrap(), "x.ipynb");
        assert_eq!(
            validate_filename("C:\\Users\\me\\lab.ipynb").unwrap(),
            "lab.ipynb"
        );
    }

    #[test]
    fn test_validate_filename_rejects_empty() {
        assert!(matches!(validate_filename(""), Err(UploadError::EmptyFilename)));
        assert!(matches!(validate_filename("dir/"), Err(UploadError::EmptyFilename)));
    }

    #[test]
    fn test_validate_filename_rejects_other_extensions() {
        for name in [
            "report.pdf",
            "report.ipynb.txt",
            "report",
            "report.IPYNB",
            ".ipynb",
            "report.ipynb ",
            "   ",
        ] {
            assert!(
                matches!(validate_filename(name), Err(UploadError::InvalidExtension(_))),
                "{name} should be rejected"
            );
        }
    }

    #[test]
    fn test_uploaded_notebook_stem() {
        let upload = UploadedNotebook::new("report.ipynb", Bytes::from_static(b"{}")).unwrap();
        assert_eq!(upload.stem(), "report");
        assert_eq!(upload.download_name(), "report.pdf");
    }

    #[test]
    fn test_upload_errors_are_client_errors() {
        assert_eq!(UploadError::MissingFile.status_code(), StatusCode::BAD_REQUEST);
        assert_eq!(
            UploadError::InvalidExtension("x.txt".into()).status_code(),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(UploadError::TooLarge.status_code(), StatusCode::PAYLOAD_TOO_LARGE);
    }
}
