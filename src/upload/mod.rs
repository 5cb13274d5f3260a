//! Notebook upload handling
//!
//! Pulls the `file` field out of a multipart request and validates it
//! before anything touches the filesystem.

pub mod types;

pub use types::{download_name, validate_filename, UploadError, UploadedNotebook, FILE_FIELD};

use axum::extract::Multipart;

/// Read the notebook field from a multipart body.
///
/// Other fields are skipped. The first `file` field wins.
pub async fn extract_upload(mut multipart: Multipart) -> Result<UploadedNotebook, UploadError> {
    while let Some(field) = multipart.next_field().await? {
        if field.name() != Some(FILE_FIELD) {
            tracing::debug!("Skipping multipart field {:?}", field.name());
            continue;
        }

        let filename = field.file_name().unwrap_or("").to_string();
        // Reject before buffering the body
        let filename = validate_filename(&filename)?;
        let bytes = field.bytes().await?;

        tracing::debug!("Read {} bytes for {}", bytes.len(), filename);

        return UploadedNotebook::new(&filename, bytes);
    }

    Err(UploadError::MissingFile)
}
