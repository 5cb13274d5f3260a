//! Upload form and conversion endpoint
//!
//! Endpoints:
//! - GET / - Upload form
//! - POST /convert - Convert the multipart `file` field to PDF

use axum::{
    body::Body,
    extract::{multipart::MultipartRejection, DefaultBodyLimit, Multipart, State},
    http::{header, StatusCode},
    response::{Html, Response},
    routing::{get, post},
    Router,
};

use crate::error::{AppError, Result};
use crate::pipeline::ConvertedPdf;
use crate::state::AppState;
use crate::upload::{extract_upload, UploadError};

/// Upload page, compiled into the binary
const UPLOAD_FORM: &str = include_str!("../../templates/index.html");

/// Create the conversion router
pub fn router(max_upload_bytes: usize) -> Router<AppState> {
    Router::new()
        .route("/", get(upload_form))
        .route(
            "/convert",
            post(convert).layer(DefaultBodyLimit::max(max_upload_bytes)),
        )
}

/// GET /
async fn upload_form() -> Html<&'static str> {
    Html(UPLOAD_FORM)
}

/// POST /convert
///
/// Returns the PDF as an attachment named after the uploaded notebook.
async fn convert(
    State(state): State<AppState>,
    multipart: std::result::Result<Multipart, MultipartRejection>,
) -> Result<Response> {
    // A request that is not multipart cannot carry a file field
    let multipart = multipart.map_err(|e| {
        tracing::debug!("Rejected non-multipart request: {}", e);
        UploadError::MissingFile
    })?;

    let upload = extract_upload(multipart).await?;
    let pdf = state.converter().convert(upload).await?;

    tracing::info!("Sending PDF file {}", pdf.download_name);
    pdf_response(pdf)
}

fn pdf_response(pdf: ConvertedPdf) -> Result<Response> {
    Response::builder()
        .status(StatusCode::OK)
        .header(header::CONTENT_TYPE, "application/pdf")
        .header(header::CONTENT_LENGTH, pdf.bytes.len())
        .header(
            header::CONTENT_DISPOSITION,
            content_disposition(&pdf.download_name),
        )
        .body(Body::from(pdf.bytes))
        .map_err(|e| AppError::Internal(e.to_string()))
}

/// Attachment disposition with an ASCII fallback and an RFC 5987 name
fn content_disposition(filename: &str) -> String {
    let fallback: String = filename
        .chars()
        .map(|c| match c {
            '"' | '\\' => '_',
            c if c.is_ascii_graphic() || c == ' ' => c,
            _ => '_',
        })
        .collect();

    format!(
        "attachment; filename=\"{}\"; filename*=UTF-8''{}",
        fallback,
        urlencoding::encode(filename)
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_content_disposition_plain_name() {
        assert_eq!(
            content_disposition("report.pdf"),
            "attachment; filename=\"report.pdf\"; filename*=UTF-8''report.pdf"
        );
    }

    #[test]
    fn test_content_disposition_escapes_unsafe_names() {
        let value = content_disposition("résumé \"final\".pdf");
        assert!(value.starts_with("attachment; filename=\"r_sum_ _final_.pdf\""));
        assert!(value.ends_with("filename*=UTF-8''r%C3%A9sum%C3%A9%20%22final%22.pdf"));
    }

    #[test]
    fn test_upload_form_posts_file_field() {
        assert!(UPLOAD_FORM.contains("action=\"/convert\""));
        assert!(UPLOAD_FORM.contains("name=\"file\""));
        assert!(UPLOAD_FORM.contains("enctype=\"multipart/form-data\""));
    }
}
