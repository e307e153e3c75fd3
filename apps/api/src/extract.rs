//! Plain-text extraction from candidate uploads and guidance documents.
//!
//! Uploads dispatch on the declared content type; guidance files on disk
//! dispatch on extension. PDF parsing and file reads are blocking work, so
//! async callers go through the `spawn_blocking` wrapper.

use std::path::Path;

use anyhow::{anyhow, Context, Result};
use bytes::Bytes;

use crate::errors::AppError;

/// One file captured from a multipart field, before extraction.
#[derive(Debug, Clone)]
pub struct UploadedFile {
    pub filename: String,
    pub content_type: String,
    pub bytes: Bytes,
}

/// Extracts plain text from an uploaded document, dispatching on the
/// declared content type. Anything other than PDF or plain text is rejected
/// with an error naming the file and the declared type.
pub fn extract_upload_text(upload: &UploadedFile) -> Result<String, AppError> {
    // Declared types may carry parameters ("text/plain; charset=utf-8").
    let media_type = upload
        .content_type
        .split(';')
        .next()
        .unwrap_or_default()
        .trim();

    match media_type {
        "application/pdf" => pdf_extract::extract_text_from_mem(&upload.bytes).map_err(|e| {
            AppError::BadUpload(format!(
                "could not extract text from PDF '{}': {e}",
                upload.filename
            ))
        }),
        "text/plain" => String::from_utf8(upload.bytes.to_vec()).map_err(|_| {
            AppError::BadUpload(format!(
                "text upload '{}' is not valid UTF-8",
                upload.filename
            ))
        }),
        other => Err(AppError::UnsupportedMedia(format!(
            "unsupported content type '{other}' for file '{}': upload PDF or plain text",
            upload.filename
        ))),
    }
}

/// Runs `extract_upload_text` on the blocking pool.
pub async fn extract_upload(upload: UploadedFile) -> Result<String, AppError> {
    tokio::task::spawn_blocking(move || extract_upload_text(&upload))
        .await
        .map_err(|e| AppError::Internal(anyhow!("text extraction task failed: {e}")))?
}

/// Extracts plain text from a guidance file on disk, dispatching on the
/// extension (case-insensitive). Returns `Ok(None)` for unrecognized
/// extensions so callers can skip them silently.
pub fn extract_file_text(path: &Path) -> Result<Option<String>> {
    let extension = path
        .extension()
        .and_then(|ext| ext.to_str())
        .map(str::to_ascii_lowercase);

    match extension.as_deref() {
        Some("txt") => std::fs::read_to_string(path)
            .map(Some)
            .with_context(|| format!("failed to read {}", path.display())),
        Some("pdf") => pdf_extract::extract_text(path)
            .map(Some)
            .with_context(|| format!("failed to extract text from {}", path.display())),
        _ => Ok(None),
    }
}
