//! Turns an uploaded file into plain resume text.

use bytes::Bytes;
use tracing::debug;

use crate::errors::AppError;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UploadKind {
    Pdf,
    Text,
}

/// Decides the file kind from content type, extension and magic bytes, in that order.
pub fn detect_kind(file_name: Option<&str>, content_type: Option<&str>, data: &[u8]) -> Option<UploadKind> {
    let content_type = content_type.map(|c| c.to_ascii_lowercase());
    let extension = file_name
        .and_then(|name| name.rsplit_once('.'))
        .map(|(_, ext)| ext.to_ascii_lowercase());

    match content_type.as_deref() {
        Some("application/pdf") => return Some(UploadKind::Pdf),
        Some(ct) if ct.starts_with("text/") => return Some(UploadKind::Text),
        _ => {}
    }
    match extension.as_deref() {
        Some("pdf") => return Some(UploadKind::Pdf),
        Some("txt" | "md" | "markdown" | "text") => return Some(UploadKind::Text),
        _ => {}
    }
    if data.starts_with(b"%PDF") {
        Some(UploadKind::Pdf)
    } else if std::str::from_utf8(data).is_ok() {
        Some(UploadKind::Text)
    } else {
        None
    }
}

/// Extracts and normalizes text. PDF parsing runs on the blocking pool.
pub async fn extract_text(kind: UploadKind, data: Bytes) -> Result<String, AppError> {
    let raw = match kind {
        UploadKind::Pdf => tokio::task::spawn_blocking(move || pdf_extract::extract_text_from_mem(&data))
            .await
            // pdf-extract panics on some malformed files
            .map_err(|e| AppError::UnprocessableEntity(format!("Could not read PDF: {e}")))?
            .map_err(|e| AppError::UnprocessableEntity(format!("Could not read PDF: {e}")))?,
        UploadKind::Text => String::from_utf8(data.to_vec())
            .map_err(|_| AppError::UnprocessableEntity("Text upload is not valid UTF-8".to_string()))?,
    };

    let text = normalize_text(&raw);
    debug!(kind = ?kind, chars = text.len(), "Extracted resume text");
    if text.is_empty() {
        return Err(AppError::UnprocessableEntity(
            "No text could be extracted from the upload".to_string(),
        ));
    }
    Ok(text)
}

/// Trims each line and keeps at most one blank line between paragraphs.
pub fn normalize_text(raw: &str) -> String {
    let mut out: Vec<&str> = Vec::new();
    for line in raw.lines().map(str::trim) {
        if line.is_empty() && out.last().map_or(true, |prev| prev.is_empty()) {
            continue;
        }
        out.push(line);
    }
    while out.last().is_some_and(|l| l.is_empty()) {
        out.pop();
    }
    out.join("\n")
}
