//! Document format detection
//!
//! Content sniffing wins over the uploader's declared MIME type, which wins
//! over the filename extension. Anything left is `Unknown`.

use std::io::Cursor;

use crate::types::{DetectionMethod, Document, DocumentFormat};

/// Result of format detection
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Detection {
    /// Detected format
    pub format: DocumentFormat,
    /// MIME type reported for the document
    pub mime: String,
    /// Which signal decided the format
    pub method: DetectionMethod,
}

impl Detection {
    fn new(format: DocumentFormat, method: DetectionMethod) -> Self {
        Self {
            format,
            mime: format.mime_type().to_string(),
            method,
        }
    }
}

/// Detect the format of a document
pub fn detect_document(doc: &Document) -> Detection {
    detect(&doc.filename, doc.declared_mime.as_deref(), &doc.data)
}

/// Detect a format from filename, declared MIME type and content
pub fn detect(filename: &str, declared_mime: Option<&str>, data: &[u8]) -> Detection {
    if let Some(format) = sniff(data) {
        tracing::debug!("{}: sniffed as {}", filename, format);
        return Detection::new(format, DetectionMethod::Sniffed);
    }

    if let Some(format) = declared_mime
        .map(DocumentFormat::from_mime)
        .filter(|f| *f != DocumentFormat::Unknown)
    {
        tracing::debug!("{}: declared as {}", filename, format);
        return Detection::new(format, DetectionMethod::Declared);
    }

    let extension = std::path::Path::new(filename)
        .extension()
        .and_then(|e| e.to_str())
        .unwrap_or_default();
    let format = DocumentFormat::from_extension(extension);
    if format != DocumentFormat::Unknown {
        tracing::debug!("{}: {} by extension", filename, format);
        return Detection::new(format, DetectionMethod::Extension);
    }

    let mime = declared_mime
        .map(|m| m.split(';').next().unwrap_or_default().trim().to_string())
        .filter(|m| !m.is_empty())
        .unwrap_or_else(|| {
            mime_guess::from_path(filename)
                .first_or_octet_stream()
                .essence_str()
                .to_string()
        });

    Detection {
        format: DocumentFormat::Unknown,
        mime,
        method: DetectionMethod::Fallback,
    }
}

/// Identify a format from the content alone
fn sniff(data: &[u8]) -> Option<DocumentFormat> {
    if data.starts_with(b"%PDF-") {
        return Some(DocumentFormat::Pdf);
    }

    if data.starts_with(b"PK\x03\x04") {
        return sniff_office_container(data);
    }

    let head = &data[..data.len().min(1024)];
    let head = head.strip_prefix(b"\xEF\xBB\xBF").unwrap_or(head);
    let start = head.iter().position(|b| !b.is_ascii_whitespace())?;
    let head = &head[start..];

    if head.starts_with(b"<?xml") {
        return Some(DocumentFormat::Xml);
    }

    let lower: Vec<u8> = head.iter().take(64).map(u8::to_ascii_lowercase).collect();
    if lower.starts_with(b"<!doctype html") || lower.starts_with(b"<html") {
        return Some(DocumentFormat::Html);
    }

    if matches!(head.first(), Some(b'{') | Some(b'[')) {
        if serde_json::from_slice::<serde_json::Value>(data).is_ok() {
            return Some(DocumentFormat::Json);
        }
    }

    None
}

/// Inspect a ZIP container for Office Open XML parts
fn sniff_office_container(data: &[u8]) -> Option<DocumentFormat> {
    let archive = zip::ZipArchive::new(Cursor::new(data)).ok()?;
    let format = archive.file_names().find_map(|name| match name {
        "word/document.xml" => Some(DocumentFormat::Docx),
        "xl/workbook.xml" => Some(DocumentFormat::Xlsx),
        "ppt/presentation.xml" => Some(DocumentFormat::Pptx),
        _ => None,
    });
    format
}

/// MIME type of an image document, if it is one the vision model accepts
pub fn image_mime(doc: &Document) -> Option<&'static str> {
    let data = &doc.data;
    if data.starts_with(b"\x89PNG\r\n\x1a\n") {
        return Some("image/png");
    }
    if data.starts_with(b"\xFF\xD8\xFF") {
        return Some("image/jpeg");
    }
    if data.len() >= 12 && &data[..4] == b"RIFF" && &data[8..12] == b"WEBP" {
        return Some("image/webp");
    }

    match doc.extension().as_deref() {
        Some("png") => Some("image/png"),
        Some("jpg") | Some("jpeg") => Some("image/jpeg"),
        Some("webp") => Some("image/webp"),
        _ => None,
    }
}
