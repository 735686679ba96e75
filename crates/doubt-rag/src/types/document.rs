//! Document, extracted text and chunk types

use bytes::Bytes;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use uuid::Uuid;

/// Supported document formats
///
/// Closed set: every variant is handled by exactly one reader.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum DocumentFormat {
    /// PDF document
    Pdf,
    /// Microsoft Word document (.docx)
    Docx,
    /// Plain text file
    Text,
    /// CSV file
    Csv,
    /// JSON document
    Json,
    /// XML document
    Xml,
    /// YAML document
    Yaml,
    /// Legacy Excel spreadsheet (.xls)
    Xls,
    /// Excel spreadsheet (.xlsx)
    Xlsx,
    /// PowerPoint presentation (.pptx)
    Pptx,
    /// HTML document
    Html,
    /// Nothing matched; read as UTF-8 if possible
    Unknown,
}

impl DocumentFormat {
    /// Detect format from a file extension
    pub fn from_extension(ext: &str) -> Self {
        match ext.to_lowercase().as_str() {
            "pdf" => Self::Pdf,
            "docx" => Self::Docx,
            "txt" | "text" | "md" | "markdown" | "log" => Self::Text,
            "csv" => Self::Csv,
            "json" => Self::Json,
            "xml" => Self::Xml,
            "yaml" | "yml" => Self::Yaml,
            "xls" => Self::Xls,
            "xlsx" => Self::Xlsx,
            "pptx" => Self::Pptx,
            "html" | "htm" => Self::Html,
            _ => Self::Unknown,
        }
    }

    /// Detect format from a MIME type (parameters such as `; charset=` ignored)
    pub fn from_mime(mime: &str) -> Self {
        let essence = mime.split(';').next().unwrap_or_default().trim().to_lowercase();
        match essence.as_str() {
            "application/pdf" => Self::Pdf,
            "application/vnd.openxmlformats-officedocument.wordprocessingml.document" => {
                Self::Docx
            }
            "text/plain" | "text/markdown" => Self::Text,
            "text/csv" => Self::Csv,
            "application/json" => Self::Json,
            "application/xml" | "text/xml" => Self::Xml,
            "application/x-yaml" | "application/yaml" | "text/yaml" | "text/x-yaml" => Self::Yaml,
            "application/vnd.ms-excel" => Self::Xls,
            "application/vnd.openxmlformats-officedocument.spreadsheetml.sheet" => Self::Xlsx,
            "application/vnd.openxmlformats-officedocument.presentationml.presentation" => {
                Self::Pptx
            }
            "text/html" => Self::Html,
            _ => Self::Unknown,
        }
    }

    /// Canonical MIME type
    pub fn mime_type(&self) -> &'static str {
        match self {
            Self::Pdf => "application/pdf",
            Self::Docx => "application/vnd.openxmlformats-officedocument.wordprocessingml.document",
            Self::Text => "text/plain",
            Self::Csv => "text/csv",
            Self::Json => "application/json",
            Self::Xml => "application/xml",
            Self::Yaml => "application/x-yaml",
            Self::Xls => "application/vnd.ms-excel",
            Self::Xlsx => "application/vnd.openxmlformats-officedocument.spreadsheetml.sheet",
            Self::Pptx => "application/vnd.openxmlformats-officedocument.presentationml.presentation",
            Self::Html => "text/html",
            Self::Unknown => "application/octet-stream",
        }
    }

    /// Get display name
    pub fn display_name(&self) -> &'static str {
        match self {
            Self::Pdf => "PDF",
            Self::Docx => "Word Document (.docx)",
            Self::Text => "Text File",
            Self::Csv => "CSV",
            Self::Json => "JSON",
            Self::Xml => "XML",
            Self::Yaml => "YAML",
            Self::Xls => "Excel Spreadsheet (.xls)",
            Self::Xlsx => "Excel Spreadsheet (.xlsx)",
            Self::Pptx => "PowerPoint (.pptx)",
            Self::Html => "HTML",
            Self::Unknown => "Unknown",
        }
    }
}

impl std::fmt::Display for DocumentFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.display_name())
    }
}

/// How a document's format was decided
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum DetectionMethod {
    /// Magic bytes or container layout
    Sniffed,
    /// MIME type supplied with the upload
    Declared,
    /// Filename extension
    Extension,
    /// Nothing matched
    Fallback,
}

/// An uploaded or loaded document, consumed once by the reader
#[derive(Debug, Clone)]
pub struct Document {
    /// Unique document ID
    pub id: Uuid,
    /// Original filename
    pub filename: String,
    /// MIME type declared by the uploader, if any
    pub declared_mime: Option<String>,
    /// Raw content
    pub data: Bytes,
    /// Time the document was received
    pub received_at: chrono::DateTime<chrono::Utc>,
}

impl Document {
    /// Create a document from a filename and raw bytes
    pub fn new(filename: impl Into<String>, data: impl Into<Bytes>) -> Self {
        Self {
            id: Uuid::new_v4(),
            filename: filename.into(),
            declared_mime: None,
            data: data.into(),
            received_at: chrono::Utc::now(),
        }
    }

    /// Attach the uploader's declared MIME type
    pub fn with_mime(mut self, mime: impl Into<String>) -> Self {
        let mime = mime.into();
        self.declared_mime = (!mime.trim().is_empty()).then_some(mime);
        self
    }

    /// Lowercase filename extension, if any
    pub fn extension(&self) -> Option<String> {
        std::path::Path::new(&self.filename)
            .extension()
            .and_then(|e| e.to_str())
            .map(|e| e.to_lowercase())
    }

    /// SHA-256 of the raw content, hex encoded
    pub fn content_hash(&self) -> String {
        hex::encode(Sha256::digest(&self.data))
    }

    /// Size in bytes
    pub fn size(&self) -> usize {
        self.data.len()
    }
}

/// Plain text recovered from a document
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExtractedText {
    /// Source document ID
    pub document_id: Uuid,
    /// Source filename
    pub filename: String,
    /// Detected format
    pub format: DocumentFormat,
    /// MIME type the format was detected as
    pub mime: String,
    /// How the format was detected
    pub detection: DetectionMethod,
    /// Reconstructed text
    pub text: String,
}

impl ExtractedText {
    /// Number of characters in the text
    pub fn char_len(&self) -> usize {
        self.text.chars().count()
    }
}

/// A contiguous span of a document's text
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct TextChunk {
    /// Unique chunk ID
    pub id: Uuid,
    /// Parent document ID
    pub document_id: Uuid,
    /// Source filename (used in citations)
    pub source: String,
    /// Position of the chunk within its document
    pub index: usize,
    /// Offset of the first character in the extracted text
    pub char_offset: usize,
    /// Length in characters
    pub char_len: usize,
    /// Text content
    pub content: String,
}

impl TextChunk {
    /// Short label for prompts and logs
    pub fn label(&self) -> String {
        format!("{} (chunk {})", self.source, self.index + 1)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_from_extension() {
        assert_eq!(DocumentFormat::from_extension("PDF"), DocumentFormat::Pdf);
        assert_eq!(DocumentFormat::from_extension("yml"), DocumentFormat::Yaml);
        assert_eq!(DocumentFormat::from_extension("htm"), DocumentFormat::Html);
        assert_eq!(DocumentFormat::from_extension("xyz"), DocumentFormat::Unknown);
    }

    #[test]
    fn test_format_from_mime_ignores_parameters() {
        assert_eq!(
            DocumentFormat::from_mime("text/csv; charset=utf-8"),
            DocumentFormat::Csv
        );
        assert_eq!(
            DocumentFormat::from_mime("application/octet-stream"),
            DocumentFormat::Unknown
        );
    }

    #[test]
    fn test_mime_round_trip_for_known_formats() {
        for format in [
            DocumentFormat::Pdf,
            DocumentFormat::Docx,
            DocumentFormat::Csv,
            DocumentFormat::Json,
            DocumentFormat::Xlsx,
            DocumentFormat::Pptx,
            DocumentFormat::Html,
        ] {
            assert_eq!(DocumentFormat::from_mime(format.mime_type()), format);
        }
    }

    #[test]
    fn test_content_hash_is_stable() {
        let a = Document::new("a.txt", "hello");
        let b = Document::new("b.txt", "hello");
        assert_eq!(a.content_hash(), b.content_hash());
        assert_eq!(a.content_hash().len(), 64);
        assert_ne!(a.id, b.id);
    }

    #[test]
    fn test_blank_mime_is_ignored() {
        let doc = Document::new("notes.txt", "x").with_mime("  ");
        assert!(doc.declared_mime.is_none());
        assert_eq!(doc.extension().as_deref(), Some("txt"));
    }
}
