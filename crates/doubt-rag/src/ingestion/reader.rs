//! Multi-format file reader
//!
//! Turns a [`Document`] into plain text. The detected format selects exactly
//! one reader; anything unrecognised is accepted only if it is valid UTF-8.

use calamine::Reader as _;
use serde::Deserialize;
use std::io::{Cursor, Read};
use std::path::Path;

use super::detect::{detect_document, Detection};
use crate::error::{Error, Result};
use crate::types::{Document, DocumentFormat, ExtractedText, IngestFailure};

/// Typographic glyphs that PDF fonts commonly emit, mapped to plain text
const PDF_GLYPHS: &[(char, &str)] = &[
    ('\u{2010}', "-"),
    ('\u{2011}', "-"),
    ('\u{2013}', "-"),
    ('\u{2014}', "--"),
    ('\u{2018}', "'"),
    ('\u{2019}', "'"),
    ('\u{201C}', "\""),
    ('\u{201D}', "\""),
    ('\u{2022}', "* "),
    ('\u{2026}', "..."),
    ('\u{00A0}', " "),
    ('\u{FB00}', "ff"),
    ('\u{FB01}', "fi"),
    ('\u{FB02}', "fl"),
    ('\u{FB03}', "ffi"),
    ('\u{FB04}', "ffl"),
    ('\0', ""),
];

/// Maximum element nesting accepted when re-serializing XML
const MAX_XML_DEPTH: usize = 256;

/// Outcome of reading a batch of documents
#[derive(Debug, Default)]
pub struct BatchRead {
    /// Documents that produced text
    pub texts: Vec<ExtractedText>,
    /// Documents that were skipped
    pub failures: Vec<IngestFailure>,
}

/// Multi-format file reader
#[derive(Debug, Clone, Copy, Default)]
pub struct FileReader;

impl FileReader {
    pub fn new() -> Self {
        Self
    }

    /// Read one document into plain text
    pub fn read(&self, doc: &Document) -> Result<ExtractedText> {
        let detection = detect_document(doc);
        let text = Self::read_as(&detection, &doc.filename, &doc.data)?;

        tracing::debug!(
            "Read {} as {} ({:?}): {} chars",
            doc.filename,
            detection.format,
            detection.method,
            text.chars().count()
        );

        Ok(ExtractedText {
            document_id: doc.id,
            filename: doc.filename.clone(),
            format: detection.format,
            mime: detection.mime,
            detection: detection.method,
            text,
        })
    }

    /// Read a file from disk
    pub fn read_path(&self, path: &Path) -> Result<ExtractedText> {
        let data = std::fs::read(path)?;
        let filename = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| path.display().to_string());
        self.read(&Document::new(filename, data))
    }

    /// Read several documents; failures are logged and collected, never fatal
    pub fn read_batch(&self, docs: &[Document]) -> BatchRead {
        let mut batch = BatchRead::default();
        for doc in docs {
            match self.read(doc) {
                Ok(text) => batch.texts.push(text),
                Err(e) => {
                    tracing::warn!("Skipping {}: {}", doc.filename, e);
                    batch.failures.push(IngestFailure {
                        filename: doc.filename.clone(),
                        error: e.to_string(),
                    });
                }
            }
        }
        batch
    }

    fn read_as(detection: &Detection, filename: &str, data: &[u8]) -> Result<String> {
        match detection.format {
            DocumentFormat::Pdf => Self::read_pdf(filename, data),
            DocumentFormat::Docx => Self::read_docx(filename, data),
            DocumentFormat::Text => Self::read_text(filename, data),
            DocumentFormat::Csv => Self::read_csv(filename, data),
            DocumentFormat::Json => Self::read_json(filename, data),
            DocumentFormat::Xml => Self::read_xml(filename, data),
            DocumentFormat::Yaml => Self::read_yaml(filename, data),
            DocumentFormat::Xls | DocumentFormat::Xlsx => Self::read_spreadsheet(filename, data),
            DocumentFormat::Pptx => Self::read_pptx(filename, data),
            DocumentFormat::Html => Self::read_html(filename, data),
            DocumentFormat::Unknown => std::str::from_utf8(strip_bom(data))
                .map(str::to_string)
                .map_err(|_| Error::UnsupportedFormat(detection.mime.clone())),
        }
    }

    /// Parse PDF document page by page
    fn read_pdf(filename: &str, data: &[u8]) -> Result<String> {
        // pdf-extract panics on some malformed font tables
        let pages = match std::panic::catch_unwind(|| {
            pdf_extract::extract_text_from_mem_by_pages(data)
        }) {
            Ok(Ok(pages)) => pages,
            Ok(Err(e)) => {
                tracing::warn!("pdf-extract failed for {}: {}, trying lopdf", filename, e);
                Self::read_pdf_fallback(filename, data)?
            }
            Err(_) => {
                tracing::warn!("pdf-extract panicked for {}, trying lopdf", filename);
                Self::read_pdf_fallback(filename, data)?
            }
        };

        let content = pages
            .iter()
            .map(|page| cleanup_pdf_text(page))
            .filter(|page| !page.is_empty())
            .collect::<Vec<_>>()
            .join("\n");

        if content.trim().is_empty() {
            return Err(Error::read_failure(
                filename,
                "No text content could be extracted from PDF",
            ));
        }
        Ok(content)
    }

    /// Fallback PDF text extraction using lopdf directly
    fn read_pdf_fallback(filename: &str, data: &[u8]) -> Result<Vec<String>> {
        let doc = lopdf::Document::load_mem(data)
            .map_err(|e| Error::read_failure(filename, format!("Failed to load PDF: {}", e)))?;

        let mut pages = Vec::new();
        for page_number in doc.get_pages().keys() {
            match doc.extract_text(&[*page_number]) {
                Ok(text) => pages.push(text),
                Err(e) => tracing::debug!("No text on page {} of {}: {}", page_number, filename, e),
            }
        }
        Ok(pages)
    }

    /// Parse DOCX paragraphs
    fn read_docx(filename: &str, data: &[u8]) -> Result<String> {
        let doc = docx_rs::read_docx(data).map_err(|e| Error::read_failure(filename, e.to_string()))?;

        let mut paragraphs = Vec::new();
        for child in doc.document.children {
            if let docx_rs::DocumentChild::Paragraph(p) = child {
                let mut text = String::new();
                for child in p.children {
                    if let docx_rs::ParagraphChild::Run(run) = child {
                        for child in run.children {
                            if let docx_rs::RunChild::Text(t) = child {
                                text.push_str(&t.text);
                            }
                        }
                    }
                }
                paragraphs.push(text);
            }
        }
        Ok(paragraphs.join("\n"))
    }

    fn read_text(filename: &str, data: &[u8]) -> Result<String> {
        std::str::from_utf8(strip_bom(data))
            .map(str::to_string)
            .map_err(|e| Error::read_failure(filename, format!("Invalid UTF-8: {}", e)))
    }

    /// Render CSV as an aligned table with a row-index column
    fn read_csv(filename: &str, data: &[u8]) -> Result<String> {
        let fail = |e: csv::Error| Error::read_failure(filename, e.to_string());
        let mut reader = csv::ReaderBuilder::new()
            .flexible(true)
            .from_reader(strip_bom(data));

        let headers: Vec<String> = reader.headers().map_err(fail)?.iter().map(str::to_string).collect();
        let mut rows = Vec::new();
        for record in reader.records() {
            rows.push(record.map_err(fail)?.iter().map(str::to_string).collect::<Vec<_>>());
        }

        let columns = rows.iter().map(Vec::len).chain([headers.len()]).max().unwrap_or(0);
        if columns == 0 {
            return Ok(String::new());
        }

        let mut widths = vec![0usize; columns];
        for row in rows.iter().chain([&headers]) {
            for (i, cell) in row.iter().enumerate() {
                widths[i] = widths[i].max(cell.chars().count());
            }
        }
        let index_width = rows.len().saturating_sub(1).to_string().len();

        let render = |label: &str, cells: &[String]| {
            let mut line = format!("{:<width$}", label, width = index_width);
            for (i, width) in widths.iter().enumerate() {
                let cell = cells.get(i).map(String::as_str).unwrap_or("");
                line.push_str(&format!("  {:>width$}", cell, width = *width));
            }
            line
        };

        let mut lines = Vec::with_capacity(rows.len() + 1);
        lines.push(render("", &headers));
        for (i, row) in rows.iter().enumerate() {
            lines.push(render(&i.to_string(), row));
        }
        Ok(lines.join("\n"))
    }

    fn read_json(filename: &str, data: &[u8]) -> Result<String> {
        let value: serde_json::Value = serde_json::from_slice(strip_bom(data))
            .map_err(|e| Error::read_failure(filename, e.to_string()))?;
        serde_json::to_string_pretty(&value).map_err(|e| Error::read_failure(filename, e.to_string()))
    }

    /// Parse XML and write it back without declarations, comments or doctype
    fn read_xml(filename: &str, data: &[u8]) -> Result<String> {
        use quick_xml::events::Event;

        let fail = |msg: String| Error::read_failure(filename, msg);
        let xml = std::str::from_utf8(strip_bom(data)).map_err(|e| fail(e.to_string()))?;

        let mut reader = quick_xml::Reader::from_str(xml);
        reader.config_mut().trim_text(true);
        let mut writer = quick_xml::Writer::new_with_indent(Vec::new(), b' ', 2);
        let mut depth = 0usize;
        let mut saw_root = false;

        loop {
            let event = reader
                .read_event()
                .map_err(|e| fail(format!("Malformed XML at byte {}: {}", reader.buffer_position(), e)))?;
            match event {
                Event::Eof => break,
                Event::Decl(_) | Event::Comment(_) | Event::PI(_) | Event::DocType(_) => continue,
                Event::Start(_) => {
                    depth += 1;
                    saw_root = true;
                    if depth > MAX_XML_DEPTH {
                        return Err(fail(format!("XML nesting deeper than {}", MAX_XML_DEPTH)));
                    }
                }
                Event::End(_) => depth = depth.saturating_sub(1),
                Event::Empty(_) => saw_root = true,
                _ => {}
            }
            writer.write_event(event).map_err(|e| fail(e.to_string()))?;
        }

        if depth != 0 {
            return Err(fail("Unexpected end of XML document".to_string()));
        }
        if !saw_root {
            return Err(fail("XML document has no root element".to_string()));
        }
        String::from_utf8(writer.into_inner()).map_err(|e| fail(e.to_string()))
    }

    /// Parse every YAML document in the stream and write it back
    fn read_yaml(filename: &str, data: &[u8]) -> Result<String> {
        let fail = |e: serde_yaml::Error| Error::read_failure(filename, e.to_string());

        let mut documents = Vec::new();
        for document in serde_yaml::Deserializer::from_slice(strip_bom(data)) {
            let value = serde_yaml::Value::deserialize(document).map_err(fail)?;
            documents.push(serde_yaml::to_string(&value).map_err(fail)?);
        }
        Ok(documents.join("---\n"))
    }

    /// Parse Excel workbook (.xls or .xlsx), one block per sheet
    fn read_spreadsheet(filename: &str, data: &[u8]) -> Result<String> {
        let mut workbook = calamine::open_workbook_auto_from_rs(Cursor::new(data))
            .map_err(|e| Error::read_failure(filename, e.to_string()))?;

        let mut sheets = Vec::new();
        for sheet_name in workbook.sheet_names().to_vec() {
            let range = match workbook.worksheet_range(&sheet_name) {
                Ok(range) => range,
                Err(e) => {
                    tracing::warn!("Skipping sheet '{}' in {}: {}", sheet_name, filename, e);
                    continue;
                }
            };

            let mut sheet = format!("Sheet: {}\n", sheet_name);
            for row in range.rows() {
                let cells: Vec<String> = row
                    .iter()
                    .map(|cell| match cell {
                        calamine::Data::Empty => String::new(),
                        calamine::Data::String(s) => s.clone(),
                        calamine::Data::Float(f) => f.to_string(),
                        calamine::Data::Int(i) => i.to_string(),
                        calamine::Data::Bool(b) => b.to_string(),
                        calamine::Data::DateTime(dt) => dt.to_string(),
                        calamine::Data::DateTimeIso(s) | calamine::Data::DurationIso(s) => s.clone(),
                        _ => String::new(),
                    })
                    .collect();
                sheet.push_str(&cells.join("\t"));
                sheet.push('\n');
            }
            sheets.push(sheet);
        }
        Ok(sheets.join("\n"))
    }

    /// Parse PowerPoint presentation (.pptx): one block per slide
    fn read_pptx(filename: &str, data: &[u8]) -> Result<String> {
        let mut archive = zip::ZipArchive::new(Cursor::new(data))
            .map_err(|e| Error::read_failure(filename, e.to_string()))?;

        let mut slides: Vec<(u32, String)> = archive
            .file_names()
            .filter_map(|name| {
                let number = name
                    .strip_prefix("ppt/slides/slide")?
                    .strip_suffix(".xml")?
                    .parse()
                    .ok()?;
                Some((number, name.to_string()))
            })
            .collect();
        slides.sort_by_key(|(number, _)| *number);

        let mut blocks = Vec::with_capacity(slides.len());
        for (position, (_, name)) in slides.iter().enumerate() {
            let mut xml = String::new();
            archive
                .by_name(name)
                .map_err(|e| Error::read_failure(filename, e.to_string()))?
                .read_to_string(&mut xml)?;

            let shapes = shape_texts(&xml).map_err(|e| Error::read_failure(filename, e))?;
            let mut block = format!("Slide {}", position + 1);
            for shape in shapes {
                block.push('\n');
                block.push_str(&shape);
            }
            blocks.push(block);
        }
        Ok(blocks.join("\n\n"))
    }

    /// Strip tags from HTML, dropping script and style content
    fn read_html(_filename: &str, data: &[u8]) -> Result<String> {
        let html = String::from_utf8_lossy(strip_bom(data));
        let document = scraper::Html::parse_document(&html);

        let mut lines = Vec::new();
        for node in document.root_element().descendants() {
            let Some(text) = node.value().as_text() else {
                continue;
            };
            let hidden = node.ancestors().any(|ancestor| {
                ancestor
                    .value()
                    .as_element()
                    .is_some_and(|el| matches!(el.name(), "script" | "style" | "noscript" | "template"))
            });
            let text = text.split_whitespace().collect::<Vec<_>>().join(" ");
            if !hidden && !text.is_empty() {
                lines.push(text);
            }
        }
        Ok(lines.join("\n"))
    }
}

/// Text of each shape (`sp`) in a slide, paragraphs separated by newlines
fn shape_texts(xml: &str) -> std::result::Result<Vec<String>, String> {
    use quick_xml::events::Event;

    let mut reader = quick_xml::Reader::from_str(xml);
    let mut shapes = Vec::new();
    let mut current: Option<String> = None;
    let mut in_text = false;

    loop {
        match reader.read_event().map_err(|e| e.to_string())? {
            Event::Start(e) => match e.local_name().as_ref() {
                b"sp" => current = Some(String::new()),
                b"t" => in_text = true,
                _ => {}
            },
            Event::Text(e) if in_text => {
                if let Some(shape) = current.as_mut() {
                    shape.push_str(&e.unescape().map_err(|e| e.to_string())?);
                }
            }
            Event::End(e) => match e.local_name().as_ref() {
                b"t" => in_text = false,
                b"p" => {
                    if let Some(shape) = current.as_mut() {
                        shape.push('\n');
                    }
                }
                b"sp" => {
                    if let Some(shape) = current.take() {
                        let text = shape
                            .lines()
                            .map(str::trim)
                            .filter(|l| !l.is_empty())
                            .collect::<Vec<_>>()
                            .join("\n");
                        if !text.is_empty() {
                            shapes.push(text);
                        }
                    }
                }
                _ => {}
            },
            Event::Eof => break,
            _ => {}
        }
    }
    Ok(shapes)
}

/// Replace typographic glyphs, trim lines and drop blank ones
fn cleanup_pdf_text(text: &str) -> String {
    let mut result = text.to_string();
    for (glyph, replacement) in PDF_GLYPHS {
        if result.contains(*glyph) {
            result = result.replace(*glyph, replacement);
        }
    }
    result
        .lines()
        .map(str::trim)
        .filter(|l| !l.is_empty())
        .collect::<Vec<_>>()
        .join("\n")
}

fn strip_bom(data: &[u8]) -> &[u8] {
    data.strip_prefix(b"\xEF\xBB\xBF").unwrap_or(data)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::DetectionMethod;
    use std::io::Write;

    fn read(filename: &str, data: &[u8]) -> Result<ExtractedText> {
        FileReader::new().read(&Document::new(filename, data.to_vec()))
    }

    fn pptx(slides: &[&str]) -> Vec<u8> {
        let mut writer = zip::ZipWriter::new(Cursor::new(Vec::new()));
        writer
            .start_file("ppt/presentation.xml", zip::write::SimpleFileOptions::default())
            .unwrap();
        writer.write_all(b"<p:presentation/>").unwrap();
        // Stored out of order on purpose
        for (i, body) in slides.iter().enumerate().rev() {
            writer
                .start_file(
                    format!("ppt/slides/slide{}.xml", i + 1),
                    zip::write::SimpleFileOptions::default(),
                )
                .unwrap();
            writer.write_all(body.as_bytes()).unwrap();
        }
        writer.finish().unwrap().into_inner()
    }

    fn slide(shapes: &[&[&str]]) -> String {
        let mut xml = String::from(
            r#"<p:sld xmlns:p="urn:p" xmlns:a="urn:a"><p:cSld><p:spTree>"#,
        );
        for paragraphs in shapes {
            xml.push_str("<p:sp><p:txBody>");
            for p in *paragraphs {
                xml.push_str(&format!("<a:p><a:r><a:t>{}</a:t></a:r></a:p>", p));
            }
            xml.push_str("</p:txBody></p:sp>");
        }
        xml.push_str("</p:spTree></p:cSld></p:sld>");
        xml
    }

    #[test]
    fn test_plain_text() {
        let text = read("notes.txt", "Photosynthesis converts light.\n".as_bytes()).unwrap();
        assert_eq!(text.format, DocumentFormat::Text);
        assert_eq!(text.text, "Photosynthesis converts light.\n");
    }

    #[test]
    fn test_invalid_utf8_text_is_read_failure() {
        let err = read("notes.txt", &[0x66, 0xFF, 0x67]).unwrap_err();
        assert!(matches!(err, Error::ReadFailure { .. }));
    }

    #[test]
    fn test_csv_table() {
        let text = read("grades.csv", b"name,score\nAda,90\nBo,7\n").unwrap();
        assert_eq!(
            text.text,
            "   name  score\n0   Ada     90\n1    Bo      7"
        );
    }

    #[test]
    fn test_json_pretty_printed() {
        let text = read("data.json", br#"{"b":1,"a":[true,null]}"#).unwrap();
        assert_eq!(text.detection, DetectionMethod::Sniffed);
        assert_eq!(
            text.text,
            "{\n  \"b\": 1,\n  \"a\": [\n    true,\n    null\n  ]\n}"
        );
    }

    #[test]
    fn test_xml_round_trip_drops_prolog() {
        let xml = br#"<?xml version="1.0"?><!-- note --><root><item id="1">Cell</item><empty/></root>"#;
        let text = read("doc.xml", xml).unwrap();
        assert!(!text.text.contains("<?xml"));
        assert!(!text.text.contains("note"));
        assert!(text.text.contains(r#"<item id="1">Cell</item>"#));
        assert!(text.text.starts_with("<root>"));
    }

    #[test]
    fn test_malformed_xml_is_read_failure() {
        let err = read("doc.xml", b"<?xml version=\"1.0\"?><root><a></b></root>").unwrap_err();
        assert!(matches!(err, Error::ReadFailure { .. }));

        let err = read("doc.xml", b"<?xml version=\"1.0\"?><root><a>").unwrap_err();
        assert!(matches!(err, Error::ReadFailure { .. }));
    }

    #[test]
    fn test_yaml_round_trip() {
        let text = read("conf.yaml", b"name: study\ntags: [math, physics]\n").unwrap();
        assert_eq!(text.format, DocumentFormat::Yaml);
        assert!(text.text.contains("name: study"));
        assert!(text.text.contains("- math"));
    }

    #[test]
    fn test_html_strips_tags_and_scripts() {
        let html = b"<!DOCTYPE html><html><head><style>p{}</style><script>var x=1;</script></head>\
            <body><h1>Cells &amp; Tissues</h1><p>Mitochondria   make ATP.</p></body></html>";
        let text = read("page.html", html).unwrap();
        assert_eq!(text.text, "Cells & Tissues\nMitochondria make ATP.");
    }

    #[test]
    fn test_pptx_slides_in_order() {
        let data = pptx(&[
            &slide(&[&["Cell Biology"], &["Nucleus", "Ribosome"]]),
            &slide(&[&["Summary"]]),
        ]);
        let text = read("lecture.pptx", &data).unwrap();
        assert_eq!(text.format, DocumentFormat::Pptx);
        assert_eq!(
            text.text,
            "Slide 1\nCell Biology\nNucleus\nRibosome\n\nSlide 2\nSummary"
        );
    }

    #[test]
    fn test_docx_paragraphs() {
        use docx_rs::{Docx, Paragraph, Run};

        let mut buf = Cursor::new(Vec::new());
        Docx::new()
            .add_paragraph(Paragraph::new().add_run(Run::new().add_text("Newton laws")))
            .add_paragraph(Paragraph::new().add_run(Run::new().add_text("F = ma")))
            .build()
            .pack(&mut buf)
            .unwrap();

        let text = read("physics.docx", buf.get_ref()).unwrap();
        assert_eq!(text.format, DocumentFormat::Docx);
        assert!(text.text.contains("Newton laws\nF = ma"));
    }

    #[test]
    fn test_unknown_utf8_is_accepted() {
        let text = read("notes.qqq", b"plain words").unwrap();
        assert_eq!(text.format, DocumentFormat::Unknown);
        assert_eq!(text.text, "plain words");
    }

    #[test]
    fn test_unknown_binary_is_unsupported() {
        let doc = Document::new("blob.xyz", vec![0x00, 0xFF, 0xFE, 0x80])
            .with_mime("application/octet-stream");
        match FileReader::new().read(&doc) {
            Err(Error::UnsupportedFormat(mime)) => assert_eq!(mime, "application/octet-stream"),
            other => panic!("expected UnsupportedFormat, got {:?}", other),
        }
    }

    #[test]
    fn test_batch_skips_failures() {
        let docs = vec![
            Document::new("a.txt", "alpha"),
            Document::new("blob.xyz", vec![0xFF, 0xFE]).with_mime("application/octet-stream"),
            Document::new("b.txt", "beta"),
        ];
        let batch = FileReader::new().read_batch(&docs);
        assert_eq!(batch.texts.len(), 2);
        assert_eq!(batch.failures.len(), 1);
        assert_eq!(batch.failures[0].filename, "blob.xyz");
    }

    #[test]
    fn test_pdf_glyph_cleanup() {
        assert_eq!(
            cleanup_pdf_text("  \u{FB01}rst \u{201C}law\u{201D}  \n\n\u{2022}item\0"),
            "first \"law\"\n* item"
        );
    }

    #[test]
    fn test_corrupt_pdf_is_read_failure() {
        let err = read("broken.pdf", b"%PDF-1.4\nthis is not a pdf").unwrap_err();
        assert!(matches!(err, Error::ReadFailure { .. }));
    }
}
