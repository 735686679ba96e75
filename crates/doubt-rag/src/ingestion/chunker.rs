//! Overlapping text chunker
//!
//! Sizes are counted in chars. Consecutive chunks share exactly `overlap`
//! chars, so dropping the first `overlap` chars of every chunk after the
//! first and concatenating gives back the original text.

use uuid::Uuid;

use crate::config::ChunkingConfig;
use crate::error::{Error, Result};
use crate::types::{ExtractedText, TextChunk};

/// Preferred cut points, strongest first
const SEPARATORS: &[&[char]] = &[&['\n', '\n'], &['\n'], &[' ']];

/// Half-open char range `[start, end)` of one chunk
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Span {
    pub start: usize,
    pub end: usize,
}

impl Span {
    pub fn len(&self) -> usize {
        self.end - self.start
    }

    pub fn is_empty(&self) -> bool {
        self.start == self.end
    }
}

/// Text chunker with configurable size and overlap
#[derive(Debug, Clone, Copy)]
pub struct TextChunker {
    /// Maximum chunk size in chars
    chunk_size: usize,
    /// Chars shared by consecutive chunks
    overlap: usize,
}

impl TextChunker {
    /// Create a new chunker; `overlap` must be smaller than `chunk_size`
    pub fn new(chunk_size: usize, overlap: usize) -> Result<Self> {
        if chunk_size == 0 {
            return Err(Error::Config("chunk_size must be greater than zero".to_string()));
        }
        if overlap >= chunk_size {
            return Err(Error::Config(format!(
                "chunk_overlap ({}) must be smaller than chunk_size ({})",
                overlap, chunk_size
            )));
        }
        Ok(Self {
            chunk_size,
            overlap,
        })
    }

    /// Create a chunker from configuration
    pub fn from_config(config: &ChunkingConfig) -> Result<Self> {
        Self::new(config.chunk_size, config.chunk_overlap)
    }

    pub fn chunk_size(&self) -> usize {
        self.chunk_size
    }

    pub fn overlap(&self) -> usize {
        self.overlap
    }

    /// Compute chunk spans over `text`
    pub fn split(&self, text: &str) -> Vec<Span> {
        let chars: Vec<char> = text.chars().collect();
        self.split_chars(&chars)
    }

    fn split_chars(&self, chars: &[char]) -> Vec<Span> {
        let len = chars.len();
        let mut spans = Vec::new();
        if len == 0 {
            return spans;
        }

        let mut start = 0;
        loop {
            let limit = start + self.chunk_size;
            if limit >= len {
                spans.push(Span { start, end: len });
                break;
            }

            let end = self.find_cut(chars, start, limit);
            spans.push(Span { start, end });
            start = end - self.overlap;
        }
        spans
    }

    /// Last separator cut in `(start + overlap, limit]`, else a hard cut at `limit`
    fn find_cut(&self, chars: &[char], start: usize, limit: usize) -> usize {
        let min_cut = start + self.overlap;
        for sep in SEPARATORS {
            let found = (min_cut + 1..=limit)
                .rev()
                .find(|&cut| cut >= sep.len() && chars[cut - sep.len()..cut] == **sep);
            if let Some(cut) = found {
                return cut;
            }
        }
        limit
    }

    /// Split extracted text into chunks
    pub fn chunk(&self, text: &ExtractedText) -> Vec<TextChunk> {
        let chars: Vec<char> = text.text.chars().collect();
        self.split_chars(&chars)
            .into_iter()
            .enumerate()
            .map(|(index, span)| TextChunk {
                id: Uuid::new_v4(),
                document_id: text.document_id,
                source: text.filename.clone(),
                index,
                char_offset: span.start,
                char_len: span.len(),
                content: chars[span.start..span.end].iter().collect(),
            })
            .collect()
    }
}

impl Default for TextChunker {
    fn default() -> Self {
        let config = ChunkingConfig::default();
        Self {
            chunk_size: config.chunk_size,
            overlap: config.chunk_overlap,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{DetectionMethod, DocumentFormat};

    fn extracted(text: &str) -> ExtractedText {
        ExtractedText {
            document_id: Uuid::new_v4(),
            filename: "notes.txt".to_string(),
            format: DocumentFormat::Text,
            mime: "text/plain".to_string(),
            detection: DetectionMethod::Extension,
            text: text.to_string(),
        }
    }

    fn texts(chunker: &TextChunker, text: &str) -> Vec<String> {
        chunker
            .chunk(&extracted(text))
            .into_iter()
            .map(|c| c.content)
            .collect()
    }

    #[test]
    fn test_rejects_bad_overlap() {
        assert!(matches!(TextChunker::new(100, 100), Err(Error::Config(_))));
        assert!(matches!(TextChunker::new(0, 0), Err(Error::Config(_))));
        assert!(TextChunker::new(100, 99).is_ok());
    }

    #[test]
    fn test_empty_text() {
        let chunker = TextChunker::default();
        assert!(chunker.split("").is_empty());
        assert!(chunker.chunk(&extracted("")).is_empty());
    }

    #[test]
    fn test_short_text_is_single_chunk() {
        let chunker = TextChunker::new(50, 10).unwrap();
        assert_eq!(texts(&chunker, "Short note."), vec!["Short note."]);
    }

    #[test]
    fn test_prefers_paragraph_then_word_breaks() {
        let chunker = TextChunker::new(20, 5).unwrap();
        let chunks = texts(&chunker, "aaaa bbbb\n\ncccc dddd eeee ffff");
        assert_eq!(
            chunks,
            vec!["aaaa bbbb\n\n", "bbb\n\ncccc dddd eeee ", "eeee ffff"]
        );
    }

    #[test]
    fn test_hard_cut_without_separators() {
        let chunker = TextChunker::new(4, 1).unwrap();
        let spans = chunker.split("abcdefghij");
        assert_eq!(
            spans,
            vec![
                Span { start: 0, end: 4 },
                Span { start: 3, end: 7 },
                Span { start: 6, end: 10 },
            ]
        );
    }

    #[test]
    fn test_overlap_and_reconstruction() {
        let chunker = TextChunker::new(40, 8).unwrap();
        let text = "The mitochondria is the powerhouse of the cell.\n\n\
                    Ribosomes build proteins from amino acids.\n\
                    The nucleus stores genetic material in chromosomes.";
        let chunks = chunker.chunk(&extracted(text));
        assert!(chunks.len() > 2);

        let mut rebuilt = chunks[0].content.clone();
        for pair in chunks.windows(2) {
            let prev: Vec<char> = pair[0].content.chars().collect();
            let next: Vec<char> = pair[1].content.chars().collect();
            assert_eq!(prev[prev.len() - 8..], next[..8]);
            assert_eq!(pair[1].char_offset, pair[0].char_offset + pair[0].char_len - 8);
            rebuilt.extend(&next[8..]);
        }
        assert_eq!(rebuilt, text);
        assert!(chunks.iter().all(|c| c.char_len <= 40));
    }

    #[test]
    fn test_counts_chars_not_bytes() {
        let chunker = TextChunker::new(3, 1).unwrap();
        let chunks = texts(&chunker, "αβγδε");
        assert_eq!(chunks, vec!["αβγ", "γδε"]);
    }

    #[test]
    fn test_chunk_metadata() {
        let chunker = TextChunker::new(10, 2).unwrap();
        let text = extracted("one two three four five");
        let chunks = chunker.chunk(&text);
        for (i, chunk) in chunks.iter().enumerate() {
            assert_eq!(chunk.index, i);
            assert_eq!(chunk.document_id, text.document_id);
            assert_eq!(chunk.source, "notes.txt");
            assert_eq!(chunk.char_len, chunk.content.chars().count());
        }
    }
}
