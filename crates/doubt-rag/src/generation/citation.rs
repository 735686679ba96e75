//! Citations built from retrieved chunks

use crate::retrieval::ScoredChunk;
use crate::types::Citation;

/// Default snippet length in chars
pub const SNIPPET_LEN: usize = 240;

/// One citation per retrieved chunk, in retrieval order
pub fn citations_from(results: &[ScoredChunk], snippet_len: usize) -> Vec<Citation> {
    results
        .iter()
        .map(|r| Citation {
            chunk_id: r.chunk.id,
            document_id: r.chunk.document_id,
            filename: r.chunk.source.clone(),
            chunk_index: r.chunk.index,
            similarity: r.similarity,
            snippet: truncate_snippet(r.chunk.content.trim(), snippet_len),
        })
        .collect()
}

/// Truncate snippet to at most `max_chars` chars, preferring a word boundary
pub fn truncate_snippet(snippet: &str, max_chars: usize) -> String {
    let end = match snippet.char_indices().nth(max_chars) {
        Some((byte, _)) => byte,
        None => return snippet.to_string(),
    };

    // Try to end at a word boundary
    if let Some(pos) = snippet[..end].rfind(char::is_whitespace) {
        if pos > 0 {
            return format!("{}...", snippet[..pos].trim_end());
        }
    }

    format!("{}...", &snippet[..end])
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::TextChunk;
    use uuid::Uuid;

    #[test]
    fn test_truncate_snippet() {
        let snippet = "This is a very long snippet that needs to be truncated.";
        let truncated = truncate_snippet(snippet, 20);

        assert_eq!(truncated, "This is a very long...");
    }

    #[test]
    fn test_short_snippet_unchanged() {
        assert_eq!(truncate_snippet("short", 20), "short");
    }

    #[test]
    fn test_truncate_multibyte() {
        assert_eq!(truncate_snippet("αβγδεζ", 3), "αβγ...");
    }

    #[test]
    fn test_citations_follow_retrieval_order() {
        let doc = Uuid::new_v4();
        let results: Vec<ScoredChunk> = [(2, 0.9), (0, 0.4)]
            .iter()
            .map(|&(index, similarity)| ScoredChunk {
                chunk: TextChunk {
                    id: Uuid::new_v4(),
                    document_id: doc,
                    source: "notes.md".to_string(),
                    index,
                    char_offset: 0,
                    char_len: 5,
                    content: " text ".to_string(),
                },
                similarity,
            })
            .collect();

        let citations = citations_from(&results, SNIPPET_LEN);
        assert_eq!(citations.len(), 2);
        assert_eq!(citations[0].chunk_index, 2);
        assert_eq!(citations[0].snippet, "text");
        assert_eq!(citations[1].similarity, 0.4);
    }
}
