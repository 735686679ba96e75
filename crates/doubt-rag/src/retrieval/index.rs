//! In-memory vector index
//!
//! Exhaustive cosine-similarity search over every stored vector. The index
//! never changes after it is built; adding documents produces a new index.

use std::collections::HashSet;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::{Error, Result};
use crate::types::TextChunk;

/// A chunk together with its embedding
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IndexEntry {
    pub chunk: TextChunk,
    pub vector: Vec<f32>,
}

/// Search result with chunk and similarity
#[derive(Debug, Clone)]
pub struct ScoredChunk {
    /// The retrieved chunk
    pub chunk: TextChunk,
    /// Cosine similarity in [-1, 1], higher is better
    pub similarity: f32,
}

/// Immutable vector index
#[derive(Debug, Clone, Default)]
pub struct VectorIndex {
    entries: Vec<IndexEntry>,
    norms: Vec<f32>,
    dimensions: usize,
}

impl VectorIndex {
    /// Empty index (dimension 0)
    pub fn empty() -> Self {
        Self::default()
    }

    /// Build from parallel chunk and vector sequences
    pub fn build(chunks: Vec<TextChunk>, vectors: Vec<Vec<f32>>) -> Result<Self> {
        if chunks.len() != vectors.len() {
            return Err(Error::invalid_input(format!(
                "{} chunks but {} vectors",
                chunks.len(),
                vectors.len()
            )));
        }
        Self::from_entries(
            chunks
                .into_iter()
                .zip(vectors)
                .map(|(chunk, vector)| IndexEntry { chunk, vector })
                .collect(),
        )
    }

    /// Build from entries; every vector must have the length of the first
    pub fn from_entries(entries: Vec<IndexEntry>) -> Result<Self> {
        let dimensions = entries.first().map(|e| e.vector.len()).unwrap_or(0);

        for (position, entry) in entries.iter().enumerate() {
            if entry.vector.len() != dimensions {
                return Err(Error::DimensionMismatch {
                    expected: dimensions,
                    actual: entry.vector.len(),
                    position,
                });
            }
        }

        let norms = entries.iter().map(|e| norm(&e.vector)).collect();
        Ok(Self {
            entries,
            norms,
            dimensions,
        })
    }

    /// New index holding this index's entries followed by `additional`
    pub fn rebuild_with(&self, additional: Vec<IndexEntry>) -> Result<Self> {
        let mut entries = self.entries.clone();
        entries.extend(additional);
        Self::from_entries(entries)
    }

    /// Top `k` chunks by cosine similarity to `vector`
    ///
    /// Results are ordered by non-increasing similarity; ties keep insertion
    /// order.
    pub fn query(&self, vector: &[f32], k: usize) -> Result<Vec<ScoredChunk>> {
        self.query_filtered(vector, k, |_| true)
    }

    /// Like [`query`](Self::query), restricted to chunks accepted by `filter`
    pub fn query_filtered<F>(&self, vector: &[f32], k: usize, filter: F) -> Result<Vec<ScoredChunk>>
    where
        F: Fn(&TextChunk) -> bool,
    {
        if self.entries.is_empty() || k == 0 {
            return Ok(Vec::new());
        }
        if vector.len() != self.dimensions {
            return Err(Error::DimensionMismatch {
                expected: self.dimensions,
                actual: vector.len(),
                position: 0,
            });
        }

        let query_norm = norm(vector);
        let mut scored: Vec<(usize, f32)> = self
            .entries
            .iter()
            .zip(&self.norms)
            .enumerate()
            .filter(|(_, (entry, _))| filter(&entry.chunk))
            .map(|(i, (entry, entry_norm))| (i, cosine(vector, query_norm, &entry.vector, *entry_norm)))
            .collect();

        // Stable sort keeps insertion order among equal scores
        scored.sort_by(|a, b| b.1.total_cmp(&a.1));
        scored.truncate(k);

        Ok(scored
            .into_iter()
            .map(|(i, similarity)| ScoredChunk {
                chunk: self.entries[i].chunk.clone(),
                similarity,
            })
            .collect())
    }

    /// Number of indexed chunks
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Vector dimensionality (0 when empty)
    pub fn dimensions(&self) -> usize {
        self.dimensions
    }

    /// Distinct document IDs in insertion order
    pub fn document_ids(&self) -> Vec<Uuid> {
        let mut seen = HashSet::new();
        self.entries
            .iter()
            .map(|e| e.chunk.document_id)
            .filter(|id| seen.insert(*id))
            .collect()
    }

    /// All entries in insertion order
    pub fn entries(&self) -> &[IndexEntry] {
        &self.entries
    }
}

fn norm(v: &[f32]) -> f32 {
    v.iter().map(|x| x * x).sum::<f32>().sqrt()
}

/// Cosine similarity; zero vectors score 0 and undefined scores rank last
fn cosine(a: &[f32], a_norm: f32, b: &[f32], b_norm: f32) -> f32 {
    if a_norm == 0.0 || b_norm == 0.0 {
        return 0.0;
    }
    let dot: f32 = a.iter().zip(b).map(|(x, y)| x * y).sum();
    let similarity = dot / (a_norm * b_norm);
    if similarity.is_nan() {
        f32::NEG_INFINITY
    } else {
        similarity
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn chunk(doc: Uuid, index: usize, content: &str) -> TextChunk {
        TextChunk {
            id: Uuid::new_v4(),
            document_id: doc,
            source: "test.txt".to_string(),
            index,
            char_offset: 0,
            char_len: content.chars().count(),
            content: content.to_string(),
        }
    }

    fn index_of(vectors: Vec<Vec<f32>>) -> VectorIndex {
        let doc = Uuid::new_v4();
        let chunks = (0..vectors.len()).map(|i| chunk(doc, i, &format!("c{}", i))).collect();
        VectorIndex::build(chunks, vectors).unwrap()
    }

    #[test]
    fn test_empty_index() {
        let index = VectorIndex::build(Vec::new(), Vec::new()).unwrap();
        assert!(index.is_empty());
        assert_eq!(index.dimensions(), 0);
        assert!(index.query(&[1.0, 0.0], 3).unwrap().is_empty());
    }

    #[test]
    fn test_dimension_mismatch_on_build() {
        let doc = Uuid::new_v4();
        let result = VectorIndex::build(
            vec![chunk(doc, 0, "a"), chunk(doc, 1, "b"), chunk(doc, 2, "c")],
            vec![vec![1.0, 0.0, 0.0], vec![0.0, 1.0, 0.0], vec![1.0, 1.0]],
        );
        match result {
            Err(Error::DimensionMismatch {
                expected,
                actual,
                position,
            }) => {
                assert_eq!((expected, actual, position), (3, 2, 2));
            }
            other => panic!("expected DimensionMismatch, got {:?}", other.map(|i| i.len())),
        }
    }

    #[test]
    fn test_length_mismatch_is_invalid_input() {
        let doc = Uuid::new_v4();
        let result = VectorIndex::build(vec![chunk(doc, 0, "a")], Vec::new());
        assert!(matches!(result, Err(Error::InvalidInput(_))));
    }

    #[test]
    fn test_query_orders_by_similarity() {
        let index = index_of(vec![
            vec![0.0, 1.0],
            vec![1.0, 0.0],
            vec![0.7, 0.7],
        ]);
        let results = index.query(&[1.0, 0.1], 3).unwrap();
        let order: Vec<&str> = results.iter().map(|r| r.chunk.content.as_str()).collect();
        assert_eq!(order, vec!["c1", "c2", "c0"]);
        assert!(results.windows(2).all(|w| w[0].similarity >= w[1].similarity));
    }

    #[test]
    fn test_ties_keep_insertion_order() {
        let index = index_of(vec![vec![1.0, 0.0], vec![2.0, 0.0], vec![0.5, 0.0]]);
        let results = index.query(&[1.0, 0.0], 3).unwrap();
        let order: Vec<usize> = results.iter().map(|r| r.chunk.index).collect();
        assert_eq!(order, vec![0, 1, 2]);
    }

    #[test]
    fn test_result_count_bounded() {
        let index = index_of(vec![vec![1.0, 0.0], vec![0.0, 1.0]]);
        assert_eq!(index.query(&[1.0, 1.0], 10).unwrap().len(), 2);
        assert_eq!(index.query(&[1.0, 1.0], 1).unwrap().len(), 1);
        assert!(index.query(&[1.0, 1.0], 0).unwrap().is_empty());
    }

    #[test]
    fn test_query_dimension_mismatch() {
        let index = index_of(vec![vec![1.0, 0.0]]);
        assert!(matches!(
            index.query(&[1.0, 0.0, 0.0], 1),
            Err(Error::DimensionMismatch { expected: 2, actual: 3, .. })
        ));
    }

    #[test]
    fn test_zero_vector_scores_zero() {
        let index = index_of(vec![vec![0.0, 0.0], vec![1.0, 0.0]]);
        let results = index.query(&[1.0, 0.0], 2).unwrap();
        assert_eq!(results[0].chunk.index, 1);
        assert_eq!(results[1].similarity, 0.0);
    }

    #[test]
    fn test_rebuild_keeps_old_snapshot() {
        let old = index_of(vec![vec![1.0, 0.0]]);
        let doc = Uuid::new_v4();
        let new = old
            .rebuild_with(vec![IndexEntry {
                chunk: chunk(doc, 0, "new"),
                vector: vec![0.0, 1.0],
            }])
            .unwrap();

        assert_eq!(old.len(), 1);
        assert_eq!(new.len(), 2);
        assert_eq!(new.document_ids().len(), 2);
        assert_eq!(new.document_ids()[1], doc);

        let bad = old.rebuild_with(vec![IndexEntry {
            chunk: chunk(doc, 1, "bad"),
            vector: vec![1.0],
        }]);
        assert!(matches!(bad, Err(Error::DimensionMismatch { position: 1, .. })));
    }

    #[test]
    fn test_filtered_query() {
        let a = Uuid::new_v4();
        let b = Uuid::new_v4();
        let index = VectorIndex::build(
            vec![chunk(a, 0, "a0"), chunk(b, 0, "b0"), chunk(a, 1, "a1")],
            vec![vec![1.0, 0.0], vec![1.0, 0.0], vec![0.0, 1.0]],
        )
        .unwrap();

        let results = index
            .query_filtered(&[1.0, 0.0], 5, |c| c.document_id == a)
            .unwrap();
        let contents: Vec<&str> = results.iter().map(|r| r.chunk.content.as_str()).collect();
        assert_eq!(contents, vec!["a0", "a1"]);
    }
}
