//! Documents and their per-call scores

use serde::{Deserialize, Serialize};

/// A content record participating in retrieval
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Document {
    /// Content ID from the store
    pub id: String,

    /// Text used for lexical scoring (caption or prompt for image content)
    pub text: String,

    /// Embedding vector from the embedding provider
    pub embedding: Vec<f32>,
}

impl Document {
    /// Create a document, or `None` when the embedding is unusable
    ///
    /// Empty embeddings and embeddings with non-finite components are
    /// rejected so they never reach scoring.
    pub fn new(id: impl Into<String>, text: impl Into<String>, embedding: Vec<f32>) -> Option<Self> {
        if !is_usable_embedding(&embedding) {
            return None;
        }

        Some(Self {
            id: id.into(),
            text: text.into(),
            embedding,
        })
    }

    /// Get a short preview of the text (first N characters)
    pub fn preview(&self, max_chars: usize) -> String {
        if self.text.chars().count() <= max_chars {
            self.text.clone()
        } else {
            let truncated: String = self.text.chars().take(max_chars).collect();
            format!("{}...", truncated)
        }
    }
}

pub(crate) fn is_usable_embedding(embedding: &[f32]) -> bool {
    !embedding.is_empty() && embedding.iter().all(|v| v.is_finite())
}

/// A document with the three scores derived during one retrieval call
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScoredDocument {
    #[serde(flatten)]
    pub document: Document,

    /// Lexical relevance (unbounded, >= 0)
    pub bm25_score: f32,

    /// Cosine similarity to the query embedding
    pub semantic_score: f32,

    /// Reciprocal Rank Fusion of the two ranks
    pub hybrid_score: f32,
}

impl ScoredDocument {
    pub fn new(document: Document, bm25_score: f32, semantic_score: f32, hybrid_score: f32) -> Self {
        Self {
            document,
            bm25_score,
            semantic_score,
            hybrid_score,
        }
    }

    pub fn id(&self) -> &str {
        &self.document.id
    }

    pub fn text(&self) -> &str {
        &self.document.text
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rejects_unusable_embeddings() {
        assert!(Document::new("1", "text", vec![]).is_none());
        assert!(Document::new("1", "text", vec![0.1, f32::NAN]).is_none());
        assert!(Document::new("1", "text", vec![0.1, f32::INFINITY]).is_none());
        assert!(Document::new("1", "text", vec![0.0, 0.0]).is_some());
    }

    #[test]
    fn test_preview_respects_char_boundaries() {
        let doc = Document::new("1", "Café crème brûlée", vec![1.0]).unwrap();
        assert_eq!(doc.preview(4), "Café...");
        assert_eq!(doc.preview(100), "Café crème brûlée");
    }
}
